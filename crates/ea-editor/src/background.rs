//! Background image fetching.
//!
//! State machine: `Idle → Fetching → Succeeded | Failed`, re-entering
//! `Fetching` whenever the locator changes. Fetches run on the ambient tokio
//! runtime; their results come back over a channel and are only applied when
//! the owner calls [`BackgroundFetcher::pump`] or awaits
//! [`BackgroundFetcher::next_update`], so state is only ever touched from the
//! owning context. Each fetch is tagged with a generation; results from a
//! superseded locator are dropped.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Decoded image bytes plus natural size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Why a background could not be shown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct FetchFailure {
    pub reason: String,
}

impl FetchFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

pub type FetchFuture = Pin<Box<dyn Future<Output = Result<FetchedImage, FetchFailure>> + Send>>;

/// Platform collaborator that resolves a locator to image data.
pub trait ImageSource: Send + Sync {
    fn fetch(&self, locator: &str) -> FetchFuture;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchState {
    Idle,
    Fetching,
    Succeeded(Arc<FetchedImage>),
    Failed(FetchFailure),
}

struct Completion {
    generation: u64,
    result: Result<FetchedImage, FetchFailure>,
}

pub struct BackgroundFetcher {
    source: Arc<dyn ImageSource>,
    locator: Option<String>,
    state: FetchState,
    generation: u64,
    in_flight: Option<JoinHandle<()>>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl BackgroundFetcher {
    pub fn new(source: Arc<dyn ImageSource>) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            source,
            locator: None,
            state: FetchState::Idle,
            generation: 0,
            in_flight: None,
            completions_tx,
            completions_rx,
        }
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    pub fn locator(&self) -> Option<&str> {
        self.locator.as_deref()
    }

    pub fn image(&self) -> Option<&FetchedImage> {
        match &self.state {
            FetchState::Succeeded(image) => Some(image.as_ref()),
            _ => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.state {
            FetchState::Failed(failure) => Some(&failure.reason),
            _ => None,
        }
    }

    pub fn is_fetching(&self) -> bool {
        matches!(self.state, FetchState::Fetching)
    }

    /// Point at a new locator. `None` cancels everything and goes idle.
    ///
    /// Re-setting the current locator is a no-op while it is fetching or has
    /// succeeded, and a retry after a failure.
    pub fn set_locator(&mut self, locator: Option<String>) {
        let Some(locator) = locator else {
            self.cancel();
            self.locator = None;
            self.state = FetchState::Idle;
            return;
        };

        if self.locator.as_deref() == Some(locator.as_str())
            && matches!(self.state, FetchState::Fetching | FetchState::Succeeded(_))
        {
            return;
        }
        self.locator = Some(locator);
        self.begin_fetch();
    }

    /// Fetch the current locator again. Returns `false` if there is none.
    pub fn retry(&mut self) -> bool {
        if self.locator.is_none() {
            return false;
        }
        self.begin_fetch();
        true
    }

    /// Apply every completion that has already arrived, without waiting.
    /// Returns whether the state changed.
    pub fn pump(&mut self) -> bool {
        let mut changed = false;
        while let Ok(completion) = self.completions_rx.try_recv() {
            changed |= self.complete(completion);
        }
        changed
    }

    /// Wait until the current fetch resolves and apply it.
    ///
    /// Returns `false` immediately when nothing is in flight.
    pub async fn next_update(&mut self) -> bool {
        while self.is_fetching() {
            match self.completions_rx.recv().await {
                Some(completion) => {
                    if self.complete(completion) {
                        return true;
                    }
                }
                None => return false,
            }
        }
        false
    }

    fn begin_fetch(&mut self) {
        self.cancel();
        self.generation += 1;
        self.state = FetchState::Fetching;

        let Some(locator) = self.locator.clone() else {
            return;
        };
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(err) => {
                log::error!("cannot fetch {locator}: {err}");
                self.state = FetchState::Failed(FetchFailure::new("no async runtime available"));
                return;
            }
        };

        log::debug!("fetching background {locator} (generation {})", self.generation);
        let generation = self.generation;
        let fetch = self.source.fetch(&locator);
        let tx = self.completions_tx.clone();
        self.in_flight = Some(runtime.spawn(async move {
            let result = fetch.await;
            // The receiver lives as long as the fetcher; a send error only
            // means the fetcher is gone.
            let _ = tx.send(Completion { generation, result });
        }));
    }

    fn cancel(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
        // Anything still queued belongs to an older generation now.
        self.generation += 1;
    }

    fn complete(&mut self, completion: Completion) -> bool {
        if completion.generation != self.generation {
            log::debug!("discarding stale fetch (generation {})", completion.generation);
            return false;
        }
        self.in_flight = None;
        self.state = match completion.result {
            Ok(image) => {
                log::debug!("background ready: {}x{}", image.width, image.height);
                FetchState::Succeeded(Arc::new(image))
            }
            Err(failure) => {
                log::warn!("background fetch failed: {failure}");
                FetchState::Failed(failure)
            }
        };
        true
    }
}

impl Drop for BackgroundFetcher {
    fn drop(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }
}

impl fmt::Debug for BackgroundFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackgroundFetcher")
            .field("locator", &self.locator)
            .field("state", &self.state)
            .field("generation", &self.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NeverSource;

    impl ImageSource for NeverSource {
        fn fetch(&self, _: &str) -> FetchFuture {
            Box::pin(std::future::pending::<Result<FetchedImage, FetchFailure>>())
        }
    }

    fn image() -> FetchedImage {
        FetchedImage {
            bytes: vec![1, 2, 3],
            width: 4,
            height: 5,
        }
    }

    #[tokio::test]
    async fn stale_completion_is_ignored() {
        let mut fetcher = BackgroundFetcher::new(Arc::new(NeverSource));
        fetcher.set_locator(Some("a".into()));
        let stale = fetcher.generation;
        fetcher.set_locator(Some("b".into()));

        assert!(!fetcher.complete(Completion {
            generation: stale,
            result: Ok(image()),
        }));
        assert!(fetcher.is_fetching());

        let current = fetcher.generation;
        assert!(fetcher.complete(Completion {
            generation: current,
            result: Err(FetchFailure::new("404")),
        }));
        assert_eq!(fetcher.failure_reason(), Some("404"));
    }

    #[tokio::test]
    async fn clearing_goes_idle() {
        let mut fetcher = BackgroundFetcher::new(Arc::new(NeverSource));
        fetcher.set_locator(Some("a".into()));
        fetcher.set_locator(None);
        assert_eq!(fetcher.state(), &FetchState::Idle);
        assert!(!fetcher.next_update().await);
    }

    #[test]
    fn without_runtime_fails_instead_of_panicking() {
        let mut fetcher = BackgroundFetcher::new(Arc::new(NeverSource));
        fetcher.set_locator(Some("a".into()));
        assert_eq!(fetcher.failure_reason(), Some("no async runtime available"));
    }
}
