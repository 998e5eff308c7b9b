//! Integration tests: background fetching, alone and driven by a document.

use ea_core::position::Position;
use ea_editor::background::{BackgroundFetcher, FetchFailure, FetchFuture, FetchState, FetchedImage, ImageSource};
use ea_editor::commands::UndoStack;
use ea_editor::document::EmojiArtDocument;
use ea_editor::edit::DocumentChange;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

type Outcome = Result<FetchedImage, FetchFailure>;

/// Image source whose fetches resolve only when the test says so.
#[derive(Default)]
struct GatedSource {
    pending: Mutex<HashMap<String, oneshot::Receiver<Outcome>>>,
    requests: Mutex<Vec<String>>,
}

impl GatedSource {
    fn gate(&self, locator: &str) -> oneshot::Sender<Outcome> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(locator.to_string(), rx);
        tx
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl ImageSource for GatedSource {
    fn fetch(&self, locator: &str) -> FetchFuture {
        self.requests.lock().unwrap().push(locator.to_string());
        let gate = self.pending.lock().unwrap().remove(locator);
        Box::pin(async move {
            match gate {
                Some(rx) => rx.await.unwrap_or_else(|_| Err(FetchFailure::new("gate dropped"))),
                None => Err(FetchFailure::new("unreachable host")),
            }
        })
    }
}

fn image(width: u32, height: u32) -> FetchedImage {
    FetchedImage {
        bytes: vec![0; 4],
        width,
        height,
    }
}

// ─── Fetcher ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn success_is_cached_against_locator() {
    let source = Arc::new(GatedSource::default());
    let gate = source.gate("a");
    let mut fetcher = BackgroundFetcher::new(source.clone());

    fetcher.set_locator(Some("a".into()));
    assert!(fetcher.is_fetching());
    gate.send(Ok(image(640, 480))).unwrap();

    assert!(fetcher.next_update().await);
    assert_eq!(fetcher.image().map(|i| (i.width, i.height)), Some((640, 480)));

    // Same locator again does not refetch.
    fetcher.set_locator(Some("a".into()));
    assert!(!fetcher.is_fetching());
    assert_eq!(source.requests(), vec!["a"]);
}

#[tokio::test]
async fn last_locator_wins() {
    let source = Arc::new(GatedSource::default());
    let gate_a = source.gate("a");
    let gate_b = source.gate("b");
    let mut fetcher = BackgroundFetcher::new(source.clone());

    fetcher.set_locator(Some("a".into()));
    fetcher.set_locator(Some("b".into()));
    assert!(fetcher.is_fetching());

    // A resolving after the switch must not leak into state.
    let _ = gate_a.send(Ok(image(1, 1)));
    tokio::task::yield_now().await;
    fetcher.pump();
    assert!(fetcher.is_fetching());

    gate_b.send(Ok(image(2, 3))).unwrap();
    assert!(fetcher.next_update().await);
    assert_eq!(fetcher.locator(), Some("b"));
    assert_eq!(fetcher.image().map(|i| (i.width, i.height)), Some((2, 3)));
}

#[tokio::test]
async fn failure_keeps_reason_until_retry() {
    let source = Arc::new(GatedSource::default());
    let mut fetcher = BackgroundFetcher::new(source.clone());

    fetcher.set_locator(Some("nowhere".into()));
    assert!(fetcher.next_update().await);
    assert_eq!(fetcher.failure_reason(), Some("unreachable host"));

    let gate = source.gate("nowhere");
    assert!(fetcher.retry());
    assert!(fetcher.is_fetching());
    gate.send(Ok(image(8, 8))).unwrap();
    assert!(fetcher.next_update().await);
    assert!(matches!(fetcher.state(), FetchState::Succeeded(_)));
}

#[tokio::test]
async fn resetting_failed_locator_refetches() {
    let source = Arc::new(GatedSource::default());
    let mut fetcher = BackgroundFetcher::new(source.clone());

    fetcher.set_locator(Some("x".into()));
    fetcher.next_update().await;
    assert!(fetcher.failure_reason().is_some());

    fetcher.set_locator(Some("x".into()));
    assert!(fetcher.is_fetching());
    assert_eq!(source.requests(), vec!["x", "x"]);
}

// ─── Document-driven ─────────────────────────────────────────────────────

#[tokio::test]
async fn document_background_drives_fetcher() {
    let source = Arc::new(GatedSource::default());
    let gate = source.gate("https://example.com/bg.jpg");
    let mut doc = EmojiArtDocument::with_undo(Box::new(UndoStack::default()));
    doc.attach_fetcher(BackgroundFetcher::new(source.clone()));

    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    doc.subscribe(move |c| sink.borrow_mut().push(c.clone()));

    doc.set_background(Some("https://example.com/bg.jpg".into()));
    assert!(doc.fetcher().unwrap().is_fetching());

    gate.send(Ok(image(100, 50))).unwrap();
    assert!(doc.background_settled().await);
    assert!(doc.fetcher().unwrap().image().is_some());

    // Editing emojis leaves the fetched background alone.
    doc.add_emoji("🌞", Position::ZERO, 40).unwrap();
    assert_eq!(source.requests().len(), 1);

    // Undo the emoji, then the background: the fetcher goes idle.
    doc.undo();
    doc.undo();
    assert_eq!(doc.fetcher().unwrap().state(), &FetchState::Idle);

    assert_eq!(seen.borrow()[1], DocumentChange::BackgroundStatus);
}

#[tokio::test]
async fn poll_reports_finished_fetch() {
    let source = Arc::new(GatedSource::default());
    let gate = source.gate("u");
    let mut doc = EmojiArtDocument::new();
    doc.attach_fetcher(BackgroundFetcher::new(source));

    doc.set_background(Some("u".into()));
    assert!(!doc.poll_background());

    gate.send(Err(FetchFailure::new("not an image"))).unwrap();
    // Give the spawned fetch a chance to run.
    for _ in 0..10 {
        tokio::task::yield_now().await;
        if doc.poll_background() {
            break;
        }
    }
    assert_eq!(doc.fetcher().unwrap().failure_reason(), Some("not an image"));
}
