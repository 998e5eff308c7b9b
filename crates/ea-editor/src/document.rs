//! Undo-aware document wrapper.
//!
//! `EmojiArtDocument` owns the [`EmojiArt`] model and is the only way the UI
//! mutates it. Each mutation:
//!
//! 1. builds a concrete [`DocumentEdit`] and its inverse against the current
//!    state (an absent id makes the call a silent no-op),
//! 2. registers the pair with the undo coordinator, if one was supplied,
//! 3. applies the edit and publishes exactly one [`DocumentChange`].
//!
//! Edits made between `begin_gesture` and `end_gesture` share a group token
//! and undo as one step.

use crate::background::BackgroundFetcher;
use crate::commands::{GroupToken, UndoCoordinator, UndoEntry};
use crate::drop::DropPayload;
use crate::edit::{DocumentChange, DocumentEdit};
use ea_core::canvas::{CanvasTransform, ViewPoint};
use ea_core::model::{DecodeError, Emoji, EmojiArt, EmojiId, EncodeError};
use ea_core::observe::{Subject, SubscriptionId};
use ea_core::position::Position;
use std::fmt;

pub struct EmojiArtDocument {
    art: EmojiArt,
    undo: Option<Box<dyn UndoCoordinator>>,
    changes: Subject<DocumentChange>,
    gesture: Option<GroupToken>,
    next_group: u64,
    fetcher: Option<BackgroundFetcher>,
}

impl EmojiArtDocument {
    /// An empty document with no undo support.
    pub fn new() -> Self {
        Self::from_art(EmojiArt::new(), None)
    }

    pub fn with_undo(undo: Box<dyn UndoCoordinator>) -> Self {
        Self::from_art(EmojiArt::new(), Some(undo))
    }

    pub fn from_art(art: EmojiArt, undo: Option<Box<dyn UndoCoordinator>>) -> Self {
        Self {
            art,
            undo,
            changes: Subject::new(),
            gesture: None,
            next_group: 0,
            fetcher: None,
        }
    }

    pub fn from_json(bytes: &[u8], undo: Option<Box<dyn UndoCoordinator>>) -> Result<Self, DecodeError> {
        Ok(Self::from_art(EmojiArt::from_json(bytes)?, undo))
    }

    // ─── Reading ─────────────────────────────────────────────────────────

    pub fn art(&self) -> &EmojiArt {
        &self.art
    }

    pub fn emojis(&self) -> &[Emoji] {
        self.art.emojis()
    }

    pub fn emoji(&self, id: EmojiId) -> Option<&Emoji> {
        self.art.get(id)
    }

    pub fn background(&self) -> Option<&str> {
        self.art.background()
    }

    pub fn to_json(&self) -> Result<Vec<u8>, EncodeError> {
        self.art.to_json()
    }

    /// Replace the whole document from bytes. Not undoable, and clears the
    /// undo history since its edits target the old records. On error the
    /// current document and history are left untouched.
    pub fn load_json(&mut self, bytes: &[u8]) -> Result<(), DecodeError> {
        let art = EmojiArt::from_json(bytes)?;
        self.art = art;
        self.gesture = None;
        if let Some(undo) = self.undo.as_mut() {
            undo.clear();
        }
        self.sync_fetcher();
        self.changes.emit(&DocumentChange::Replaced);
        Ok(())
    }

    // ─── Mutation ────────────────────────────────────────────────────────

    /// Returns `None` once the document has no ids left to issue.
    pub fn add_emoji(&mut self, content: &str, position: Position, size: u32) -> Option<EmojiId> {
        let Some(emoji) = self.art.new_emoji(content, position, size) else {
            log::warn!("emoji ids exhausted, not adding {content}");
            return None;
        };
        let id = emoji.id();
        let index = self.art.len();
        self.perform(
            DocumentEdit::InsertEmoji { index, emoji },
            &format!("Add {content}"),
        );
        Some(id)
    }

    /// Returns `false` when `id` is not in the document.
    pub fn remove_emoji(&mut self, id: EmojiId) -> bool {
        self.perform(DocumentEdit::RemoveEmoji { id }, "Delete")
    }

    pub fn move_emoji(&mut self, id: EmojiId, by: Position) -> bool {
        self.perform(DocumentEdit::MoveEmoji { id, by }, "Move")
    }

    /// Scale by `factor` (rounded, at least 1). Non-finite factors are ignored.
    pub fn resize_emoji(&mut self, id: EmojiId, factor: f64) -> bool {
        if !factor.is_finite() {
            log::warn!("ignoring non-finite resize factor {factor}");
            return false;
        }
        let Some(current) = self.art.get(id) else {
            return false;
        };
        let size = current.scaled_size(factor);
        self.perform(DocumentEdit::SetEmojiSize { id, size }, "Resize")
    }

    pub fn set_background(&mut self, url: Option<String>) {
        self.perform(DocumentEdit::SetBackground { url }, "Set Background");
    }

    /// Handle a drop at `location` (view space). Only the first payload is
    /// used; returns whether it was applied.
    pub fn drop_payloads(
        &mut self,
        payloads: &[DropPayload],
        location: ViewPoint,
        center: ViewPoint,
        transform: &CanvasTransform,
        palette_emoji_size: u32,
    ) -> bool {
        let Some(first) = payloads.first() else {
            return false;
        };
        match first {
            DropPayload::Url(url) => self.set_background(Some(url.clone())),
            DropPayload::Emoji(emoji) => {
                let position = transform.document_position(location, center);
                let size = transform.drop_size(palette_emoji_size);
                return self.add_emoji(emoji, position, size).is_some();
            }
        }
        true
    }

    fn perform(&mut self, forward: DocumentEdit, description: &str) -> bool {
        let Some(inverse) = forward.inverse(&self.art) else {
            log::trace!("skipping no-op edit {forward:?}");
            return false;
        };
        if let Some(undo) = self.undo.as_mut() {
            undo.register(
                UndoEntry {
                    forward: forward.clone(),
                    inverse,
                },
                description,
                self.gesture,
            );
        }
        match forward.apply(&mut self.art) {
            Some(change) => {
                self.publish(vec![change]);
                true
            }
            None => false,
        }
    }

    // ─── Undo ────────────────────────────────────────────────────────────

    pub fn can_undo(&self) -> bool {
        self.undo.as_ref().is_some_and(|u| u.can_undo())
    }

    pub fn can_redo(&self) -> bool {
        self.undo.as_ref().is_some_and(|u| u.can_redo())
    }

    /// Reverse the newest step. Returns its description.
    pub fn undo(&mut self) -> Option<String> {
        self.gesture = None;
        let step = self.undo.as_mut()?.undo()?;
        let changes = step
            .entries
            .iter()
            .rev()
            .filter_map(|entry| entry.inverse.clone().apply(&mut self.art))
            .collect();
        self.publish(changes);
        Some(step.description)
    }

    /// Re-apply the newest undone step. Returns its description.
    pub fn redo(&mut self) -> Option<String> {
        self.gesture = None;
        let step = self.undo.as_mut()?.redo()?;
        let changes = step
            .entries
            .iter()
            .filter_map(|entry| entry.forward.clone().apply(&mut self.art))
            .collect();
        self.publish(changes);
        Some(step.description)
    }

    /// Start coalescing edits into one undo step.
    pub fn begin_gesture(&mut self) -> GroupToken {
        self.next_group += 1;
        let token = GroupToken(self.next_group);
        self.gesture = Some(token);
        token
    }

    pub fn end_gesture(&mut self) {
        self.gesture = None;
    }

    // ─── Observation ─────────────────────────────────────────────────────

    pub fn subscribe(&mut self, observer: impl FnMut(&DocumentChange) + 'static) -> SubscriptionId {
        self.changes.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.changes.unsubscribe(id)
    }

    /// One notification per call: the single change, or `Replaced` when a
    /// grouped step touched several things.
    fn publish(&mut self, changes: Vec<DocumentChange>) {
        let touches_background = changes
            .iter()
            .any(|c| matches!(c, DocumentChange::BackgroundChanged(_)));
        if touches_background {
            self.sync_fetcher();
        }
        let event = match changes.len() {
            0 => return,
            1 => changes.into_iter().next().unwrap_or(DocumentChange::Replaced),
            _ => DocumentChange::Replaced,
        };
        self.changes.emit(&event);
    }

    // ─── Background ──────────────────────────────────────────────────────

    /// Let this document drive `fetcher` from its background locator.
    pub fn attach_fetcher(&mut self, fetcher: BackgroundFetcher) {
        self.fetcher = Some(fetcher);
        self.sync_fetcher();
    }

    pub fn fetcher(&self) -> Option<&BackgroundFetcher> {
        self.fetcher.as_ref()
    }

    /// Apply any finished fetch; publishes `BackgroundStatus` if it changed.
    pub fn poll_background(&mut self) -> bool {
        let changed = self.fetcher.as_mut().is_some_and(BackgroundFetcher::pump);
        if changed {
            self.changes.emit(&DocumentChange::BackgroundStatus);
        }
        changed
    }

    /// Wait for the in-flight fetch, if any, and publish its outcome.
    pub async fn background_settled(&mut self) -> bool {
        let changed = match self.fetcher.as_mut() {
            Some(fetcher) => fetcher.next_update().await,
            None => false,
        };
        if changed {
            self.changes.emit(&DocumentChange::BackgroundStatus);
        }
        changed
    }

    fn sync_fetcher(&mut self) {
        if let Some(fetcher) = self.fetcher.as_mut() {
            fetcher.set_locator(self.art.background().map(str::to_string));
        }
    }
}

impl Default for EmojiArtDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EmojiArtDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmojiArtDocument")
            .field("art", &self.art)
            .field("undo", &self.undo.is_some())
            .field("gesture", &self.gesture)
            .field("fetcher", &self.fetcher)
            .finish()
    }
}
