//! Concrete document edits.
//!
//! Every change the editor makes to an [`EmojiArt`] is expressed as a
//! `DocumentEdit`. Edits carry absolute data (whole records, final sizes) so
//! they can be replayed for redo and inverted for undo.

use ea_core::model::{Emoji, EmojiArt, EmojiId};
use ea_core::position::Position;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEdit {
    /// Put a record at `index` in render order (clamped to the end).
    InsertEmoji { index: usize, emoji: Emoji },
    RemoveEmoji { id: EmojiId },
    MoveEmoji { id: EmojiId, by: Position },
    SetEmojiSize { id: EmojiId, size: u32 },
    SetBackground { url: Option<String> },
}

/// Published after each successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentChange {
    EmojiAdded(EmojiId),
    EmojiRemoved(EmojiId),
    EmojiMoved(EmojiId),
    EmojiResized(EmojiId),
    BackgroundChanged(Option<String>),
    /// Several edits at once (grouped undo/redo) or a whole-document load.
    Replaced,
    /// The background fetcher moved to a new state.
    BackgroundStatus,
}

impl DocumentEdit {
    /// Apply to `art`. Returns `None` when the edit referenced an absent id
    /// (or a taken one, for inserts) and nothing changed.
    pub fn apply(self, art: &mut EmojiArt) -> Option<DocumentChange> {
        match self {
            DocumentEdit::InsertEmoji { index, emoji } => {
                let id = emoji.id();
                art.insert_emoji(index, emoji)
                    .then_some(DocumentChange::EmojiAdded(id))
            }
            DocumentEdit::RemoveEmoji { id } => art
                .remove_emoji(id)
                .map(|_| DocumentChange::EmojiRemoved(id)),
            DocumentEdit::MoveEmoji { id, by } => art
                .move_emoji(id, by)
                .then_some(DocumentChange::EmojiMoved(id)),
            DocumentEdit::SetEmojiSize { id, size } => art
                .set_emoji_size(id, size)
                .map(|_| DocumentChange::EmojiResized(id)),
            DocumentEdit::SetBackground { url } => {
                art.set_background(url);
                Some(DocumentChange::BackgroundChanged(
                    art.background().map(str::to_string),
                ))
            }
        }
    }

    /// The edit that restores `art`'s current state after `self` is applied.
    ///
    /// Must be called *before* applying. `None` means `self` would be a
    /// no-op against `art`.
    pub fn inverse(&self, art: &EmojiArt) -> Option<DocumentEdit> {
        match self {
            DocumentEdit::InsertEmoji { emoji, .. } => match art.get(emoji.id()) {
                Some(_) => None,
                None => Some(DocumentEdit::RemoveEmoji { id: emoji.id() }),
            },
            DocumentEdit::RemoveEmoji { id } => {
                // Capture the record and its slot so undo restores z-order.
                let index = art.index_of(*id)?;
                Some(DocumentEdit::InsertEmoji {
                    index,
                    emoji: art.emojis()[index].clone(),
                })
            }
            DocumentEdit::MoveEmoji { id, by } => {
                art.get(*id)?;
                Some(DocumentEdit::MoveEmoji { id: *id, by: -*by })
            }
            DocumentEdit::SetEmojiSize { id, .. } => {
                let old = art.get(*id)?.size;
                Some(DocumentEdit::SetEmojiSize { id: *id, size: old })
            }
            DocumentEdit::SetBackground { .. } => Some(DocumentEdit::SetBackground {
                url: art.background().map(str::to_string),
            }),
        }
    }
}
