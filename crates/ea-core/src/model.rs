//! Document model for Emoji Art.
//!
//! A document is an optional background locator plus an ordered list of
//! placed emojis. List order is render order: later entries draw on top.
//!
//! Emoji ids come from a per-document counter that only moves forward.
//! The counter is not part of the serialized form; decoding recomputes it as
//! one past the largest id present, so ids of emojis deleted *before* a save
//! may be issued again after a reload. Ids present in the document are never
//! duplicated. `EmojiId::MAX` is never a valid id: the counter must always be
//! able to step past the largest id, so once it reaches the top no more ids
//! are issued.

use crate::position::Position;
use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use std::collections::HashSet;

/// Identity of a placed emoji, unique within its document.
pub type EmojiId = u64;

/// A single emoji placed on the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Emoji {
    /// The emoji grapheme itself.
    #[serde(rename = "string")]
    pub content: String,
    pub position: Position,
    /// Point size at zoom 1. Always at least 1.
    pub size: u32,
    id: EmojiId,
}

impl Emoji {
    pub fn id(&self) -> EmojiId {
        self.id
    }

    /// `size * factor`, rounded half away from zero, never below 1.
    pub fn scaled_size(&self, factor: f64) -> u32 {
        let scaled = (f64::from(self.size) * factor).round();
        if scaled < 1.0 {
            1
        } else if scaled >= f64::from(u32::MAX) {
            u32::MAX
        } else {
            scaled as u32
        }
    }
}

/// Failure to turn bytes into a document. Existing state is never touched.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("document is not valid JSON: {0}")]
    Syntax(serde_json::Error),
    #[error("document does not match the schema: {0}")]
    Schema(serde_json::Error),
    #[error("emoji id {0} appears more than once")]
    DuplicateId(EmojiId),
    #[error("emoji {0} has size 0")]
    ZeroSize(EmojiId),
    #[error("emoji id {0} is out of range")]
    IdOverflow(EmojiId),
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        match err.classify() {
            Category::Data => DecodeError::Schema(err),
            Category::Io | Category::Syntax | Category::Eof => DecodeError::Syntax(err),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("failed to encode document: {0}")]
pub struct EncodeError(#[from] serde_json::Error);

/// On-disk shape: `{ "background": "...", "emojis": [...] }`.
#[derive(Deserialize)]
struct SerializedArt {
    #[serde(default)]
    background: Option<String>,
    emojis: Vec<Emoji>,
}

/// The document: background plus ordered emojis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmojiArt {
    background: Option<String>,
    emojis: Vec<Emoji>,
    next_id: EmojiId,
}

impl Default for EmojiArt {
    fn default() -> Self {
        Self {
            background: None,
            emojis: Vec::new(),
            next_id: 1,
        }
    }
}

impl EmojiArt {
    pub fn new() -> Self {
        Self::default()
    }

    // ─── Reading ─────────────────────────────────────────────────────────

    pub fn background(&self) -> Option<&str> {
        self.background.as_deref()
    }

    pub fn emojis(&self) -> &[Emoji] {
        &self.emojis
    }

    pub fn len(&self) -> usize {
        self.emojis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emojis.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Emoji> {
        self.emojis.iter()
    }

    /// The id the next `add_emoji` will hand out.
    pub fn next_id(&self) -> EmojiId {
        self.next_id
    }

    pub fn get(&self, id: EmojiId) -> Option<&Emoji> {
        self.emojis.iter().find(|e| e.id == id)
    }

    /// Position of the emoji in render order.
    pub fn index_of(&self, id: EmojiId) -> Option<usize> {
        self.emojis.iter().position(|e| e.id == id)
    }

    fn get_mut(&mut self, id: EmojiId) -> Option<&mut Emoji> {
        self.emojis.iter_mut().find(|e| e.id == id)
    }

    // ─── Mutation ────────────────────────────────────────────────────────

    /// Build the record `add_emoji` would append, without adding it.
    ///
    /// The id is the current counter value; inserting the record with
    /// [`EmojiArt::insert_emoji`] advances the counter past it. `None` once
    /// the id space is exhausted.
    pub fn new_emoji(
        &self,
        content: impl Into<String>,
        position: Position,
        size: u32,
    ) -> Option<Emoji> {
        self.next_id.checked_add(1)?;
        Some(Emoji {
            content: content.into(),
            position,
            size: size.max(1),
            id: self.next_id,
        })
    }

    /// Append a new emoji on top of everything else and return its id.
    ///
    /// Returns `None` without touching the document if no id is left.
    pub fn add_emoji(
        &mut self,
        content: impl Into<String>,
        position: Position,
        size: u32,
    ) -> Option<EmojiId> {
        let Some(emoji) = self.new_emoji(content, position, size) else {
            log::warn!("emoji ids exhausted, not adding");
            return None;
        };
        let id = emoji.id;
        self.next_id = id.checked_add(1)?;
        self.emojis.push(emoji);
        log::debug!("add emoji {id} at {position}");
        Some(id)
    }

    /// Put an existing record back at `index` (clamped to the end).
    ///
    /// Returns `false` without touching the document if the id is taken or
    /// is `EmojiId::MAX`.
    pub fn insert_emoji(&mut self, index: usize, emoji: Emoji) -> bool {
        if self.get(emoji.id).is_some() {
            log::warn!("refusing to insert duplicate emoji id {}", emoji.id);
            return false;
        }
        let Some(after) = emoji.id.checked_add(1) else {
            log::warn!("refusing to insert out-of-range emoji id {}", emoji.id);
            return false;
        };
        self.next_id = self.next_id.max(after);
        let index = index.min(self.emojis.len());
        self.emojis.insert(index, emoji);
        true
    }

    /// Remove an emoji, returning its former index and record.
    pub fn remove_emoji(&mut self, id: EmojiId) -> Option<(usize, Emoji)> {
        let index = self.index_of(id)?;
        Some((index, self.emojis.remove(index)))
    }

    /// Offset an emoji by `by`. Returns whether the id was found.
    pub fn move_emoji(&mut self, id: EmojiId, by: Position) -> bool {
        match self.get_mut(id) {
            Some(emoji) => {
                emoji.position += by;
                true
            }
            None => false,
        }
    }

    /// Scale an emoji's size by `factor`, rounding and clamping to at least 1.
    ///
    /// Returns the new size, or `None` if the id is absent or the factor is
    /// not a finite number.
    pub fn resize_emoji(&mut self, id: EmojiId, factor: f64) -> Option<u32> {
        if !factor.is_finite() {
            log::warn!("ignoring non-finite resize factor {factor}");
            return None;
        }
        let emoji = self.get_mut(id)?;
        emoji.size = emoji.scaled_size(factor);
        Some(emoji.size)
    }

    /// Set an emoji's size outright. Returns the previous size.
    pub fn set_emoji_size(&mut self, id: EmojiId, size: u32) -> Option<u32> {
        let emoji = self.get_mut(id)?;
        Some(std::mem::replace(&mut emoji.size, size.max(1)))
    }

    /// Replace the background locator. Empty strings clear it.
    /// Returns the previous locator.
    pub fn set_background(&mut self, url: Option<String>) -> Option<String> {
        let url = url.filter(|u| !u.trim().is_empty());
        std::mem::replace(&mut self.background, url)
    }

    // ─── Serialization ───────────────────────────────────────────────────

    /// Encode as JSON. Emoji order is preserved.
    pub fn to_json(&self) -> Result<Vec<u8>, EncodeError> {
        let wire = SerializedArtRef {
            background: self.background.as_deref(),
            emojis: &self.emojis,
        };
        Ok(serde_json::to_vec(&wire)?)
    }

    /// Decode a document produced by [`EmojiArt::to_json`].
    pub fn from_json(bytes: &[u8]) -> Result<Self, DecodeError> {
        let wire: SerializedArt = serde_json::from_slice(bytes)?;

        let mut seen = HashSet::with_capacity(wire.emojis.len());
        for emoji in &wire.emojis {
            if !seen.insert(emoji.id) {
                return Err(DecodeError::DuplicateId(emoji.id));
            }
            if emoji.size == 0 {
                return Err(DecodeError::ZeroSize(emoji.id));
            }
        }

        let next_id = match wire.emojis.iter().map(|e| e.id).max() {
            None => 1,
            Some(max) => max.checked_add(1).ok_or(DecodeError::IdOverflow(max))?,
        };
        Ok(Self {
            background: wire.background.filter(|u| !u.trim().is_empty()),
            emojis: wire.emojis,
            next_id,
        })
    }
}

impl<'a> IntoIterator for &'a EmojiArt {
    type Item = &'a Emoji;
    type IntoIter = std::slice::Iter<'a, Emoji>;

    fn into_iter(self) -> Self::IntoIter {
        self.emojis.iter()
    }
}

#[derive(Serialize)]
struct SerializedArtRef<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    background: Option<&'a str>,
    emojis: &'a [Emoji],
}
