//! Drag-and-drop / paste payloads.

/// What was dropped onto the canvas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropPayload {
    /// A locator for a background image.
    Url(String),
    /// A literal emoji string from a palette.
    Emoji(String),
}

impl DropPayload {
    /// Classify pasted text: anything with a URL scheme (`scheme://...` or
    /// `data:`) is a locator, everything else is treated as an emoji.
    pub fn from_text(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        if looks_like_url(text) {
            Some(DropPayload::Url(text.to_string()))
        } else {
            Some(DropPayload::Emoji(text.to_string()))
        }
    }
}

fn looks_like_url(text: &str) -> bool {
    if text.starts_with("data:") {
        return true;
    }
    match text.split_once("://") {
        Some((scheme, rest)) => {
            !rest.is_empty()
                && scheme.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}
