//! Palettes: named bags of emoji graphemes.
//!
//! Two palettes share an identity iff their `id`s match; contents are
//! irrelevant to identity. Built-ins derive their id from their name.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "StoredPalette")]
pub struct Palette {
    pub id: String,
    pub name: String,
    /// Concatenated graphemes, each appearing once, in first-seen order.
    emojis: String,
}

/// Persisted form. Older records may omit `id`, in which case the name is used.
#[derive(Deserialize)]
struct StoredPalette {
    #[serde(default)]
    id: Option<String>,
    name: String,
    #[serde(default)]
    emojis: String,
}

impl From<StoredPalette> for Palette {
    fn from(stored: StoredPalette) -> Self {
        let id = stored
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| stored.name.clone());
        Self::with_id(id, stored.name, &stored.emojis)
    }
}

impl Palette {
    /// A palette whose id is its name.
    pub fn new(name: impl Into<String>, emojis: &str) -> Self {
        let name = name.into();
        Self::with_id(name.clone(), name, emojis)
    }

    /// A palette with a freshly minted, globally unique id.
    pub fn with_generated_id(name: impl Into<String>, emojis: &str) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), name, emojis)
    }

    pub fn with_id(id: impl Into<String>, name: impl Into<String>, emojis: &str) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            emojis: uniqued(emojis),
        }
    }

    /// The raw emoji string.
    pub fn emojis(&self) -> &str {
        &self.emojis
    }

    /// Iterate the palette's graphemes in order.
    pub fn graphemes(&self) -> impl Iterator<Item = &str> {
        self.emojis.graphemes(true)
    }

    pub fn len(&self) -> usize {
        self.graphemes().count()
    }

    pub fn is_empty(&self) -> bool {
        self.emojis.is_empty()
    }

    pub fn contains(&self, emoji: &str) -> bool {
        self.graphemes().any(|g| g == emoji)
    }

    /// Append each grapheme of `emojis` not already present.
    pub fn add_emojis(&mut self, emojis: &str) {
        let mut merged = std::mem::take(&mut self.emojis);
        merged.push_str(emojis);
        self.emojis = uniqued(&merged);
    }

    /// Remove a grapheme. Returns whether it was present.
    pub fn remove_emoji(&mut self, emoji: &str) -> bool {
        let kept: String = self.graphemes().filter(|g| *g != emoji).collect();
        let removed = kept.len() != self.emojis.len();
        self.emojis = kept;
        removed
    }

    /// The palettes a store seeds itself with on first use.
    pub fn builtins() -> Vec<Palette> {
        BUILTINS
            .iter()
            .map(|(name, emojis)| Palette::new(*name, emojis))
            .collect()
    }

    /// Last-resort palette used when there are no built-ins at all.
    pub fn warning() -> Palette {
        Palette::new("Warning", "⚠️")
    }
}

/// Drop repeated graphemes, keeping first occurrences.
fn uniqued(emojis: &str) -> String {
    let mut out = String::with_capacity(emojis.len());
    let mut seen: Vec<&str> = Vec::new();
    for g in emojis.graphemes(true) {
        if g.trim().is_empty() || seen.contains(&g) {
            continue;
        }
        seen.push(g);
        out.push_str(g);
    }
    out
}

const BUILTINS: &[(&str, &str)] = &[
    ("Vehicles", "🚙🚗🚘🚕🚖🏎🚚🛻🚛🚐🚓🚔🚑🚒🚀✈️🛫🛬🛩🚁🛸🚲🏍🛶⛵️🚤🛥🛳⛴🚢🚂🚝🚅🚆🚊🚉🚇🛺🚜"),
    ("Sports", "🏈⚾️🏀⚽️🎾🏐🥏🏓⛳️🥅🥌🏂⛷🎳"),
    ("Music", "🎼🎤🎹🪘🥁🎺🪗🪕🎻"),
    ("Animals", "🐥🐣🐂🐄🐎🐖🐏🐑🦙🐐🐓🐁🐀🐒🦆🦅🦉🦇🐢🐍🦎🦖🦕🐅🐆🦓🦍🦧🦣🐘🦛🦏🐪🐫🦒🦘🦬🐃🦙🐐🦌🐕🐩🦮🐈🦤🦢🦩🕊🦝🦨🦡🦫🦦🦥🐿🦔"),
    ("Animal Faces", "🐵🙈🙊🙉🐶🐱🐭🐹🐰🦊🐻🐼🐻‍❄️🐨🐯🦁🐮🐷🐸🐲"),
    ("Flora", "🌲🌴🌿☘️🍀🍁🍄🌾💐🌷🌹🥀🌺🌸🌼🌻"),
    ("Weather", "☀️🌤⛅️🌥☁️🌦🌧⛈🌩🌨❄️💨☔️💧💦🌊☂️🌫🌪"),
    ("COVID", "💉🦠😷🤧🤒"),
    ("Faces", "😀😃😄😁😆😅😂🤣🥲☺️😊😇🙂🙃😉😌😍🥰😘😗😙😚😋😛😝😜🤪🤨🧐🤓😎🥸🤩🥳😏😞😔😟😕🙁☹️😣😖😫😩🥺😢😭😤😠😡🤯😳🥶😥😓🤗🤔🤭🤫🤥😬🙄😯😧🥱😴🤮😷🤧🤒🤠"),
];
