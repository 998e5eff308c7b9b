pub mod canvas;
pub mod config;
pub mod model;
pub mod observe;
pub mod palette;
pub mod position;
pub mod settings;
pub mod store;

pub use canvas::{CanvasTransform, ViewPoint};
pub use config::{ConfigError, EditorConfig};
pub use model::{DecodeError, EmojiArt, EmojiId, EncodeError, Emoji};
pub use observe::{Subject, SubscriptionId};
pub use palette::Palette;
pub use position::Position;
pub use settings::{FileSettings, MemorySettings, SettingsError, SettingsStore};
pub use store::{PaletteStore, PaletteStoreChange};
