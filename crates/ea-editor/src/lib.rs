pub mod background;
pub mod commands;
pub mod document;
pub mod drop;
pub mod edit;

pub use background::{BackgroundFetcher, FetchFailure, FetchState, FetchedImage, ImageSource};
pub use commands::{GroupToken, UndoCoordinator, UndoEntry, UndoStack, UndoStep};
pub use document::EmojiArtDocument;
pub use drop::DropPayload;
pub use edit::{DocumentChange, DocumentEdit};
