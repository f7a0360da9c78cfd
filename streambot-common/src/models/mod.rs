// File: streambot-common/src/models/mod.rs
pub mod catalog;
pub mod inventory;
pub mod playback;
pub mod selection;
pub mod voice;

pub use catalog::{Catalog, CatalogEntry};
pub use inventory::{InventoryItem, InventoryItemList};
pub use playback::{DisconnectRequest, DisconnectUser, PlayRequest};
pub use selection::SelectionOutcome;
pub use voice::VoiceChannel;
