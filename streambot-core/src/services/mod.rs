pub mod discord;
pub mod playback;
pub mod selection;
pub mod stream_service;

pub use playback::PlaybackDispatcher;
pub use stream_service::{BrowseReply, BrowseRequest, InteractionReply, StreamService};
