use crate::models::catalog::CatalogEntry;

/// Result of resolving a pick from a selection menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionOutcome {
    Selected(CatalogEntry),
    /// Token did not resolve, or the session ended before the pick.
    NotFound,
    /// The picker is not in a voice channel right now.
    NoVoiceChannel,
}
