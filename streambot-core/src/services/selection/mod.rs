//! Paginated stream picker: per-user session state machine and the table
//! holding the live sessions.

pub mod session;
pub mod table;

pub use session::{
    EventResult, IgnoreReason, MenuOption, Navigation, PageView, SelectionConfig,
    SelectionSession, SessionEvent, SessionKey, SessionOrigin, SessionState,
};
pub use table::{SessionHandle, SessionTable};
