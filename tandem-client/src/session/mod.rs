pub mod session_event;
pub mod session_handle;
pub mod session_manager;

pub use session_event::SessionEvent;
pub use session_handle::SessionHandle;
pub use session_manager::{Collaborators, SessionEvents, SessionManager};
