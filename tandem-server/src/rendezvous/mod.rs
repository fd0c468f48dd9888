mod coordinator;
mod notification;

pub use coordinator::*;
pub use notification::*;
