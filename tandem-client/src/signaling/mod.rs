pub mod signaling_channel;
pub mod ws_connector;

pub use signaling_channel::{SignalingConnector, SignalingLink};
pub use ws_connector::WsConnector;
