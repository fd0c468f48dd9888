pub mod mock_signaling;

pub use mock_signaling::*;
pub use ws_client::*;

use tracing::Level;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}
