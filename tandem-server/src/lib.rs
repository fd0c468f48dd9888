//! Rendezvous and handshake relay for two-party peer-to-peer calls.
//!
//! Participants connect over a WebSocket at `/ws`, receive their identity in
//! a `welcome` message and join a named room. The second participant in a
//! room is told the incumbent is already present and becomes the offerer;
//! the incumbent is told a peer joined and answers. Offers, answers and
//! transport candidates are then relayed by target identity until one side
//! leaves, at which point the other receives `peer-left`.

pub mod config;
pub mod error;
pub mod http;
pub mod registry;
pub mod relay;
pub mod rendezvous;
pub mod room;
pub mod signaling;

pub use config::{OriginPolicy, ServerConfig};
pub use error::ServerError;
pub use http::router;
pub use registry::ConnectionRegistry;
pub use relay::{MessageRelay, RelayMiss};
pub use rendezvous::{Notification, RendezvousCoordinator};
pub use room::{JoinResult, LeaveResult, ROOM_CAPACITY, Room, RoomTable};
pub use signaling::{ServiceStats, SignalingOutput, SignalingService, ws_handler};

use std::future::Future;
use tokio::net::TcpListener;
use tracing::info;

/// Serve signaling on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    service: SignalingService,
    origins: OriginPolicy,
    shutdown: F,
) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = router(service, origins);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Bind the configured address and serve until `shutdown` resolves.
pub async fn run<F>(config: ServerConfig, shutdown: F) -> Result<(), ServerError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.addr();
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    info!("Signaling server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    serve(
        listener,
        SignalingService::new(),
        config.origin_policy(),
        shutdown,
    )
    .await
}
