use crate::transport::TransportConfig;

pub const DEFAULT_SERVER_URL: &str = "ws://localhost:3001/ws";

/// Where to find the signaling server and which ICE servers to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub server_url: String,
    pub ice_servers: Vec<String>,
}

impl ClientConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            ..Self::default()
        }
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            ice_servers: self.ice_servers.clone(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_owned(),
            ice_servers: TransportConfig::default().ice_servers,
        }
    }
}
