use clap::Parser;
use std::collections::HashSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

pub const DEFAULT_PORT: u16 = 3001;

pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &["http://localhost:5173", "http://127.0.0.1:5173"];

/// Process configuration. Every flag can be overridden from the environment.
#[derive(Parser, Debug, Clone)]
#[command(name = "tandem-server")]
#[command(about = "Two-party rendezvous and handshake relay for peer-to-peer calls")]
pub struct ServerConfig {
    /// Address to bind the listener to
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port of the HTTP/WebSocket listener
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Comma-separated list of origins allowed to connect
    #[arg(
        long,
        env = "ALLOWED_ORIGINS",
        value_delimiter = ',',
        default_values_t = DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string())
    )]
    pub allowed_origins: Vec<String>,

    /// Accept any origin
    #[arg(long, env = "ALLOW_ANY_ORIGIN")]
    pub allow_any_origin: bool,
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn origin_policy(&self) -> OriginPolicy {
        if self.allow_any_origin {
            OriginPolicy::any()
        } else {
            OriginPolicy::list(self.allowed_origins.iter().cloned())
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            allowed_origins: DEFAULT_ALLOWED_ORIGINS
                .iter()
                .map(|o| o.to_string())
                .collect(),
            allow_any_origin: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OriginPolicy {
    any: bool,
    allowed: HashSet<String>,
}

impl OriginPolicy {
    pub fn any() -> Self {
        Self {
            any: true,
            allowed: HashSet::new(),
        }
    }

    pub fn list(origins: impl IntoIterator<Item = String>) -> Self {
        Self {
            any: false,
            allowed: origins
                .into_iter()
                .map(|o| o.trim().trim_end_matches('/').to_owned())
                .filter(|o| !o.is_empty())
                .collect(),
        }
    }

    pub fn allows_any(&self) -> bool {
        self.any
    }

    pub fn origins(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }

    /// Requests without an `Origin` header (non-browser clients) pass.
    pub fn allows(&self, origin: Option<&str>) -> bool {
        match origin {
            None => true,
            Some(_) if self.any => true,
            Some(origin) => self.allowed.contains(origin.trim_end_matches('/')),
        }
    }
}
