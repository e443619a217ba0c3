use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use inkroom_shared::StrokeLimits;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    #[arg(long, env = "INKROOM_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,
    #[arg(long, env = "PORT", default_value_t = 3500)]
    pub port: u16,
    #[arg(long, env = "INKROOM_PUBLIC_DIR")]
    pub public_dir: Option<PathBuf>,
    /// Allowed CORS origin; may be repeated. Any origin is allowed when unset.
    #[arg(long = "cors-origin", env = "INKROOM_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,
    /// Reclaim sessions that have had no members for this long.
    #[arg(long, env = "INKROOM_IDLE_SESSION_TTL_SECS")]
    pub idle_session_ttl_secs: Option<u64>,
    #[arg(long, default_value_t = 60)]
    pub reap_interval_secs: u64,
    #[arg(long, default_value_t = 20_000)]
    pub max_strokes: usize,
    #[arg(long, default_value_t = 10_000)]
    pub max_points_per_stroke: usize,
    #[arg(long, default_value_t = 2_000)]
    pub max_chat_len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLimits {
    pub stroke: StrokeLimits,
    pub max_strokes: usize,
    pub max_chat_len: usize,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self {
            stroke: StrokeLimits::default(),
            max_strokes: 20_000,
            max_chat_len: 2_000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub public_dir: PathBuf,
    pub cors_origins: Vec<String>,
    pub idle_session_ttl: Option<Duration>,
    pub reap_interval: Duration,
    pub limits: SessionLimits,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 3500)),
            public_dir: default_public_dir(),
            cors_origins: Vec::new(),
            idle_session_ttl: None,
            reap_interval: Duration::from_secs(60),
            limits: SessionLimits::default(),
        }
    }
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            addr: SocketAddr::new(args.host, args.port),
            public_dir: args.public_dir.unwrap_or_else(default_public_dir),
            cors_origins: args
                .cors_origins
                .into_iter()
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
            idle_session_ttl: args.idle_session_ttl_secs.map(Duration::from_secs),
            reap_interval: Duration::from_secs(args.reap_interval_secs.max(1)),
            limits: SessionLimits {
                stroke: StrokeLimits {
                    max_points: args.max_points_per_stroke,
                },
                max_strokes: args.max_strokes,
                max_chat_len: args.max_chat_len,
            },
        }
    }
}

fn default_public_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../public")
}
