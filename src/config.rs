// src/config.rs
// Environment-driven configuration. Upstream base URLs are overridable so
// the integration tests can point the clients at a local mock server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

pub const OPENLIGA_BASE: &str = "https://api.openligadb.de";
pub const ESPN_SCOREBOARD_BASE: &str = "https://site.web.api.espn.com/apis/site/v2/sports/soccer";
pub const ESPN_STANDINGS_BASE: &str = "https://site.api.espn.com/apis/v2/sports/soccer";

/// Fixed timeout for every upstream call; a slow provider delays the
/// response but never hangs it.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Directory of the dashboard front end, served for unmatched paths.
    pub web_dir: PathBuf,
    pub openliga_base: String,
    pub espn_scoreboard_base: String,
    pub espn_standings_base: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            web_dir: PathBuf::from("web"),
            openliga_base: OPENLIGA_BASE.to_string(),
            espn_scoreboard_base: ESPN_SCOREBOARD_BASE.to_string(),
            espn_standings_base: ESPN_STANDINGS_BASE.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(addr) = env_var("BIND_ADDR").and_then(|v| v.parse().ok()) {
            cfg.bind_addr = addr;
        }
        if let Some(dir) = env_var("WEB_DIR") {
            cfg.web_dir = PathBuf::from(dir);
        }
        if let Some(base) = env_var("OPENLIGA_BASE_URL") {
            cfg.openliga_base = base;
        }
        if let Some(base) = env_var("ESPN_SCOREBOARD_BASE_URL") {
            cfg.espn_scoreboard_base = base;
        }
        if let Some(base) = env_var("ESPN_STANDINGS_BASE_URL") {
            cfg.espn_standings_base = base;
        }
        cfg
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
