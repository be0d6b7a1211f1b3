//! Configuration types.

use std::str::FromStr;
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port for the WebSocket + REST server.
    pub port: u16,
    /// Delay between the typing indicator and the substantive reply.
    pub typing_delay: Duration,
    /// How many top-ranked doshas contribute therapy recommendations.
    pub top_doshas: usize,
    /// Whether the keyword intent classifier answers free-text messages.
    pub intent_replies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            typing_delay: Duration::from_millis(600),
            top_doshas: 2,
            intent_replies: true,
        }
    }
}

impl ServerConfig {
    /// Build a config from `AYURSUTRA_*` environment variables.
    ///
    /// Unset variables fall back to defaults; set-but-unparseable values
    /// are an error rather than a silent fallback.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let port = parse_var("AYURSUTRA_PORT")?.unwrap_or(defaults.port);

        let typing_delay = parse_var("AYURSUTRA_TYPING_DELAY_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.typing_delay);

        let top_doshas: usize = parse_var("AYURSUTRA_TOP_DOSHAS")?.unwrap_or(defaults.top_doshas);
        if !(1..=3).contains(&top_doshas) {
            return Err(ConfigError::InvalidValue {
                key: "AYURSUTRA_TOP_DOSHAS".to_string(),
                message: format!("{top_doshas} is outside 1..=3"),
            }
            .into());
        }

        let intent_replies = std::env::var("AYURSUTRA_INTENT_REPLIES")
            .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
            .unwrap_or(defaults.intent_replies);

        Ok(Self {
            port,
            typing_delay,
            top_doshas,
            intent_replies,
        })
    }
}

/// Read and parse an environment variable; `Ok(None)` when unset.
fn parse_var<T: FromStr>(key: &str) -> Result<Option<T>> {
    match std::env::var(key) {
        Ok(raw) => raw.parse::<T>().map(Some).map_err(|_| {
            ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("cannot parse {raw:?}"),
            }
            .into()
        }),
        Err(_) => Ok(None),
    }
}
