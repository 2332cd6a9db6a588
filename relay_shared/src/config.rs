//! Configuration system.
//!
//! Loads relay configuration from JSON strings/files (file IO left to app).

use serde::{Deserialize, Serialize};

/// Root configuration shared by client/server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Server listen address, e.g. `127.0.0.1:3001`.
    pub server_addr: String,
    /// Player name (client only, for logging).
    #[serde(default = "default_player_name")]
    pub player_name: String,
}

fn default_player_name() -> String {
    "Player".to_string()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:3001".to_string(),
            player_name: default_player_name(),
        }
    }
}

impl RelayConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let cfg = RelayConfig::from_json_str(r#"{"server_addr":"0.0.0.0:4000"}"#).unwrap();
        assert_eq!(cfg.server_addr, "0.0.0.0:4000");
        assert_eq!(cfg.player_name, "Player");
    }
}
