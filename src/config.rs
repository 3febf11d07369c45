use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub tls: TlsConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    /// Transaction history JSON file.
    pub history_file: String,
    /// Persisted user registry JSON file.
    pub users_file: String,
    /// Per-call deadline for outbound bank RPCs, in seconds.
    pub bank_call_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 50051,
            history_file: "./transaction_history.json".to_string(),
            users_file: "./users.json".to_string(),
            bank_call_timeout_secs: 5,
        }
    }
}

/// TLS material locations. Certificates are provisioned externally; all
/// three parties expect a shared CA under the same directory.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TlsConfig {
    pub cert_dir: String,
}

impl Default for TlsConfig {
    fn default() -> Self {
        Self {
            cert_dir: "./certs".to_string(),
        }
    }
}

impl TlsConfig {
    pub fn ca_cert(&self) -> PathBuf {
        Path::new(&self.cert_dir).join("ca.crt")
    }

    pub fn server_cert(&self) -> PathBuf {
        Path::new(&self.cert_dir).join("server.crt")
    }

    pub fn server_key(&self) -> PathBuf {
        Path::new(&self.cert_dir).join("server.key")
    }

    pub fn client_cert(&self) -> PathBuf {
        Path::new(&self.cert_dir).join("client.crt")
    }

    pub fn client_key(&self) -> PathBuf {
        Path::new(&self.cert_dir).join("client.key")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: "./logs".to_string(),
            log_file: "gateway.log".to_string(),
            use_json: false,
            rotation: "daily".to_string(),
            gateway: GatewayConfig::default(),
            tls: TlsConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load config from a YAML file, falling back to defaults when the file
    /// does not exist. Environment variables override file values.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&content).context("Failed to parse config yaml")?
        } else {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides.
    ///
    /// Format: `PAYRAIL_<SECTION>_<FIELD>`, taking precedence over the file:
    /// - PAYRAIL_GATEWAY_HOST
    /// - PAYRAIL_GATEWAY_PORT
    /// - PAYRAIL_LOG_LEVEL
    /// - PAYRAIL_CERT_DIR
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("PAYRAIL_GATEWAY_HOST") {
            self.gateway.host = host;
        }
        if let Ok(port) = std::env::var("PAYRAIL_GATEWAY_PORT") {
            if let Ok(p) = port.parse::<u16>() {
                self.gateway.port = p;
            }
        }
        if let Ok(level) = std::env::var("PAYRAIL_LOG_LEVEL") {
            self.log_level = level;
        }
        if let Ok(dir) = std::env::var("PAYRAIL_CERT_DIR") {
            self.tls.cert_dir = dir;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.gateway.port == 0 {
            bail!("gateway.port must be non-zero");
        }
        match self.rotation.as_str() {
            "never" | "hourly" | "daily" => {}
            other => bail!("unknown log rotation: {other} (use never|hourly|daily)"),
        }
        if self.gateway.bank_call_timeout_secs == 0 {
            bail!("gateway.bank_call_timeout_secs must be non-zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_bad_rotation() {
        let mut config = AppConfig::default();
        config.rotation = "weekly".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_yaml_sections() {
        let yaml = r#"
log_level: debug
log_dir: /tmp/logs
log_file: gw.log
use_json: true
rotation: hourly
gateway:
  host: 127.0.0.1
  port: 6001
  history_file: /tmp/history.json
  users_file: /tmp/users.json
  bank_call_timeout_secs: 3
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.gateway.port, 6001);
        assert_eq!(config.gateway.bank_call_timeout_secs, 3);
        // tls section is optional
        assert_eq!(config.tls.cert_dir, "./certs");
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = AppConfig::load(Path::new("/definitely/not/here.yaml")).unwrap();
        assert_eq!(config.gateway.port, 50051);
    }
}
