use crate::domain::anomaly::Thresholds;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub telemetry: TelemetrySettings,
    pub publisher: PublisherSettings,
    #[serde(default)]
    pub thresholds: Thresholds,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: IpAddr,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetrySettings {
    pub history_capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PublisherSettings {
    pub enabled: bool,
    pub path: PathBuf,
}

impl ServerSettings {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn builder() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    let defaults = Thresholds::default();
    Ok(config::Config::builder()
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8765)?
        .set_default("telemetry.history_capacity", 300)?
        .set_default("publisher.enabled", true)?
        .set_default("publisher.path", "fusion_data.json")?
        .set_default("thresholds.max_plasma_temp_k", defaults.max_plasma_temp_k)?
        .set_default("thresholds.max_case_temp_k", defaults.max_case_temp_k)?
        .set_default("thresholds.max_rpm", defaults.max_rpm)?
        .set_default("thresholds.min_fuel_percentage", defaults.min_fuel_percentage)?
        .set_default("thresholds.max_temp_gradient_k", defaults.max_temp_gradient_k)?)
}

/// Defaults, then `config/server.*` if present, then `FUSION__*` variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = builder()?
        .add_source(config::File::with_name("config/server").required(false))
        .add_source(
            config::Environment::with_prefix("FUSION")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_setting() {
        let config: AppConfig = builder()
            .expect("defaults")
            .build()
            .expect("build")
            .try_deserialize()
            .expect("deserialize");

        assert_eq!(config.server.socket_addr().to_string(), "0.0.0.0:8765");
        assert_eq!(config.telemetry.history_capacity, 300);
        assert!(config.publisher.enabled);
        assert_eq!(config.publisher.path, PathBuf::from("fusion_data.json"));
        assert_eq!(config.thresholds, Thresholds::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let config: AppConfig = builder()
            .expect("defaults")
            .add_source(config::File::from_str(
                r#"
                [server]
                port = 9000

                [telemetry]
                history_capacity = 100

                [thresholds]
                max_rpm = 4000.0
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .expect("build")
            .try_deserialize()
            .expect("deserialize");

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.telemetry.history_capacity, 100);
        assert_eq!(config.thresholds.max_rpm, 4000.0);
        assert_eq!(config.thresholds.max_case_temp_k, 1500.0);
    }
}
