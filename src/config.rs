//! Configuration loading for Cardioid.
//!
//! Configuration is loaded from TOML files with environment variable overrides.

use crate::error::CardioidError;
use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "config.default.toml";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CardioidConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_port() -> u16 {
    8080
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost:3000".to_string(),
        "http://127.0.0.1:3000".to_string(),
    ]
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_size")]
    pub width: u32,

    #[serde(default = "default_size")]
    pub height: u32,

    #[serde(default = "default_labels")]
    pub labels: bool,

    #[serde(default = "default_background")]
    pub background: String,

    #[serde(default = "default_node_color")]
    pub node_color: String,

    #[serde(default = "default_label_color")]
    pub label_color: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: default_size(),
            height: default_size(),
            labels: default_labels(),
            background: default_background(),
            node_color: default_node_color(),
            label_color: default_label_color(),
        }
    }
}

fn default_size() -> u32 {
    800
}

fn default_labels() -> bool {
    true
}

fn default_background() -> String {
    "#ffffff".to_string()
}

fn default_node_color() -> String {
    "#1f78b4".to_string()
}

fn default_label_color() -> String {
    "#000000".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Largest modulus a request may ask for.
    #[serde(default = "default_max_modulus")]
    pub max_modulus: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_modulus: default_max_modulus(),
        }
    }
}

fn default_max_modulus() -> u64 {
    2000
}

impl LimitsConfig {
    /// Reject a modulus the core cannot draw or the operator does not allow.
    pub fn check(&self, modulus: u64) -> crate::error::Result<()> {
        if modulus == 0 {
            return Err(CardioidError::invalid("mod", modulus, "modulus must be at least 1"));
        }
        if modulus > self.max_modulus {
            return Err(CardioidError::invalid(
                "mod",
                modulus,
                format!("modulus must not exceed {}", self.max_modulus),
            ));
        }
        Ok(())
    }
}

/// The view rejected requests are redirected to.
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_modulus")]
    pub modulus: u64,

    #[serde(default = "default_multiplier")]
    pub multiplier: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            modulus: default_modulus(),
            multiplier: default_multiplier(),
        }
    }
}

fn default_modulus() -> u64 {
    200
}

fn default_multiplier() -> u64 {
    2
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_directory")]
    pub directory: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
        }
    }
}

fn default_directory() -> String {
    "output".to_string()
}

impl CardioidConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false))
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("CARDIOID").separator("__"))
            .build()?;

        let cardioid_config: CardioidConfig = config.try_deserialize()?;
        cardioid_config.validate()?;
        Ok(cardioid_config)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.render.width > 0 && self.render.height > 0,
            "render size must be non-zero, got {}x{}",
            self.render.width,
            self.render.height
        );
        anyhow::ensure!(
            self.limits.max_modulus >= 1,
            "limits.max_modulus must be at least 1"
        );
        anyhow::ensure!(
            (1..=self.limits.max_modulus).contains(&self.defaults.modulus),
            "defaults.modulus {} is outside 1..={}",
            self.defaults.modulus,
            self.limits.max_modulus
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn missing_file_yields_defaults() {
        let config = CardioidConfig::load(Path::new("does-not-exist.toml")).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.limits.max_modulus, 2000);
        assert_eq!(config.defaults.modulus, 200);
        assert!(config.render.labels);
    }

    #[test]
    fn file_values_override_defaults() {
        let path = std::env::temp_dir().join(format!("cardioid-config-{}.toml", std::process::id()));
        fs::write(
            &path,
            "[server]\nport = 9000\n\n[render]\nwidth = 640\nlabels = false\n\n[defaults]\nmodulus = 50\n",
        )
        .unwrap();

        let config = CardioidConfig::load(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.render.width, 640);
        assert_eq!(config.render.height, 800);
        assert!(!config.render.labels);
        assert_eq!(config.defaults.modulus, 50);
    }

    #[test]
    fn limits_bound_the_modulus() {
        let limits = LimitsConfig { max_modulus: 100 };
        assert!(limits.check(1).is_ok());
        assert!(limits.check(100).is_ok());
        assert!(limits.check(0).unwrap_err().is_invalid_parameter());
        assert!(limits.check(101).unwrap_err().is_invalid_parameter());
        assert!(limits.check(u64::MAX).unwrap_err().is_invalid_parameter());
    }

    #[test]
    fn wildcard_cors_origin_loads() {
        let path = std::env::temp_dir().join(format!("cardioid-cors-{}.toml", std::process::id()));
        fs::write(&path, "[server]\ncors_origins = [\"*\"]\n").unwrap();

        let config = CardioidConfig::load(&path);
        fs::remove_file(&path).ok();

        let config = config.unwrap();
        assert_eq!(config.server.cors_origins, vec!["*".to_string()]);
        crate::server::create_cors_layer(&config.server);
    }

    #[test]
    fn default_view_outside_limit_is_rejected() {
        let path = std::env::temp_dir().join(format!("cardioid-limits-{}.toml", std::process::id()));
        fs::write(&path, "[limits]\nmax_modulus = 10\n").unwrap();

        let result = CardioidConfig::load(&path);
        fs::remove_file(&path).ok();

        assert!(result.is_err());
    }
}
