//! Loading of [`ServiceConfig`].
//!
//! Sources, later ones winning:
//!
//! 1. Built-in defaults (`https`, certificate validation on).
//! 2. The TOML file named by `--config` (default `athena.toml`), if it exists.
//! 3. `ATHENA_*` environment variables (`ATHENA_ADDRESS`, `ATHENA_PORT`,
//!    `ATHENA_USER`, `ATHENA_PASSWORD`, `ATHENA_SCHEME`, `ATHENA_VERIFY_SSL`).

use std::path::Path;

use anyhow::Context;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use ipam::ServiceConfig;

/// Prefix of every configuration environment variable.
pub const ENV_PREFIX: &str = "ATHENA_";

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "athena.toml";

pub fn figment(path: &Path) -> Figment {
    Figment::from(Serialized::defaults(ServiceConfig::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX))
}

/// Extracts and validates the configuration.
pub fn load(path: &Path) -> anyhow::Result<ServiceConfig> {
    let config: ServiceConfig = figment(path)
        .extract()
        .with_context(|| format!("failed to read configuration from {}", path.display()))?;
    config.validate().context("invalid configuration")?;
    Ok(config)
}
