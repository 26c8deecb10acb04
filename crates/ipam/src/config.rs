//! Connection settings for one Athena service.
//!
//! [`ServiceConfig`] is constructed once (by the composition root, from file
//! and environment) and then passed by reference into every operation. It is
//! never mutated and never stored in a global.

use serde::{Deserialize, Serialize};

use crate::IpamError;

/// Scheme used when none is configured.
pub const DEFAULT_SCHEME: &str = "https";

/// A credential that must never appear in logs.
///
/// `Debug` and `Display` print a fixed placeholder; the value is only
/// reachable through [`Password::expose`].
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    /// Wraps a plain-text password.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the plain-text password for use in an authorization header.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns `true` if no password was configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

impl std::fmt::Display for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("***")
    }
}

/// Address, credentials, and TLS behaviour of an Athena endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// `http` or `https`.
    pub scheme: String,

    /// Host name or IP address of the service.
    pub address: String,

    /// TCP port of the service.
    pub port: u16,

    /// User for HTTP basic authentication.
    pub user: String,

    /// Password for HTTP basic authentication.
    pub password: Password,

    /// Whether server certificates are validated.
    ///
    /// Turning this off accepts any certificate, including self-signed ones.
    pub verify_ssl: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            address: String::new(),
            port: 0,
            user: String::new(),
            password: Password::default(),
            verify_ssl: true,
        }
    }
}

impl ServiceConfig {
    /// Creates a configuration with the default scheme and certificate validation on.
    pub fn new(
        address: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            port,
            user: user.into(),
            password: Password::new(password),
            ..Self::default()
        }
    }

    /// Overrides the scheme.
    pub fn with_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    /// Overrides certificate validation.
    pub fn with_verify_ssl(mut self, verify_ssl: bool) -> Self {
        self.verify_ssl = verify_ssl;
        self
    }

    /// Checks that every required value is present and well-formed.
    pub fn validate(&self) -> Result<(), IpamError> {
        if self.scheme != "http" && self.scheme != "https" {
            return Err(IpamError::Configuration {
                message: format!("scheme must be 'http' or 'https', got '{}'", self.scheme),
            });
        }
        let required = [
            ("address", self.address.is_empty()),
            ("user", self.user.is_empty()),
            ("password", self.password.is_empty()),
        ];
        if let Some((name, _)) = required.iter().find(|(_, missing)| *missing) {
            return Err(IpamError::Configuration {
                message: format!("'{name}' is required"),
            });
        }
        if self.port == 0 {
            return Err(IpamError::Configuration {
                message: "'port' is required".to_string(),
            });
        }
        Ok(())
    }

    /// `host:port` as sent in the `Host` header.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}
