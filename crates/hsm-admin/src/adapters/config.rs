//! TOML configuration.
//!
//! ```toml
//! [signing]
//! digest = "sha512"
//! service_url = "https://signer.example:9443"
//!
//! [logging]
//! level = "info"
//! json = false
//!
//! [quorum]
//! signature_threshold = 2
//! revocation_threshold = 2
//!
//! [[administrators]]
//! name = "admin1"
//! key = "/keys/admin1.json"
//! ski = "9c0f..."
//!
//! [[domains]]
//! hsm_id = "5e2b..."
//! crypto_module_index = 1
//! domain_index = 9
//! ```
//!
//! Credentials are never read from the file.

use crate::adapters::digest::DigestAlgorithm;
use crate::adapters::directory::StaticDomainDirectory;
use crate::domain::entities::{Credential, DomainEntry, SignatureKeyReference, Ski};
use crate::domain::value_objects::DomainAttributes;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during config loading.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// File I/O error.
    #[error("cannot read {path}: {error}")]
    Io { path: String, error: String },

    /// TOML syntax or type error.
    #[error("config parse error: {0}")]
    Parse(String),

    /// Well-formed but unusable value.
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    pub digest: DigestAlgorithm,
    /// Base URL of a remote signing service, if one is used.
    pub service_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Quorum policy an operator intends to set on a domain.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct QuorumConfig {
    pub signature_threshold: u32,
    pub revocation_threshold: u32,
    pub permissions: u32,
    pub operational_mode: u32,
}

impl Default for QuorumConfig {
    fn default() -> Self {
        Self {
            signature_threshold: 1,
            revocation_threshold: 1,
            permissions: 0,
            operational_mode: 0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AdministratorConfig {
    pub name: String,
    /// Key file path or signing-service key name.
    pub key: String,
    /// Hex SKI.
    pub ski: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub signing: SigningConfig,
    pub logging: LoggingConfig,
    pub quorum: QuorumConfig,
    pub administrators: Vec<AdministratorConfig>,
    pub domains: Vec<DomainEntry>,
}

impl AdminConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: AdminConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for admin in &self.administrators {
            Ski::from_hex(&admin.ski)
                .map_err(|e| ConfigError::Invalid(format!("administrator {}: {}", admin.name, e)))?;
        }
        if self.quorum.signature_threshold == 0 || self.quorum.revocation_threshold == 0 {
            return Err(ConfigError::Invalid(
                "quorum thresholds must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Attributes implied by the `[quorum]` section.
    pub fn domain_attributes(&self) -> DomainAttributes {
        DomainAttributes {
            signature_threshold: self.quorum.signature_threshold,
            revocation_signature_threshold: self.quorum.revocation_threshold,
            permissions: self.quorum.permissions,
            operational_mode: self.quorum.operational_mode,
        }
    }

    /// Signature key references for the named administrators, in the order
    /// given, with credentials supplied by `credential_for`.
    pub fn signers<F>(&self, names: &[&str], credential_for: F) -> Result<Vec<SignatureKeyReference>, ConfigError>
    where
        F: Fn(&AdministratorConfig) -> Option<Credential>,
    {
        names
            .iter()
            .map(|name| {
                let admin = self
                    .administrators
                    .iter()
                    .find(|a| a.name == *name)
                    .ok_or_else(|| ConfigError::Invalid(format!("unknown administrator {}", name)))?;
                let credential = credential_for(admin)
                    .ok_or_else(|| ConfigError::Invalid(format!("no credential for administrator {}", name)))?;
                let ski = Ski::from_hex(&admin.ski).map_err(|e| ConfigError::Invalid(e.to_string()))?;
                Ok(SignatureKeyReference::new(admin.key.clone(), ski, credential))
            })
            .collect()
    }

    /// Directory over the configured `[[domains]]`.
    pub fn directory(&self) -> StaticDomainDirectory {
        StaticDomainDirectory::new(self.domains.clone())
    }
}
