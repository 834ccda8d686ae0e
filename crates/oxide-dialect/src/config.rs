//! Dialect configuration.
//!
//! A [`DialectConfig`] is fixed when a [`Dialect`](crate::dialect::Dialect)
//! is constructed. Capability flags that depend on the server version are
//! resolved once from it and never change afterwards.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DialectError, Result};

/// Options applied to a dialect instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DialectConfig {
    /// Schema used when a table name is not qualified.
    pub default_schema: Option<String>,
    /// Keep the declared casing of identifiers that collide with keywords
    /// when they are quoted. When `false` they are folded to the dialect's
    /// proper case first.
    pub preserve_keyword_casing: bool,
    /// Overrides the dialect's maximum identifier length.
    pub identifier_length_limit: Option<usize>,
    /// Render arguments as placeholders (`true`) or as inline literals.
    pub prepared: bool,
    /// Server version, used to gate version-dependent syntax.
    pub version: Option<DatabaseVersion>,
}

impl Default for DialectConfig {
    fn default() -> Self {
        Self {
            default_schema: None,
            preserve_keyword_casing: true,
            identifier_length_limit: None,
            prepared: true,
            version: None,
        }
    }
}

impl DialectConfig {
    /// Parses a configuration from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`DialectError::Serialization`] if the document is malformed.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns an IO or serialization error.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Returns a copy with inline literal rendering.
    #[must_use]
    pub fn inline(mut self) -> Self {
        self.prepared = false;
        self
    }

    /// Returns a copy with the given server version.
    #[must_use]
    pub fn with_version(mut self, version: DatabaseVersion) -> Self {
        self.version = Some(version);
        self
    }

    /// Returns true if the configured version is known and at least the given one.
    /// An unknown version is treated as the latest release.
    #[must_use]
    pub fn version_at_least(&self, major: u32, minor: u32, patch: u32) -> bool {
        self.version
            .map_or(true, |v| v >= DatabaseVersion::new(major, minor, patch))
    }
}

/// A `major.minor.patch` server version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DatabaseVersion {
    /// Major version.
    pub major: u32,
    /// Minor version.
    pub minor: u32,
    /// Patch version.
    pub patch: u32,
}

impl DatabaseVersion {
    /// Creates a version.
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for DatabaseVersion {
    type Err = DialectError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.trim().splitn(3, '.');
        let mut next = |required: bool| -> Result<u32> {
            match parts.next() {
                Some(p) => {
                    // Tolerate vendor suffixes such as "8.0.36-log".
                    let digits: String = p.chars().take_while(char::is_ascii_digit).collect();
                    digits
                        .parse()
                        .map_err(|_| DialectError::invalid(format!("invalid version '{s}'")))
                }
                None if required => Err(DialectError::invalid(format!("invalid version '{s}'"))),
                None => Ok(0),
            }
        };
        let major = next(true)?;
        let minor = next(false)?;
        let patch = next(false)?;
        Ok(Self::new(major, minor, patch))
    }
}

impl TryFrom<String> for DatabaseVersion {
    type Error = DialectError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DatabaseVersion> for String {
    fn from(value: DatabaseVersion) -> Self {
        value.to_string()
    }
}

impl fmt::Display for DatabaseVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
