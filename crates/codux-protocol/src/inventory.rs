//! Runtime and package inventory types.

use serde::{Deserialize, Serialize};

/// A language/version the service is able to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runtime {
    /// Language name (e.g. `python`).
    pub language: String,
    /// Language version (e.g. `3.11.0`).
    pub version: String,
    /// Underlying runtime, when the language is hosted by another one
    /// (e.g. `node` for `typescript`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<String>,
    /// Alternative names accepted for `language`, in service order.
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl Runtime {
    /// Check whether `name` refers to this runtime, by language or alias.
    pub fn matches(&self, name: &str) -> bool {
        self.language == name || self.aliases.iter().any(|alias| alias == name)
    }
}

/// Installation state of one language/version pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// Language name.
    pub language: String,
    /// Language version.
    pub language_version: String,
    /// Whether the package is installed on the service.
    pub installed: bool,
}

/// Body of install and uninstall calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageSpec {
    /// Language name.
    pub language: String,
    /// Language version.
    pub version: String,
}

impl PackageSpec {
    /// Create a new package spec.
    pub fn new(language: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            version: version.into(),
        }
    }
}
