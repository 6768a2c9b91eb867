//! Writer configuration: wire format selection, service base URI, output
//! indentation and plural-tolerant name matching.
//!
//! Configuration is loaded once by the host (usually from TOML) and handed
//! to the writer by reference; nothing here changes during a write.

use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, fs, path::Path};
use thiserror::Error as ThisError;
use url::Url;

/// Base URI used when a configuration does not name one.
pub const DEFAULT_BASE_URI: &str = "http://localhost/";

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("invalid base uri '{uri}': {reason}")]
    InvalidBaseUri { uri: String, reason: String },

    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

///
/// PayloadFormat
///
/// Wire backend used for request bodies.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    Atom,
    #[default]
    Json,
}

impl PayloadFormat {
    /// `Content-Type` header value for bodies in this format.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Atom => "application/atom+xml",
            Self::Json => "application/json;odata.metadata=minimal",
        }
    }

    /// `Content-Type` for action/function parameter bodies and bare links.
    #[must_use]
    pub const fn parameters_content_type(self) -> &'static str {
        match self {
            Self::Atom => "application/xml",
            Self::Json => "application/json;odata.metadata=minimal",
        }
    }
}

impl fmt::Display for PayloadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Atom => "atom",
            Self::Json => "json",
        };
        write!(f, "{label}")
    }
}

///
/// BaseUri
///
/// Absolute http(s) service root, always ending in `/` so relative
/// resource paths join under it rather than replacing its last segment.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BaseUri(Url);

impl BaseUri {
    pub fn parse(input: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidBaseUri {
            uri: input.to_string(),
            reason,
        };

        let mut url = Url::parse(input).map_err(|err| invalid(err.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        if url.cannot_be_a_base() {
            return Err(invalid("not a base uri".to_string()));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("query and fragment are not allowed".to_string()));
        }

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self(url))
    }

    #[must_use]
    pub const fn as_url(&self) -> &Url {
        &self.0
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Resolve a service-relative path (or keep an already absolute one).
    pub fn join(&self, relative: &str) -> Result<Url, url::ParseError> {
        self.0.join(relative)
    }
}

impl Default for BaseUri {
    fn default() -> Self {
        // DEFAULT_BASE_URI is a valid absolute http uri
        Self::parse(DEFAULT_BASE_URI).unwrap_or_else(|_| unreachable!())
    }
}

impl fmt::Display for BaseUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for BaseUri {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;

        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

///
/// WriterConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WriterConfig {
    pub base_uri: BaseUri,
    pub payload_format: PayloadFormat,
    pub indent: bool,
    pub pluralize_names: bool,
}

impl WriterConfig {
    #[must_use]
    pub fn new(base_uri: BaseUri) -> Self {
        Self {
            base_uri,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_payload_format(mut self, format: PayloadFormat) -> Self {
        self.payload_format = format;
        self
    }

    #[must_use]
    pub const fn with_indent(mut self, indent: bool) -> Self {
        self.indent = indent;
        self
    }

    #[must_use]
    pub const fn with_pluralize_names(mut self, pluralize: bool) -> Self {
        self.pluralize_names = pluralize;
        self
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&source)
    }
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            base_uri: BaseUri::default(),
            payload_format: PayloadFormat::Json,
            indent: false,
            pluralize_names: true,
        }
    }
}

///
/// TESTS
///
