use crate::platform::{Platform, DEFAULT_PLATFORMS};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Server name -> origin of the live asset server.
///
/// `None` marks a server that is explicitly absent, which is not the same as
/// an empty origin.
pub type ServerMap = IndexMap<String, Option<String>>;

pub const DEFAULT_INDEX: &str = "index.html";

fn default_index() -> String {
    DEFAULT_INDEX.to_string()
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

/// Per-invocation options for [`Patcher::patch`](crate::Patcher::patch).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatchOptions {
    #[serde(default)]
    pub servers: ServerMap,
    /// Entry point of the real application, relative to each platform's `www`
    #[serde(default = "default_index")]
    pub index: String,
    #[serde(default)]
    pub force_load: bool,
}

impl Default for PatchOptions {
    fn default() -> Self {
        Self {
            servers: ServerMap::new(),
            index: default_index(),
            force_load: false,
        }
    }
}

impl PatchOptions {
    pub fn with_server(mut self, name: impl Into<String>, origin: impl Into<String>) -> Self {
        self.servers.insert(name.into(), Some(origin.into()));
        self
    }

    pub fn without_server(mut self, name: impl Into<String>) -> Self {
        self.servers.insert(name.into(), None);
        self
    }

    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    pub fn with_force_load(mut self, force_load: bool) -> Self {
        self.force_load = force_load;
        self
    }

    /// Origins that are actually set, in insertion order.
    pub fn origins(&self) -> impl Iterator<Item = (&str, &str)> {
        self.servers
            .iter()
            .filter_map(|(name, origin)| origin.as_deref().map(|o| (name.as_str(), o)))
    }
}

/// Platforms given either as a list or as one comma-delimited string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PlatformList {
    List(Vec<String>),
    Delimited(String),
}

impl PlatformList {
    fn names(&self) -> Vec<&str> {
        match self {
            PlatformList::List(names) => names.iter().map(|n| n.trim()).collect(),
            PlatformList::Delimited(list) => list
                .split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }
}

/// Contents of a `livesync.toml` file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatcherConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default)]
    pub platforms: Option<PlatformList>,
    /// Replacement for the built-in start page template
    #[serde(default)]
    pub template: Option<PathBuf>,
    #[serde(default)]
    pub patch: PatchOptions,
}

impl Default for PatcherConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            platforms: None,
            template: None,
            patch: PatchOptions::default(),
        }
    }
}

impl PatcherConfig {
    /// Resolved platform list; the defaults when none are configured.
    pub fn platforms(&self) -> Result<Vec<Platform>, ValidationError> {
        let Some(list) = &self.platforms else {
            return Ok(DEFAULT_PLATFORMS.to_vec());
        };

        let mut platforms = Vec::new();
        let mut issues = Vec::new();
        for name in list.names() {
            match name.parse::<Platform>() {
                Ok(platform) if !platforms.contains(&platform) => platforms.push(platform),
                Ok(_) => {}
                Err(_) => issues.push(ValidationIssue::UnknownPlatform {
                    name: name.to_string(),
                }),
            }
        }
        if issues.is_empty() {
            Ok(platforms)
        } else {
            Err(ValidationError { issues })
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = match self.platforms() {
            Ok(platforms) if platforms.is_empty() => vec![ValidationIssue::EmptyPlatformList],
            Ok(_) => Vec::new(),
            Err(err) => err.issues,
        };

        if self.patch.index.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "patch.index",
            });
        }
        for (name, origin) in &self.patch.servers {
            if name.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    field: "patch.servers key",
                });
            }
            if let Some(origin) = origin {
                if origin.contains(char::is_whitespace) || origin.contains(';') {
                    issues.push(ValidationIssue::InvalidOrigin {
                        server: name.clone(),
                        origin: origin.clone(),
                    });
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyPlatformList,
    UnknownPlatform { name: String },
    MissingField { field: &'static str },
    InvalidOrigin { server: String, origin: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyPlatformList => write!(f, "no platforms enabled"),
            ValidationIssue::UnknownPlatform { name } => write!(f, "unknown platform '{name}'"),
            ValidationIssue::MissingField { field } => {
                write!(f, "missing required field '{field}'")
            }
            ValidationIssue::InvalidOrigin { server, origin } => {
                write!(f, "server '{server}' has an invalid origin '{origin}'")
            }
        }
    }
}
