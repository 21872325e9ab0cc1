//! Platform identifiers and their fixed directory layout.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// File name of the generated start page, identical on every platform so that
/// manifests can reference it unconditionally.
pub const START_PAGE: &str = "browser-sync-start.html";

/// Platforms enabled when the caller does not choose any.
pub const DEFAULT_PLATFORMS: [Platform; 4] = [
    Platform::Android,
    Platform::Ios,
    Platform::Windows,
    Platform::Electron,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
    Browser,
    Windows,
    Electron,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown platform '{0}' (expected one of: android, ios, browser, windows, electron)")]
pub struct UnknownPlatform(pub String);

/// Which of the two registry roots a pattern is resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    /// Directory holding the bundled web assets
    Web,
    /// Directory holding platform configuration files
    Config,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Android,
        Platform::Ios,
        Platform::Browser,
        Platform::Windows,
        Platform::Electron,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Android => "android",
            Platform::Ios => "ios",
            Platform::Browser => "browser",
            Platform::Windows => "windows",
            Platform::Electron => "electron",
        }
    }

    /// Web-asset directory, relative to `platforms/<platform>`.
    pub fn www_dir(self) -> &'static str {
        match self {
            Platform::Android => "app/src/main/assets/www",
            Platform::Ios | Platform::Browser | Platform::Windows | Platform::Electron => "www",
        }
    }

    /// Configuration directory, relative to `platforms/<platform>`.
    pub fn config_dir(self) -> &'static str {
        match self {
            Platform::Android => "app/src/main/res/xml",
            Platform::Ios | Platform::Browser | Platform::Windows | Platform::Electron => ".",
        }
    }

    pub fn dir(self, kind: RootKind) -> &'static str {
        match kind {
            RootKind::Web => self.www_dir(),
            RootKind::Config => self.config_dir(),
        }
    }

    /// `platforms/<platform>`, relative to the project root.
    pub fn tree(self) -> PathBuf {
        PathBuf::from("platforms").join(self.as_str())
    }

    /// Parse a comma-delimited list such as `"android, ios"`.
    ///
    /// Blank entries are ignored.
    pub fn parse_list(list: &str) -> Result<Vec<Platform>, UnknownPlatform> {
        list.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse)
            .collect()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Platform::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPlatform(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_names() {
        for platform in Platform::ALL {
            assert_eq!(platform.as_str().parse::<Platform>().unwrap(), platform);
        }
    }

    #[test]
    fn test_unknown_platform() {
        let err = "blackberry".parse::<Platform>().unwrap_err();
        assert_eq!(err, UnknownPlatform("blackberry".to_string()));
        assert!(err.to_string().contains("blackberry"));
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            Platform::parse_list("android, ios,,electron").unwrap(),
            vec![Platform::Android, Platform::Ios, Platform::Electron]
        );
        assert!(Platform::parse_list("android,wp8").is_err());
    }

    #[test]
    fn test_android_layout() {
        assert_eq!(Platform::Android.www_dir(), "app/src/main/assets/www");
        assert_eq!(Platform::Android.config_dir(), "app/src/main/res/xml");
        assert_eq!(Platform::Ios.dir(RootKind::Config), ".");
        assert_eq!(Platform::Electron.dir(RootKind::Web), "www");
    }
}
