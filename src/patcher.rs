//! Entry point tying the locator, the operations and the event bus together.

use crate::config::{ConfigError, PatchOptions, PatcherConfig};
use crate::events::{EventBus, EventKind, ListenerId, PatchEvent};
use crate::locator::FileLocator;
use crate::ops::{
    ats, config_xml, content_policy, electron_main, manifest_json, start_page, windows_appx,
    PatchError, PatchReport,
};
use crate::platform::{Platform, RootKind, UnknownPlatform, DEFAULT_PLATFORMS};
use std::fs;
use std::path::{Path, PathBuf};

/// Patches the platform trees of one project.
///
/// [`prepatch`](Self::prepatch) runs once after the platforms are prepared;
/// [`patch`](Self::patch) runs whenever the live server (re)starts and may be
/// repeated.
#[derive(Debug)]
pub struct Patcher {
    locator: FileLocator,
    template: String,
    events: EventBus,
}

impl Default for Patcher {
    fn default() -> Self {
        Self::new(".", DEFAULT_PLATFORMS)
    }
}

impl Patcher {
    pub fn new(root: impl Into<PathBuf>, platforms: impl IntoIterator<Item = Platform>) -> Self {
        let mut enabled: Vec<Platform> = Vec::new();
        for platform in platforms {
            if !enabled.contains(&platform) {
                enabled.push(platform);
            }
        }
        Self {
            locator: FileLocator::new(root, enabled),
            template: start_page::DEFAULT_TEMPLATE.to_string(),
            events: EventBus::new(),
        }
    }

    /// Build from a comma-delimited platform list such as `"android, ios"`.
    pub fn from_platform_list(root: impl Into<PathBuf>, list: &str) -> Result<Self, UnknownPlatform> {
        Ok(Self::new(root, Platform::parse_list(list)?))
    }

    /// Build from a loaded config, reading its start page template if set.
    pub fn from_config(config: &PatcherConfig) -> Result<Self, ConfigError> {
        let platforms = config
            .platforms()
            .map_err(|source| ConfigError::Validation { path: None, source })?;
        let patcher = Self::new(config.root.clone(), platforms);

        match &config.template {
            Some(path) => {
                let template = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
                Ok(patcher.with_template(template))
            }
            None => Ok(patcher),
        }
    }

    /// Replace the start page template.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    pub fn root(&self) -> &Path {
        self.locator.root()
    }

    pub fn platforms(&self) -> &[Platform] {
        self.locator.platforms()
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// `platforms/<platform>/<web dir>`, relative to the project root.
    pub fn web_root(&self, platform: Platform) -> PathBuf {
        platform.tree().join(platform.dir(RootKind::Web))
    }

    pub fn on<F>(&mut self, kind: EventKind, callback: F) -> ListenerId
    where
        F: FnMut(&PatchEvent) + 'static,
    {
        self.events.on(kind, callback)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.events.off(id)
    }

    /// Steps that do not depend on where the live server runs.
    pub fn prepatch(&self) -> Result<PatchReport, PatchError> {
        tracing::info!(root = %self.root().display(), "prepatching");
        let mut report = PatchReport::default();
        report.extend(start_page::copy_start_page(
            &self.locator,
            &self.template,
            &PatchOptions::default(),
        )?);
        report.extend(config_xml::update_config_xml(&self.locator)?);
        report.extend(manifest_json::update_manifest_json(&self.locator)?);
        report.extend(windows_appx::update_appx_manifest(&self.locator)?);
        Ok(report)
    }

    /// Steps that embed the live server's addresses.
    pub fn patch(&mut self, options: &PatchOptions) -> Result<PatchReport, PatchError> {
        tracing::info!(
            root = %self.root().display(),
            servers = options.origins().count(),
            "patching"
        );
        let mut report = PatchReport::default();
        report.extend(start_page::copy_start_page(
            &self.locator,
            &self.template,
            options,
        )?);
        report.extend(ats::fix_ats(&self.locator)?);
        report.extend(content_policy::add_csp(&self.locator, options)?);
        report.extend(electron_main::update_electron_main(
            &self.locator,
            &mut self.events,
        )?);
        Ok(report)
    }
}
