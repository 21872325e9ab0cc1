//! Redirect the desktop shell's bootstrap script to the start page.

use super::{pattern, rewrite_document, Operation, PatchError, PatchOutcome};
use crate::edit::Edit;
use crate::events::{EventBus, PatchEvent};
use crate::format::TextFormat;
use crate::locator::{FileLocator, PatchTarget};
use crate::platform::{Platform, RootKind};
use std::path::Component;

pub const SOURCE_LINE: &str = "mainWindow.loadURL(`file://${__dirname}/index.html`);";
pub const TARGET_LINE: &str = "mainWindow.loadURL(`file://${__dirname}/browser-sync-start.html`);";

/// Template copy of the script that the platform tooling regenerates from.
const PLATFORM_WWW: &str = "platform_www";

/// Rewrite each `cdv-electron-main.js`, then announce that the electron
/// platform no longer needs handling. The event fires once per processed
/// file whether or not its text matched.
pub fn update_electron_main(
    locator: &FileLocator,
    events: &mut EventBus,
) -> Result<Vec<PatchOutcome>, PatchError> {
    let mut outcomes = Vec::new();
    for target in locator.find(&pattern("**/cdv-electron-main.js")?, RootKind::Config)? {
        if in_platform_www(locator, &target) {
            tracing::debug!(path = %target.path.display(), "skipping template copy");
            continue;
        }

        let written = rewrite_document::<TextFormat, _>(&target.path, |code| {
            match Edit::replace_first(&target.path, code, SOURCE_LINE, TARGET_LINE) {
                Some(edit) => *code = edit.splice(code)?,
                None => tracing::debug!(path = %target.path.display(), "loadURL line not found"),
            }
            Ok(())
        })?;
        outcomes.push(PatchOutcome::written(Operation::ElectronMain, &target, written));
        events.emit(&PatchEvent::PlatformDisabled(Platform::Electron));
    }
    Ok(outcomes)
}

fn in_platform_www(locator: &FileLocator, target: &PatchTarget) -> bool {
    let base = locator.base_dir(target.platform, RootKind::Config);
    // Located paths are canonical
    let base = base.canonicalize().unwrap_or(base);
    let relative = target.path.strip_prefix(&base).unwrap_or(&target.path);
    relative
        .components()
        .any(|c| matches!(c, Component::Normal(name) if name == PLATFORM_WWW))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::ops::PatchStatus;
    use std::cell::Cell;
    use std::fs;
    use std::rc::Rc;

    fn electron_project(script: &str) -> (tempfile::TempDir, FileLocator) {
        let dir = tempfile::tempdir().unwrap();
        let tree = dir.path().join("platforms/electron");
        fs::create_dir_all(tree.join("platform_www")).unwrap();
        fs::write(tree.join("cdv-electron-main.js"), script).unwrap();
        fs::write(tree.join("platform_www/cdv-electron-main.js"), script).unwrap();
        let locator = FileLocator::new(dir.path(), vec![Platform::Electron]);
        (dir, locator)
    }

    fn counting_bus() -> (EventBus, Rc<Cell<usize>>) {
        let fired = Rc::new(Cell::new(0));
        let mut events = EventBus::new();
        let counter = Rc::clone(&fired);
        events.on(EventKind::PlatformDisabled, move |event| {
            assert_eq!(event, &PatchEvent::PlatformDisabled(Platform::Electron));
            counter.set(counter.get() + 1);
        });
        (events, fired)
    }

    #[test]
    fn test_load_url_is_redirected() {
        let script = format!("function createWindow() {{\n    {SOURCE_LINE}\n}}\n");
        let (dir, locator) = electron_project(&script);
        let (mut events, fired) = counting_bus();

        let outcomes = update_electron_main(&locator, &mut events).unwrap();

        assert_eq!(outcomes.len(), 1);
        assert_eq!(fired.get(), 1);
        let tree = dir.path().join("platforms/electron");
        assert_eq!(
            fs::read_to_string(tree.join("cdv-electron-main.js")).unwrap(),
            format!("function createWindow() {{\n    {TARGET_LINE}\n}}\n")
        );
        // Template copy untouched
        assert_eq!(
            fs::read_to_string(tree.join("platform_www/cdv-electron-main.js")).unwrap(),
            script
        );
    }

    #[test]
    fn test_unmatched_script_is_byte_identical_and_event_fires() {
        let script = "mainWindow.loadURL('http://example.com');\n";
        let (dir, locator) = electron_project(script);
        let (mut events, fired) = counting_bus();

        let outcomes = update_electron_main(&locator, &mut events).unwrap();

        assert_eq!(outcomes[0].status, PatchStatus::Unchanged);
        assert_eq!(fired.get(), 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("platforms/electron/cdv-electron-main.js")).unwrap(),
            script
        );
    }
}
