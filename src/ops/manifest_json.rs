use super::{pattern, rewrite_document, Operation, PatchError, PatchOutcome};
use crate::format::{Format, FormatError, JsonFormat};
use crate::locator::FileLocator;
use crate::platform::{RootKind, START_PAGE};
use serde_json::Value;

/// Set `start_url` in every web app manifest to the start page.
pub fn update_manifest_json(locator: &FileLocator) -> Result<Vec<PatchOutcome>, PatchError> {
    let mut outcomes = Vec::new();
    for target in locator.find(&pattern("**/manifest.json")?, RootKind::Config)? {
        let written = rewrite_document::<JsonFormat, _>(&target.path, |manifest| {
            set_start_url(manifest).map_err(|source| PatchError::Format {
                path: target.path.clone(),
                source,
            })
        })?;
        outcomes.push(PatchOutcome::written(Operation::ManifestJson, &target, written));
    }
    Ok(outcomes)
}

pub fn set_start_url(manifest: &mut Value) -> Result<(), FormatError> {
    let object = manifest
        .as_object_mut()
        .ok_or_else(|| FormatError::UnexpectedShape {
            format: JsonFormat::NAME,
            message: "manifest is not a JSON object".to_string(),
        })?;
    object.insert("start_url".to_string(), Value::String(START_PAGE.to_string()));
    Ok(())
}
