//! App Transport Security relaxation for `*Info.plist`.
//!
//! The one operation with per-file fault isolation: a broken or foreign
//! property list is logged and the rest of the batch still gets patched.

use super::{pattern, rewrite_document, Operation, PatchError, PatchOutcome, PatchStatus};
use crate::format::{FormatError, PlistFormat};
use crate::locator::FileLocator;
use crate::platform::RootKind;
use plist::{Dictionary, Value};

pub const ATS_KEY: &str = "NSAppTransportSecurity";
pub const ARBITRARY_LOADS_KEY: &str = "NSAllowsArbitraryLoads";

pub fn fix_ats(locator: &FileLocator) -> Result<Vec<PatchOutcome>, PatchError> {
    let mut outcomes = Vec::new();
    for target in locator.find(&pattern("**/*Info.plist")?, RootKind::Config)? {
        let result = rewrite_document::<PlistFormat, _>(&target.path, |plist| {
            allow_arbitrary_loads(plist).map_err(|source| PatchError::Format {
                path: target.path.clone(),
                source,
            })
        });

        let outcome = match result {
            Ok(written) => PatchOutcome::written(Operation::TransportSecurity, &target, written),
            Err(err) => {
                tracing::error!(path = %target.path.display(), "error when patching property list: {err}");
                PatchOutcome::new(
                    Operation::TransportSecurity,
                    &target,
                    PatchStatus::Failed {
                        reason: err.to_string(),
                    },
                )
            }
        };
        outcomes.push(outcome);
    }
    Ok(outcomes)
}

/// Replace the ATS dictionary with one allowing plain-HTTP loads.
pub fn allow_arbitrary_loads(plist: &mut Value) -> Result<(), FormatError> {
    let root = plist
        .as_dictionary_mut()
        .ok_or_else(|| FormatError::UnexpectedShape {
            format: "property list",
            message: "top-level value is not a dictionary".to_string(),
        })?;

    let mut ats = Dictionary::new();
    ats.insert(ARBITRARY_LOADS_KEY.to_string(), Value::Boolean(true));
    root.insert(ATS_KEY.to_string(), Value::Dictionary(ats));
    Ok(())
}
