//! Relax each page's Content-Security-Policy so the live server may run
//! scripts and open a websocket.

use super::{pattern, rewrite_document, Operation, PatchError, PatchOutcome};
use crate::config::PatchOptions;
use crate::csp::Policy;
use crate::format::MarkupFormat;
use crate::locator::FileLocator;
use crate::platform::RootKind;

pub const CSP_HTTP_EQUIV: &str = "Content-Security-Policy";

pub fn add_csp(locator: &FileLocator, options: &PatchOptions) -> Result<Vec<PatchOutcome>, PatchError> {
    let mut outcomes = Vec::new();
    for target in locator.find(&pattern("**/index.html")?, RootKind::Web)? {
        let written = rewrite_document::<MarkupFormat, _>(&target.path, |page| {
            let Some(tag) = page.find_meta_by_http_equiv(CSP_HTTP_EQUIV) else {
                tracing::debug!(path = %target.path.display(), "no CSP meta tag");
                return Ok(());
            };
            let current = tag
                .attribute("content")
                .and_then(|attr| attr.value.as_deref())
                .unwrap_or("");

            let relaxed = relax(Policy::parse(current), options);
            page.set_attribute(&target.path, &tag, "content", &relaxed.to_string())?;
            Ok(())
        })?;
        outcomes.push(PatchOutcome::written(Operation::ContentPolicy, &target, written));
    }
    Ok(outcomes)
}

/// Add the sources the live server needs. Existing sources are kept.
pub fn relax(mut policy: Policy, options: &PatchOptions) -> Policy {
    policy.add("default-src", "ws:");
    policy.add("default-src", "'unsafe-inline'");
    policy.add("script-src", "'self'");
    policy.add("script-src", "'unsafe-inline'");
    for (_, origin) in options.origins() {
        policy.add("script-src", origin);
    }
    policy
}
