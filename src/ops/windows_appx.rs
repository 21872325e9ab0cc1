use super::{pattern, rewrite_document, Operation, PatchError, PatchOutcome, PatchStatus};
use crate::format::{XmlDocument, XmlFormat};
use crate::locator::FileLocator;
use crate::platform::{Platform, RootKind, START_PAGE};

const APPLICATION_PATH: &str = "*/Application[@StartPage]";

/// Point the package's `Application/@StartPage` at the start page.
pub fn update_appx_manifest(locator: &FileLocator) -> Result<Vec<PatchOutcome>, PatchError> {
    let mut outcomes = Vec::new();
    for target in locator.find(&pattern("**/*.appxmanifest")?, RootKind::Config)? {
        if target.platform != Platform::Windows {
            outcomes.push(PatchOutcome::new(
                Operation::WindowsAppx,
                &target,
                PatchStatus::Skipped {
                    reason: format!("package manifest outside the {} tree", Platform::Windows),
                },
            ));
            continue;
        }

        let written = rewrite_document::<XmlFormat, _>(&target.path, |doc| {
            if !redirect_start_page(doc) {
                tracing::debug!(path = %target.path.display(), "no Application with a StartPage");
            }
            Ok(())
        })?;
        outcomes.push(PatchOutcome::written(Operation::WindowsAppx, &target, written));
    }
    Ok(outcomes)
}

/// Returns `false` when the manifest has no `Application` with a `StartPage`.
pub fn redirect_start_page(doc: &mut XmlDocument) -> bool {
    let Some(application) = doc.root_mut().find_mut(APPLICATION_PATH) else {
        return false;
    };
    let redirected = application
        .attribute("StartPage")
        .map(|start_page| start_page.replacen("index.html", START_PAGE, 1));
    if let Some(redirected) = redirected {
        application.set_attribute("StartPage", redirected);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;

    const MANIFEST: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Package xmlns="http://schemas.microsoft.com/appx/manifest/foundation/windows10">
    <Applications>
        <Application Id="App" StartPage="www/assets/index.html?x=1"/>
    </Applications>
</Package>
"#;

    fn start_page(doc: &XmlDocument) -> Option<String> {
        doc.root()
            .find(APPLICATION_PATH)
            .and_then(|el| el.attribute("StartPage"))
            .map(str::to_string)
    }

    #[test]
    fn test_first_index_is_redirected_query_kept() {
        let mut doc = XmlFormat::parse(MANIFEST.as_bytes()).unwrap();
        assert!(redirect_start_page(&mut doc));
        assert_eq!(
            start_page(&doc).as_deref(),
            Some("www/assets/browser-sync-start.html?x=1")
        );
    }

    #[test]
    fn test_only_first_occurrence_replaced() {
        let xml = r#"<Package><Applications><Application StartPage="index.html#index.html"/></Applications></Package>"#;
        let mut doc = XmlFormat::parse(xml.as_bytes()).unwrap();
        redirect_start_page(&mut doc);
        assert_eq!(
            start_page(&doc).as_deref(),
            Some("browser-sync-start.html#index.html")
        );
    }

    #[test]
    fn test_manifest_without_application() {
        let mut doc = XmlFormat::parse(b"<Package><Properties/></Package>").unwrap();
        assert!(!redirect_start_page(&mut doc));
    }
}
