use super::{pattern, rewrite_document, Operation, PatchError, PatchOutcome};
use crate::format::{Element, XmlDocument, XmlFormat};
use crate::locator::FileLocator;
use crate::platform::{RootKind, START_PAGE};

/// Point `<content src>` at the start page and allow navigation anywhere.
pub fn update_config_xml(locator: &FileLocator) -> Result<Vec<PatchOutcome>, PatchError> {
    let mut outcomes = Vec::new();
    for target in locator.find(&pattern("**/config.xml")?, RootKind::Config)? {
        let written = rewrite_document::<XmlFormat, _>(&target.path, |doc| {
            patch_config(doc);
            Ok(())
        })?;
        outcomes.push(PatchOutcome::written(Operation::ConfigXml, &target, written));
    }
    Ok(outcomes)
}

pub fn patch_config(doc: &mut XmlDocument) {
    let root = doc.root_mut();
    if let Some(content) = root.find_mut("content[@src]") {
        content.set_attribute("src", START_PAGE);
    }

    // The real app is served from another origin
    let allowed = root
        .elements()
        .any(|el| el.name == "allow-navigation" && el.attribute("href") == Some("*"));
    if !allowed {
        root.append_child(Element::new("allow-navigation").with_attribute("href", "*"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;

    fn patched(xml: &str) -> XmlDocument {
        let mut doc = XmlFormat::parse(xml.as_bytes()).unwrap();
        patch_config(&mut doc);
        doc
    }

    #[test]
    fn test_content_src_is_overwritten() {
        let doc = patched(r#"<widget><content src="main/index.html"/></widget>"#);
        assert_eq!(
            doc.root().find("content").unwrap().attribute("src"),
            Some(START_PAGE)
        );
    }

    #[test]
    fn test_missing_content_is_tolerated() {
        let doc = patched("<widget><name>x</name></widget>");
        assert!(doc.root().find("content").is_none());
        assert!(doc.root().find("allow-navigation[@href]").is_some());
    }

    #[test]
    fn test_allow_navigation_added_once() {
        let mut doc = patched("<widget/>");
        patch_config(&mut doc);
        let count = doc
            .root()
            .elements()
            .filter(|el| el.name == "allow-navigation")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_narrower_allow_navigation_is_kept() {
        let doc = patched(r#"<widget><allow-navigation href="https://example.com/*"/></widget>"#);
        let hrefs: Vec<_> = doc
            .root()
            .elements()
            .filter_map(|el| el.attribute("href"))
            .collect();
        assert_eq!(hrefs, ["https://example.com/*", "*"]);
    }
}
