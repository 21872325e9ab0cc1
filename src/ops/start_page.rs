//! Generated start page that forwards to the live asset server.

use super::{pattern, Operation, PatchError, PatchOutcome};
use crate::config::PatchOptions;
use crate::edit::write_if_changed;
use crate::locator::{FileLocator, PatchTarget};
use crate::platform::{Platform, RootKind, START_PAGE};
use indexmap::IndexMap;
use url::Url;

/// Built-in start page template.
pub const DEFAULT_TEMPLATE: &str = include_str!("../../templates/browser-sync-start.html");

const SERVERS_PLACEHOLDER: &str = "__SERVERS__";
const FORCE_LOAD_PLACEHOLDER: &str = "__FORCE_LOAD__";
const USE_IFRAME_PLACEHOLDER: &str = "__USE_IFRAME__";

/// Write the start page next to every `index.html` in each web root.
pub fn copy_start_page(
    locator: &FileLocator,
    template: &str,
    options: &PatchOptions,
) -> Result<Vec<PatchOutcome>, PatchError> {
    let mut outcomes = Vec::new();
    for entry in locator.find(&pattern("**/index.html")?, RootKind::Web)? {
        let Some(dir) = entry.path.parent() else {
            continue;
        };
        let target = PatchTarget {
            path: dir.join(START_PAGE),
            platform: entry.platform,
        };

        let html = render(template, options, entry.platform);
        let written = write_if_changed(&target.path, html.as_bytes())?;
        if written {
            tracing::info!(platform = %target.platform, path = %target.path.display(), "wrote start page");
        }
        outcomes.push(PatchOutcome::written(Operation::StartPage, &target, written));
    }
    Ok(outcomes)
}

/// Fill the three placeholders, each at its first occurrence only.
pub fn render(template: &str, options: &PatchOptions, platform: Platform) -> String {
    let servers = server_table(options, platform);
    // A map of strings always serializes
    let servers = serde_json::to_string(&servers).unwrap_or_else(|_| "{}".to_string());

    template
        .replacen(SERVERS_PLACEHOLDER, &servers, 1)
        .replacen(FORCE_LOAD_PLACEHOLDER, bool_literal(options.force_load), 1)
        .replacen(
            USE_IFRAME_PLACEHOLDER,
            bool_literal(platform == Platform::Windows),
            1,
        )
}

/// Server name -> URL of `platform`'s copy of the app on that server.
pub fn server_table(options: &PatchOptions, platform: Platform) -> IndexMap<String, String> {
    let relative = format!("{platform}/www/{}", options.index);
    options
        .origins()
        .map(|(name, origin)| (name.to_string(), url_join(origin, &relative)))
        .collect()
}

fn bool_literal(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

/// Resolve a relative reference against `base` the way a browser would.
///
/// An origin that is not an absolute URL (including an empty one) only
/// contributes its directory part.
pub fn url_join(base: &str, relative: &str) -> String {
    match Url::parse(base).and_then(|base| base.join(relative)) {
        Ok(url) => url.into(),
        Err(error) => {
            tracing::debug!(base, %error, "origin is not an absolute URL");
            let dir = base.rfind('/').map_or("", |i| &base[..=i]);
            format!("{dir}{relative}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_server_table_single_android_server() {
        let options = PatchOptions::default().with_server("android", "http://10.0.0.5:8080");
        let table = server_table(&options, Platform::Android);
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.get("android").map(String::as_str),
            Some("http://10.0.0.5:8080/android/www/index.html")
        );
    }

    #[test]
    fn test_absent_servers_are_left_out() {
        let options = PatchOptions::default()
            .with_server("local", "http://localhost:3000")
            .without_server("external");
        let table = server_table(&options, Platform::Ios);
        assert_eq!(table.len(), 1);
        assert!(!table.contains_key("external"));
    }

    #[test]
    fn test_empty_origin_is_kept() {
        let options = PatchOptions::default().with_server("local", "");
        let table = server_table(&options, Platform::Browser);
        assert_eq!(table["local"], "browser/www/index.html");
    }

    #[test]
    fn test_render_substitutes_first_occurrence() {
        let template = "s=__SERVERS__ f=__FORCE_LOAD__ i=__USE_IFRAME__ again=__USE_IFRAME__";
        let options = PatchOptions::default()
            .with_server("local", "http://localhost:3000")
            .with_force_load(true);

        let html = render(template, &options, Platform::Windows);
        assert_eq!(
            html,
            r#"s={"local":"http://localhost:3000/windows/www/index.html"} f=true i=true again=__USE_IFRAME__"#
        );

        let html = render(template, &PatchOptions::default(), Platform::Ios);
        assert!(html.starts_with("s={} f=false i=false"));
    }

    #[test]
    fn test_default_template_has_each_placeholder_once() {
        for placeholder in [
            SERVERS_PLACEHOLDER,
            FORCE_LOAD_PLACEHOLDER,
            USE_IFRAME_PLACEHOLDER,
        ] {
            assert_eq!(DEFAULT_TEMPLATE.matches(placeholder).count(), 1, "{placeholder}");
        }
    }

    #[test]
    fn test_url_join_cases() {
        assert_eq!(
            url_join("http://host:3000", "ios/www/index.html"),
            "http://host:3000/ios/www/index.html"
        );
        assert_eq!(
            url_join("http://host:3000/", "ios/www/index.html"),
            "http://host:3000/ios/www/index.html"
        );
        assert_eq!(
            url_join("http://host/app/page", "ios/www/index.html"),
            "http://host/app/ios/www/index.html"
        );
        assert_eq!(
            url_join("http://host/app/", "ios/www/../index.html?x=1"),
            "http://host/app/ios/index.html?x=1"
        );
        assert_eq!(
            url_join("http://host/app/", "/root.html"),
            "http://host/root.html"
        );
        assert_eq!(
            url_join("http://host?q=1", "a.html"),
            "http://host/a.html"
        );
        assert_eq!(
            url_join("http://HOST:80/", "a.html"),
            "http://host/a.html"
        );
        assert_eq!(url_join("dev/app", "a.html"), "dev/a.html");
    }

    proptest! {
        #[test]
        fn prop_origin_join_appends_path(
            host in "[a-z]{1,10}(\\.[a-z]{1,5}){0,2}",
            port in 1024u16..,
            segments in prop::collection::vec("[A-Za-z0-9_-]{1,8}", 1..4),
        ) {
            let origin = format!("http://{host}:{port}");
            let relative = segments.join("/");
            prop_assert_eq!(url_join(&origin, &relative), format!("{origin}/{relative}"));
        }
    }
}
