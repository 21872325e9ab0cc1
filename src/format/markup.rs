//! HTML pages, edited in place.
//!
//! Pages are never re-serialized from a tree. The patch locates one tag,
//! computes a byte-span [`Edit`] for the attribute it changes, and splices it
//! into the source so the rest of the page is preserved byte-for-byte.

use super::{Format, FormatError};
use crate::edit::{Edit, EditError};
use regex::Regex;
use std::ops::Range;
use std::path::Path;
use std::sync::OnceLock;

pub struct MarkupFormat;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkupDocument {
    source: String,
}

/// One `<meta ...>` tag and the spans of its attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaTag {
    /// Byte span of the whole tag in the page
    pub span: Range<usize>,
    pub attributes: Vec<TagAttribute>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagAttribute {
    /// Attribute name as written
    pub name: String,
    /// Raw value, entities left undecoded
    pub value: Option<String>,
    /// Byte span of `name[=value]` in the page
    pub span: Range<usize>,
}

/// Rest of an opening tag after its name, `>` inside quotes allowed.
const TAG_TAIL: &str = r#"(?:[^>"']|"[^"]*"|'[^']*')*>"#;

/// Matches either an inert region (comment or raw-text element) or a `<meta>`
/// tag. Inert regions are consumed whole so tags inside them never match.
fn meta_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let raw_text = ["script", "style", "template", "textarea"]
            .iter()
            .map(|name| format!(r"<{name}\b{TAG_TAIL}.*?(?:</{name}\s*>|\z)"))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(r"(?is)(?P<inert><!--.*?(?:-->|\z)|{raw_text})|(?P<meta><meta\b{TAG_TAIL})");
        Regex::new(&pattern).expect("meta tag regex is valid")
    })
}

fn attribute_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"([^\s"'>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
            .expect("attribute regex is valid")
    })
}

impl MetaTag {
    pub fn attribute(&self, name: &str) -> Option<&TagAttribute> {
        self.attributes
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
    }
}

impl MarkupDocument {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Every live `<meta>` tag in document order.
    ///
    /// Tags inside comments and `<script>`, `<style>`, `<template>` or
    /// `<textarea>` bodies are not part of the page and are left out.
    pub fn meta_tags(&self) -> Vec<MetaTag> {
        meta_regex()
            .captures_iter(&self.source)
            .filter_map(|caps| caps.name("meta"))
            .map(|tag| {
                // Skip the "<meta" prefix; offsets stay absolute.
                let body_start = tag.start() + "<meta".len();
                let body = &self.source[body_start..tag.end() - 1];
                let attributes = attribute_regex()
                    .captures_iter(body)
                    .filter_map(|caps| {
                        let whole = caps.get(0)?;
                        let value = caps
                            .get(2)
                            .or_else(|| caps.get(3))
                            .or_else(|| caps.get(4))
                            .map(|m| m.as_str().to_string());
                        Some(TagAttribute {
                            name: caps.get(1)?.as_str().to_string(),
                            value,
                            span: body_start + whole.start()..body_start + whole.end(),
                        })
                    })
                    .collect();
                MetaTag {
                    span: tag.range(),
                    attributes,
                }
            })
            .collect()
    }

    /// First `<meta>` whose `http-equiv` equals `equiv`, ignoring ASCII case.
    pub fn find_meta_by_http_equiv(&self, equiv: &str) -> Option<MetaTag> {
        self.meta_tags().into_iter().find(|tag| {
            tag.attribute("http-equiv")
                .and_then(|attr| attr.value.as_deref())
                .is_some_and(|value| value.trim().eq_ignore_ascii_case(equiv))
        })
    }

    /// Set an attribute on `tag`, rewriting only that attribute's bytes.
    ///
    /// The value is written double-quoted; a `"` inside it is escaped.
    pub fn set_attribute(
        &mut self,
        file: &Path,
        tag: &MetaTag,
        name: &str,
        value: &str,
    ) -> Result<(), EditError> {
        let quoted = value.replace('"', "&quot;");
        let edit = match tag.attribute(name) {
            Some(attr) => Edit::new(
                file,
                attr.span.start,
                attr.span.end,
                format!("{}=\"{}\"", attr.name, quoted),
                &self.source[attr.span.clone()],
            ),
            None => {
                let tag_text = &self.source[tag.span.clone()];
                let close = if tag_text.ends_with("/>") { 2 } else { 1 };
                let at = tag.span.end - close;
                Edit::new(file, at, at, format!(" {name}=\"{quoted}\""), "")
            }
        };
        self.source = edit.splice(&self.source)?;
        Ok(())
    }
}

impl Format for MarkupFormat {
    type Document = MarkupDocument;

    const NAME: &'static str = "HTML";

    fn parse(bytes: &[u8]) -> Result<MarkupDocument, FormatError> {
        Ok(MarkupDocument::new(std::str::from_utf8(bytes)?))
    }

    fn serialize(document: &MarkupDocument) -> Result<Vec<u8>, FormatError> {
        Ok(document.source.as_bytes().to_vec())
    }
}
