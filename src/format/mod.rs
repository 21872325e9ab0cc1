//! Parse/serialize adapters, one per document kind a patch touches.
//!
//! Each patch operation picks its adapter explicitly; nothing is inferred
//! from file extensions.

pub mod errors;
pub mod json;
pub mod markup;
pub mod property_list;
pub mod text;
pub mod xml;

pub use errors::FormatError;
pub use json::JsonFormat;
pub use markup::{MarkupDocument, MarkupFormat, MetaTag};
pub use property_list::PlistFormat;
pub use text::TextFormat;
pub use xml::{Element, Node, XmlDocument, XmlFormat};

/// A document format: bytes in, owned document, bytes out.
pub trait Format {
    type Document;

    /// Short name used in error messages.
    const NAME: &'static str;

    fn parse(bytes: &[u8]) -> Result<Self::Document, FormatError>;

    fn serialize(document: &Self::Document) -> Result<Vec<u8>, FormatError>;
}

/// Decode UTF-8 and drop a leading byte-order mark.
pub(crate) fn decode_utf8(bytes: &[u8]) -> Result<&str, FormatError> {
    let text = std::str::from_utf8(bytes)?;
    Ok(text.strip_prefix('\u{feff}').unwrap_or(text))
}
