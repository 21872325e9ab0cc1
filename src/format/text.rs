use super::{Format, FormatError};

/// Plain text and source files, kept byte-for-byte.
pub struct TextFormat;

impl Format for TextFormat {
    type Document = String;

    const NAME: &'static str = "text";

    fn parse(bytes: &[u8]) -> Result<String, FormatError> {
        Ok(std::str::from_utf8(bytes)?.to_string())
    }

    fn serialize(document: &String) -> Result<Vec<u8>, FormatError> {
        Ok(document.as_bytes().to_vec())
    }
}
