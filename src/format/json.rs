use super::{decode_utf8, Format, FormatError};
use serde_json::Value;

/// JSON documents, key order preserved, written with 2-space indentation.
pub struct JsonFormat;

impl Format for JsonFormat {
    type Document = Value;

    const NAME: &'static str = "JSON";

    fn parse(bytes: &[u8]) -> Result<Value, FormatError> {
        Ok(serde_json::from_str(decode_utf8(bytes)?)?)
    }

    fn serialize(document: &Value) -> Result<Vec<u8>, FormatError> {
        Ok(serde_json::to_vec_pretty(document)?)
    }
}
