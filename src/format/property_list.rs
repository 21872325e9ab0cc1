use super::{Format, FormatError};
use plist::Value;
use std::io::Cursor;

/// Property lists. Reads XML or binary, always writes XML.
pub struct PlistFormat;

impl Format for PlistFormat {
    type Document = Value;

    const NAME: &'static str = "property list";

    fn parse(bytes: &[u8]) -> Result<Value, FormatError> {
        Ok(Value::from_reader(Cursor::new(bytes))?)
    }

    fn serialize(document: &Value) -> Result<Vec<u8>, FormatError> {
        let mut out = Vec::new();
        document.to_writer_xml(&mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>CFBundleName</key>
    <string>Demo</string>
</dict>
</plist>
"#;

    #[test]
    fn test_parse_dictionary() {
        let doc = PlistFormat::parse(SAMPLE.as_bytes()).unwrap();
        let dict = doc.as_dictionary().unwrap();
        assert_eq!(
            dict.get("CFBundleName").and_then(Value::as_string),
            Some("Demo")
        );
    }

    #[test]
    fn test_serialize_is_xml() {
        let doc = PlistFormat::parse(SAMPLE.as_bytes()).unwrap();
        let out = String::from_utf8(PlistFormat::serialize(&doc).unwrap()).unwrap();
        assert!(out.contains("<plist version=\"1.0\">"));
        assert!(out.contains("<string>Demo</string>"));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            PlistFormat::parse(b"definitely not a plist"),
            Err(FormatError::Plist(_))
        ));
    }
}
