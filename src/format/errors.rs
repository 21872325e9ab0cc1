use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed property list: {0}")]
    Plist(#[from] ::plist::Error),

    #[error("malformed XML at byte {position}: {message}")]
    Xml { position: u64, message: String },

    #[error("failed to write XML: {message}")]
    XmlWrite { message: String },

    #[error("unexpected {format} document shape: {message}")]
    UnexpectedShape {
        format: &'static str,
        message: String,
    },
}
