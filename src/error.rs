use std::fmt;

#[derive(Debug)]
pub enum Error {
    PngEncoding(png::EncodingError),
    /// The drawing surface was never allocated, so there is nothing to serialize.
    SurfaceUnavailable,
    /// The completion callback was already invoked for this pad.
    AlreadyCompleted,
    InvalidConfig(String),
    Json(serde_json::Error),
    Base64(base64::DecodeError),
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::PngEncoding(err) => write!(f, "cannot capture signature: {}", err),
            Error::SurfaceUnavailable => write!(f, "cannot capture signature"),
            Error::AlreadyCompleted => write!(f, "signature was already confirmed"),
            Error::InvalidConfig(msg) => write!(f, "invalid signature pad config: {}", msg),
            Error::Json(err) => write!(f, "json error: {}", err),
            Error::Base64(err) => write!(f, "base64 error: {}", err),
            Error::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<png::EncodingError> for Error {
    fn from(err: png::EncodingError) -> Self {
        Self::PngEncoding(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Self::Base64(err)
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}
impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Self::Other(err.to_owned())
    }
}
