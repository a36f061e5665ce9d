use image::ImageError;
use thiserror::Error;

use std::io::Error as IOError;
use std::path::PathBuf;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct LprError(LprErrorKind);

#[derive(Debug, Error)]
pub enum LprErrorKind {
    /// null or zero-size image, box outside the image, unsupported file
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("ocr engine unavailable: {0}")]
    OcrUnavailable(String),
    #[error(transparent)]
    IOError(#[from] IOError),
    #[error(transparent)]
    ImageError(#[from] ImageError),
    #[error("bad config: {0}")]
    ConfigError(#[from] serde_json::Error),
    #[error("can not load font from {0:?}")]
    InvalidFont(PathBuf),
}

impl LprError {
    pub fn kind(&self) -> &LprErrorKind {
        &self.0
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self(LprErrorKind::InvalidInput(message.into()))
    }

    pub fn ocr_unavailable(message: impl Into<String>) -> Self {
        Self(LprErrorKind::OcrUnavailable(message.into()))
    }

    /// Errors the orchestrator absorbs into a degraded result.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), LprErrorKind::OcrUnavailable(_))
    }
}

impl<T> From<T> for LprError
where T: Into<LprErrorKind>
{
    fn from(e: T) -> Self {
        Self(e.into())
    }
}


#[cfg(test)]
mod test {

    use super::{LprError, LprErrorKind};

    #[test]
    fn only_ocr_failures_are_recoverable() {
        assert!(LprError::ocr_unavailable("no binary").is_recoverable());
        assert!(!LprError::invalid_input("0x0 image").is_recoverable());
        let io: LprError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(!io.is_recoverable());
        assert!(matches!(io.kind(), LprErrorKind::IOError(_)));
    }

    #[test]
    fn display_carries_the_message() {
        let e = LprError::invalid_input("image has zero size");
        assert_eq!(e.to_string(), "invalid input: image has zero size");
    }
}
