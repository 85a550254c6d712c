use thiserror::Error;

/// Errors originating from the conversion core.
///
/// Every variant is terminal for the current conversion call: nothing is
/// retried internally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Bad width, density map, aspect ratio, or unknown palette/mode name.
    #[error("Configuration invalide : {0}")]
    InvalidConfiguration(String),

    /// Zero-sized image, unsupported channel count, or inconsistent buffer.
    #[error("Image invalide : {0}")]
    InvalidImage(String),

    /// A preprocessing transform could not be applied.
    #[error("Prétraitement impossible : {0}")]
    PreprocessingFailure(String),

    /// The image source could not deliver an image (I/O, decoding, …).
    #[error("Source indisponible : {0}")]
    SourceUnavailable(String),
}

impl CoreError {
    /// Shorthand for [`CoreError::InvalidConfiguration`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Shorthand for [`CoreError::InvalidImage`].
    pub fn image(msg: impl Into<String>) -> Self {
        Self::InvalidImage(msg.into())
    }

    /// Shorthand for [`CoreError::PreprocessingFailure`].
    pub fn preprocessing(msg: impl Into<String>) -> Self {
        Self::PreprocessingFailure(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_single_line() {
        let e = CoreError::config("largeur demandée 0 (doit être > 0)");
        let msg = e.to_string();
        assert!(msg.starts_with("Configuration invalide"));
        assert!(!msg.contains('\n'));
    }
}
