//! Error type shared by every layer entry point.

use thiserror::Error;

/// Failure reported by a layer entry point or by the relation table.
///
/// Entry points validate their buffers before writing, so an error always
/// leaves the caller's output untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayerError {
    /// A relation-table reload was given a different capacity than compiled in.
    #[error("invalid biome count: expected {expected}, got {found}")]
    CapacityMismatch {
        /// Capacity the table was compiled with.
        expected: usize,
        /// Capacity the caller supplied.
        found: usize,
    },
    /// A caller buffer cannot hold the extent the operation needs.
    #[error("{buffer} buffer too small: need {required} cells, got {actual}")]
    BufferTooSmall {
        /// Which argument was undersized.
        buffer: &'static str,
        /// Cells the operation needs.
        required: usize,
        /// Cells the caller provided.
        actual: usize,
    },
    /// A layer stack description could not be assembled.
    #[error("invalid layer configuration: {0}")]
    InvalidConfig(String),
}

impl LayerError {
    /// Numeric code accompanying the message, when one applies.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::CapacityMismatch { found, .. } => Some(*found as i64),
            Self::BufferTooSmall { required, .. } => Some(*required as i64),
            Self::InvalidConfig(_) => None,
        }
    }

    /// Return `BufferTooSmall` unless `actual >= required`.
    pub fn check_len(buffer: &'static str, required: usize, actual: usize) -> Result<(), Self> {
        if actual < required {
            return Err(Self::BufferTooSmall {
                buffer,
                required,
                actual,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_and_codes() {
        let err = LayerError::CapacityMismatch {
            expected: 256,
            found: 200,
        };
        assert_eq!(err.to_string(), "invalid biome count: expected 256, got 200");
        assert_eq!(err.code(), Some(200));

        let err = LayerError::check_len("output", 16, 9).unwrap_err();
        assert_eq!(err.to_string(), "output buffer too small: need 16 cells, got 9");
        assert_eq!(err.code(), Some(16));

        assert!(LayerError::check_len("input", 4, 4).is_ok());
        assert_eq!(LayerError::InvalidConfig("x".into()).code(), None);
    }
}
