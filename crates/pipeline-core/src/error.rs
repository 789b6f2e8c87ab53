//! Error types for pipeline assembly and buffer construction

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while assembling a pipeline description.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// An unsupported device/decoder pairing was requested.
    #[error("unsupported device configuration: {0}")]
    Configuration(String),

    /// The model descriptor resource could not be read.
    #[error("failed to read model descriptor {path}: {source}")]
    DescriptorRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The model descriptor resource could not be parsed.
    #[error("failed to parse model descriptor {path}: {source}")]
    DescriptorParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The model descriptor parsed but fails structural validation.
    #[error("invalid model descriptor {path}: {reason}")]
    DescriptorInvalid { path: PathBuf, reason: String },

    /// No pipeline is registered under the requested name.
    #[error("no pipeline registered under name: {0}")]
    UnknownPipeline(String),

    /// An assembled description violates a structural invariant.
    #[error("invalid pipeline description: {0}")]
    InvalidDescription(String),

    /// Per-item buffer construction failed.
    #[error("buffer error: {0}")]
    Buffer(#[from] BufferError),

    /// Other error.
    #[error("other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Errors raised while building or relocating a per-item buffer.
///
/// Both variants are fatal for the item being processed and propagate to the
/// engine; nothing here is retried or masked.
#[derive(Debug, Error)]
pub enum BufferError {
    /// Device memory allocation failed.
    #[error("device allocation of {len} bytes failed: {reason}")]
    Allocation { len: usize, reason: String },

    /// A copy between memory spaces failed.
    #[error("copy of {len} bytes failed: {reason}")]
    Transfer { len: usize, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PipelineError::Configuration("gpu requested, none present".to_string());
        assert_eq!(
            err.to_string(),
            "unsupported device configuration: gpu requested, none present"
        );

        let err = BufferError::Allocation {
            len: 12,
            reason: "out of memory".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "device allocation of 12 bytes failed: out of memory"
        );
    }

    #[test]
    fn test_buffer_error_wraps_into_pipeline_error() {
        let err: PipelineError = BufferError::Transfer {
            len: 12,
            reason: "bus fault".to_string(),
        }
        .into();
        assert!(matches!(err, PipelineError::Buffer(_)));
    }
}
