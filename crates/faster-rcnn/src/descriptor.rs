//! Network descriptor manifests
//!
//! A descriptor names the model resource and the tensor interface the
//! preprocessing and inference stages consume. Manifests are YAML and load
//! synchronously, once per assembly.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;
use video_pipeline_core::PipelineError;

/// Parsed network configuration, shared read-only with the stage factories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetDescriptor {
    /// Model identifier.
    pub name: String,
    /// Path to the serialized network graph.
    pub model_path: PathBuf,
    /// Path to the weights, when stored separately from the graph.
    #[serde(default)]
    pub weights_path: Option<PathBuf>,
    /// Name of the frame input tensor.
    pub input_name: String,
    /// Names of auxiliary input tensors, fed by per-item builders.
    #[serde(default)]
    pub aux_input_names: Vec<String>,
    /// Names of the output tensors, in emission order.
    pub output_names: Vec<String>,
    /// Channels per input pixel.
    pub input_channels: u32,
    /// Per-channel mean subtracted during preprocessing.
    pub mean_pixels: Vec<f32>,
}

impl NetDescriptor {
    /// Load a descriptor from its YAML manifest.
    ///
    /// The load is synchronous and blocking. A missing, malformed, or
    /// structurally invalid manifest aborts pipeline assembly.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        debug!("loading network descriptor from {}", path.display());

        let contents =
            fs::read_to_string(path).map_err(|source| PipelineError::DescriptorRead {
                path: path.to_path_buf(),
                source,
            })?;
        let descriptor: NetDescriptor =
            serde_yaml::from_str(&contents).map_err(|source| PipelineError::DescriptorParse {
                path: path.to_path_buf(),
                source,
            })?;
        descriptor.validate(path)?;
        Ok(descriptor)
    }

    fn validate(&self, path: &Path) -> Result<(), PipelineError> {
        if self.input_name.is_empty() {
            return Err(invalid(path, "empty input tensor name"));
        }
        if self.output_names.is_empty() {
            return Err(invalid(path, "no output tensor names"));
        }
        if self.input_channels == 0 {
            return Err(invalid(path, "zero input channels"));
        }
        Ok(())
    }
}

fn invalid(path: &Path, reason: &str) -> PipelineError {
    PipelineError::DescriptorInvalid {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MANIFEST: &str = "\
name: faster_rcnn_vgg16
model_path: models/faster_rcnn.onnx
input_name: data
aux_input_names:
  - im_info
output_names:
  - rois
input_channels: 3
mean_pixels: [102.9801, 115.9465, 122.7717]
";

    fn manifest_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid_manifest() {
        let file = manifest_file(MANIFEST);
        let descriptor = NetDescriptor::from_file(file.path()).unwrap();

        assert_eq!(descriptor.name, "faster_rcnn_vgg16");
        assert_eq!(descriptor.input_name, "data");
        assert_eq!(descriptor.aux_input_names, vec!["im_info".to_string()]);
        assert_eq!(descriptor.output_names, vec!["rois".to_string()]);
        assert_eq!(descriptor.input_channels, 3);
        assert!(descriptor.weights_path.is_none());
    }

    #[test]
    fn test_missing_manifest_is_a_read_error() {
        let err = NetDescriptor::from_file("nonexistent/net.yaml").unwrap_err();
        assert!(matches!(err, PipelineError::DescriptorRead { .. }));
    }

    #[test]
    fn test_malformed_manifest_is_a_parse_error() {
        let file = manifest_file("name: [unclosed");
        let err = NetDescriptor::from_file(file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::DescriptorParse { .. }));
    }

    #[test]
    fn test_manifest_without_outputs_is_invalid() {
        let file = manifest_file(
            "\
name: broken
model_path: models/broken.onnx
input_name: data
output_names: []
input_channels: 3
mean_pixels: [0.0, 0.0, 0.0]
",
        );
        let err = NetDescriptor::from_file(file.path()).unwrap_err();
        assert!(matches!(err, PipelineError::DescriptorInvalid { .. }));
    }
}
