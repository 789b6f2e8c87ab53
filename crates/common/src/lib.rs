/// Shared metadata types for video datasets and their items
use serde::{Deserialize, Serialize};

/// Column every frame-consuming pipeline reads from the dataset.
pub const FRAME_COLUMN: &str = "frame";

/// Dataset-level metadata handed to pipeline assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    /// Dataset identifier.
    pub name: String,
    /// Columns the dataset can serve.
    pub columns: Vec<String>,
}

impl DatasetMetadata {
    /// Create dataset metadata from a name and its served columns.
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Check whether the dataset serves the given column.
    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Check whether the dataset serves decoded frames.
    #[must_use]
    pub fn has_frames(&self) -> bool {
        self.has_column(FRAME_COLUMN)
    }
}

/// Per-item metadata for one video in the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoItemMetadata {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Total frame count of the item.
    pub frames: u64,
}

impl VideoItemMetadata {
    /// Create item metadata for a video of the given geometry.
    #[must_use]
    pub fn new(width: u32, height: u32, frames: u64) -> Self {
        Self {
            width,
            height,
            frames,
        }
    }
}
