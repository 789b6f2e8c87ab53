//! Per-item image-info input builder
//!
//! Region-proposal networks take a second input alongside the frame tensor:
//! three 32-bit floats `[height, width, scale]` describing the item's
//! geometry. The builder packs that blob in host memory and, under GPU
//! placement, relocates it into device memory before handing it back.

use video_pipeline_common::VideoItemMetadata;
use video_pipeline_core::{
    AuxInputBuilder, BufferError, DeviceContext, HostBuffer, PipelineBuffer,
};

/// Network input fed by this builder.
pub const IMAGE_INFO_INPUT: &str = "im_info";

/// Builds the `[height, width, scale]` input, bound to a device placement.
///
/// Holds no per-call state: each invocation allocates, fills, optionally
/// relocates, and returns an independently owned buffer, so concurrent
/// calls from multiple workers are safe.
#[derive(Debug, Clone)]
pub struct ImageInfoBuilder {
    context: DeviceContext,
}

impl ImageInfoBuilder {
    /// Bind a builder to the resolved device placement.
    #[must_use]
    pub fn new(context: DeviceContext) -> Self {
        Self { context }
    }
}

impl AuxInputBuilder for ImageInfoBuilder {
    fn input_name(&self) -> &str {
        IMAGE_INFO_INPUT
    }

    fn build(&self, item: &VideoItemMetadata) -> Result<(PipelineBuffer, usize), BufferError> {
        // Frames reach the network at decoded resolution, so scale is 1.0.
        let values = [item.height as f32, item.width as f32, 1.0];
        let host = HostBuffer::from_f32s(&values);
        let size = host.len();

        let buffer = match &self.context {
            DeviceContext::Host => PipelineBuffer::Host(host),
            DeviceContext::Accelerated(memory) => {
                PipelineBuffer::Device(host.relocate(memory.as_ref())?)
            }
        };
        Ok((buffer, size))
    }
}
