//! Assembly of the region-proposal pipeline
//!
//! Builds the ordered stage chain decode → preprocess → inference → parse
//! over strided frame samples, with device placement resolved once per
//! assembly and passed down explicitly.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};
use video_pipeline_common::{DatasetMetadata, VideoItemMetadata, FRAME_COLUMN};
use video_pipeline_core::{
    AuxInputBuilder, DeviceCapabilities, DeviceContext, DeviceMemory, DevicePreference,
    DeviceSelection, DeviceType, PipelineDescription, PipelineError, PipelineRegistry,
    SamplingPolicy,
};

use crate::descriptor::NetDescriptor;
use crate::image_info::ImageInfoBuilder;
use crate::stages::{
    DecoderFactory, InferenceEvaluatorFactory, InputPreprocessorFactory, ProposalParserFactory,
};

/// Name the pipeline is registered under.
pub const PIPELINE_NAME: &str = "faster_rcnn_proposals";

/// Default manifest describing the proposal network.
pub const DEFAULT_DESCRIPTOR_PATH: &str = "models/faster_rcnn.yaml";

/// Every tenth frame of each item is sampled.
const FRAME_STRIDE: u32 = 10;

/// Items flow through the network one frame at a time.
const BATCH_SIZE: usize = 1;

/// Inputs to one assembly run: the resolved device pair, the placement
/// context built from it, and the descriptor manifest to load.
#[derive(Debug, Clone)]
pub struct AssemblyOptions {
    selection: DeviceSelection,
    context: DeviceContext,
    descriptor_path: PathBuf,
}

impl AssemblyOptions {
    /// Host-placed assembly: CPU compute, software decode.
    pub fn host(descriptor_path: impl Into<PathBuf>) -> Self {
        Self {
            selection: DeviceSelection::host(),
            context: DeviceContext::Host,
            descriptor_path: descriptor_path.into(),
        }
    }

    /// Accelerated assembly backed by the given device memory.
    pub fn accelerated(
        descriptor_path: impl Into<PathBuf>,
        memory: Arc<dyn DeviceMemory>,
    ) -> Self {
        Self {
            selection: DeviceSelection::accelerated(),
            context: DeviceContext::Accelerated(memory),
            descriptor_path: descriptor_path.into(),
        }
    }

    /// Resolve placement from the environment: preference from
    /// `VIDEO_PIPELINE_DEVICE`, capability flag probed once per process,
    /// default descriptor manifest.
    pub fn from_environment() -> Result<Self, PipelineError> {
        Self::from_environment_with_path(DEFAULT_DESCRIPTOR_PATH)
    }

    /// Environment-resolved placement with an explicit manifest path.
    pub fn from_environment_with_path(
        descriptor_path: impl Into<PathBuf>,
    ) -> Result<Self, PipelineError> {
        let caps = DeviceCapabilities::detect();
        let selection = DeviceSelection::resolve(DevicePreference::from_env(), &caps)?;
        match selection.device() {
            DeviceType::Cpu => Ok(Self::host(descriptor_path)),
            DeviceType::Gpu => Ok(Self::accelerated(descriptor_path, cuda_memory()?)),
        }
    }

    /// The resolved device pair.
    #[must_use]
    pub fn selection(&self) -> DeviceSelection {
        self.selection
    }

    /// The placement context buffers are bound to.
    #[must_use]
    pub fn context(&self) -> &DeviceContext {
        &self.context
    }

    /// Manifest the network descriptor is loaded from.
    #[must_use]
    pub fn descriptor_path(&self) -> &Path {
        &self.descriptor_path
    }
}

#[cfg(feature = "cuda")]
fn cuda_memory() -> Result<Arc<dyn DeviceMemory>, PipelineError> {
    use video_pipeline_core::memory::cuda::CudaMemory;
    Ok(Arc::new(CudaMemory::new(0)?))
}

#[cfg(not(feature = "cuda"))]
fn cuda_memory() -> Result<Arc<dyn DeviceMemory>, PipelineError> {
    Err(PipelineError::Configuration(
        "accelerated device selected but this build carries no CUDA support".to_string(),
    ))
}

/// Assemble the region-proposal pipeline with explicit options.
///
/// The step order is fixed: columns and sampling first, then the descriptor
/// load, then the four stage factories in execution order. Any failure
/// aborts the whole assembly; nothing is retried and there is no fallback
/// placement. Equal inputs against an unchanged manifest produce
/// structurally equal descriptions.
pub fn assemble_with(
    options: &AssemblyOptions,
    dataset: &DatasetMetadata,
    items: &[VideoItemMetadata],
) -> Result<PipelineDescription, PipelineError> {
    if !dataset.has_frames() {
        return Err(PipelineError::Configuration(format!(
            "dataset {} does not serve a {FRAME_COLUMN} column",
            dataset.name
        )));
    }

    debug!(
        "assembling {PIPELINE_NAME} for dataset {} ({} items)",
        dataset.name,
        items.len()
    );

    let mut description = PipelineDescription::new(
        vec![FRAME_COLUMN.to_string()],
        SamplingPolicy::Strided {
            stride: FRAME_STRIDE,
        },
    );

    let descriptor = Arc::new(NetDescriptor::from_file(options.descriptor_path())?);
    let selection = options.selection();

    let image_info: Arc<dyn AuxInputBuilder> =
        Arc::new(ImageInfoBuilder::new(options.context().clone()));

    description.push_stage(Arc::new(DecoderFactory::new(
        selection.device(),
        selection.decoder(),
    )));
    description.push_stage(Arc::new(InputPreprocessorFactory::new(
        DeviceType::Cpu,
        Arc::clone(&descriptor),
        BATCH_SIZE,
        vec![image_info],
    )));
    description.push_stage(Arc::new(InferenceEvaluatorFactory::new(
        selection.device(),
        Arc::clone(&descriptor),
        BATCH_SIZE,
        false,
    )));
    description.push_stage(Arc::new(ProposalParserFactory::new()));

    info!(
        "assembled {PIPELINE_NAME} on {} with {} stages",
        selection.device(),
        description.stage_factories.len()
    );

    Ok(description)
}

/// Assemble with environment-resolved placement and the default manifest.
pub fn assemble(
    dataset: &DatasetMetadata,
    items: &[VideoItemMetadata],
) -> Result<PipelineDescription, PipelineError> {
    let options = AssemblyOptions::from_environment()?;
    assemble_with(&options, dataset, items)
}

/// Register the pipeline under [`PIPELINE_NAME`]. Called once at process
/// startup by the embedding binary.
pub fn register(registry: &mut PipelineRegistry) {
    registry.register(PIPELINE_NAME, Arc::new(assemble));
}
