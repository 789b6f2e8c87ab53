//! Stage factories for the region-proposal pipeline
//!
//! Each factory is the configuration record the engine instantiates its
//! stage from. Every parameter is passed explicitly at construction; no
//! factory reads process globals.

use std::fmt;
use std::sync::Arc;

use video_pipeline_core::{AuxInputBuilder, DecoderType, DeviceType, StageFactory, StageKind};

use crate::descriptor::NetDescriptor;

/// Factory for the frame-decoding stage.
#[derive(Debug, Clone, Copy)]
pub struct DecoderFactory {
    device: DeviceType,
    decoder: DecoderType,
}

impl DecoderFactory {
    /// Create a decoder factory for the resolved device pair.
    #[must_use]
    pub fn new(device: DeviceType, decoder: DecoderType) -> Self {
        Self { device, decoder }
    }

    /// Decoder implementation the stage will use.
    #[must_use]
    pub fn decoder(&self) -> DecoderType {
        self.decoder
    }
}

impl StageFactory for DecoderFactory {
    fn kind(&self) -> StageKind {
        StageKind::Decode
    }

    fn device(&self) -> DeviceType {
        self.device
    }

    fn name(&self) -> &'static str {
        "frame_decode"
    }
}

/// Factory for the network-input preprocessing stage.
///
/// Runs its own arithmetic on the host regardless of where inference is
/// placed; the auxiliary builders carry their own device binding.
pub struct InputPreprocessorFactory {
    device: DeviceType,
    descriptor: Arc<NetDescriptor>,
    batch_size: usize,
    aux_builders: Vec<Arc<dyn AuxInputBuilder>>,
}

impl InputPreprocessorFactory {
    /// Create a preprocessing factory for the given network interface.
    #[must_use]
    pub fn new(
        device: DeviceType,
        descriptor: Arc<NetDescriptor>,
        batch_size: usize,
        aux_builders: Vec<Arc<dyn AuxInputBuilder>>,
    ) -> Self {
        Self {
            device,
            descriptor,
            batch_size,
            aux_builders,
        }
    }

    /// Network interface the stage prepares inputs for.
    #[must_use]
    pub fn descriptor(&self) -> &NetDescriptor {
        &self.descriptor
    }

    /// Frames per network invocation.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Builders for the auxiliary network inputs, one per input.
    #[must_use]
    pub fn aux_builders(&self) -> &[Arc<dyn AuxInputBuilder>] {
        &self.aux_builders
    }
}

impl fmt::Debug for InputPreprocessorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let aux_inputs: Vec<&str> = self
            .aux_builders
            .iter()
            .map(|builder| builder.input_name())
            .collect();
        f.debug_struct("InputPreprocessorFactory")
            .field("device", &self.device)
            .field("net", &self.descriptor.name)
            .field("batch_size", &self.batch_size)
            .field("aux_inputs", &aux_inputs)
            .finish()
    }
}

impl StageFactory for InputPreprocessorFactory {
    fn kind(&self) -> StageKind {
        StageKind::Preprocess
    }

    fn device(&self) -> DeviceType {
        self.device
    }

    fn name(&self) -> &'static str {
        "net_input"
    }
}

/// Factory for the network forward-pass stage.
#[derive(Debug, Clone)]
pub struct InferenceEvaluatorFactory {
    device: DeviceType,
    descriptor: Arc<NetDescriptor>,
    batch_size: usize,
    emit_intermediates: bool,
}

impl InferenceEvaluatorFactory {
    /// Create an inference factory for the given network and placement.
    #[must_use]
    pub fn new(
        device: DeviceType,
        descriptor: Arc<NetDescriptor>,
        batch_size: usize,
        emit_intermediates: bool,
    ) -> Self {
        Self {
            device,
            descriptor,
            batch_size,
            emit_intermediates,
        }
    }

    /// Network the stage evaluates.
    #[must_use]
    pub fn descriptor(&self) -> &NetDescriptor {
        &self.descriptor
    }

    /// Frames per network invocation.
    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Whether the stage also emits intermediate-layer outputs.
    #[must_use]
    pub fn emit_intermediates(&self) -> bool {
        self.emit_intermediates
    }
}

impl StageFactory for InferenceEvaluatorFactory {
    fn kind(&self) -> StageKind {
        StageKind::Inference
    }

    fn device(&self) -> DeviceType {
        self.device
    }

    fn name(&self) -> &'static str {
        "net_forward"
    }
}

/// Factory for the proposal-parsing stage. Detector-specific; takes no
/// parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProposalParserFactory;

impl ProposalParserFactory {
    /// Create the parser factory.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl StageFactory for ProposalParserFactory {
    fn kind(&self) -> StageKind {
        StageKind::Parse
    }

    fn device(&self) -> DeviceType {
        DeviceType::Cpu
    }

    fn name(&self) -> &'static str {
        "proposal_parse"
    }
}
