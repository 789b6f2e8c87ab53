//! Video Pipeline Core - engine-facing pipeline assembly abstractions
//!
//! This crate defines what a registered video-analytics pipeline hands the
//! execution engine: an ordered description of stage factories, the device
//! placement those factories are bound to, and the owned-buffer handles used
//! to move per-item data between host and device memory.

pub mod buffer;
pub mod description;
pub mod device;
pub mod error;
pub mod memory;
pub mod registry;

pub use buffer::{DeviceBuffer, HostBuffer, MemorySpace, PipelineBuffer};
pub use description::{
    AuxInputBuilder, PipelineDescription, SamplingPolicy, StageFactory, StageKind,
};
pub use device::{
    DeviceCapabilities, DeviceContext, DevicePreference, DeviceSelection, DeviceType, DecoderType,
};
pub use error::{BufferError, PipelineError};
pub use memory::{DeviceMemory, DeviceRegion, EmulatedMemory};
pub use registry::{AssemblyFn, PipelineRegistry};
