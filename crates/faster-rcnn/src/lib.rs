//! Region-proposal pipeline for video datasets
//!
//! Assembles the stage chain that turns strided frame samples into region
//! proposals: decode → network-input preprocessing → network forward pass →
//! proposal parsing. The execution engine instantiates the assembled
//! description once per run; per-item work happens inside the stages it
//! builds from these factories.

pub mod descriptor;
pub mod image_info;
pub mod pipeline;
pub mod stages;

pub use descriptor::NetDescriptor;
pub use image_info::{ImageInfoBuilder, IMAGE_INFO_INPUT};
pub use pipeline::{
    assemble, assemble_with, register, AssemblyOptions, DEFAULT_DESCRIPTOR_PATH, PIPELINE_NAME,
};
pub use stages::{
    DecoderFactory, InferenceEvaluatorFactory, InputPreprocessorFactory, ProposalParserFactory,
};
