//! Pipeline descriptions and the stage-factory ABI

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use video_pipeline_common::VideoItemMetadata;

use crate::buffer::PipelineBuffer;
use crate::device::DeviceType;
use crate::error::{BufferError, PipelineError};

/// Frame-selection policy applied to each video item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum SamplingPolicy {
    /// Every frame.
    All,
    /// Every `stride`-th frame.
    Strided { stride: u32 },
}

/// Processing stage a factory produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageKind {
    Decode,
    Preprocess,
    Inference,
    Parse,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageKind::Decode => f.write_str("decode"),
            StageKind::Preprocess => f.write_str("preprocess"),
            StageKind::Inference => f.write_str("inference"),
            StageKind::Parse => f.write_str("parse"),
        }
    }
}

/// Configuration record for one pipeline stage.
///
/// A factory carries everything the engine needs to instantiate its stage:
/// device placement plus the stage-specific parameters. Instantiation
/// itself belongs to the engine.
pub trait StageFactory: Send + Sync + fmt::Debug {
    /// Which stage this factory produces.
    fn kind(&self) -> StageKind;

    /// Device the produced stage runs on.
    fn device(&self) -> DeviceType;

    /// Short stage name for logs.
    fn name(&self) -> &'static str;
}

/// Builder for one auxiliary network input, invoked once per video item.
///
/// Implementations hold no mutable state; concurrent invocation from
/// multiple engine workers is safe, and each call allocates, fills, and
/// returns independently. The returned buffer is owned solely by the caller.
pub trait AuxInputBuilder: Send + Sync + fmt::Debug {
    /// Name of the network input this builder feeds.
    fn input_name(&self) -> &str;

    /// Build the buffer for one item, returning it with its byte size.
    fn build(&self, item: &VideoItemMetadata) -> Result<(PipelineBuffer, usize), BufferError>;
}

/// The artifact of pipeline assembly: what the engine instantiates per run.
#[derive(Debug, Clone)]
pub struct PipelineDescription {
    /// Dataset columns the pipeline consumes, in order.
    pub input_columns: Vec<String>,
    /// Frame-selection policy.
    pub sampling: SamplingPolicy,
    /// Stage factories in execution order. Append-only; never reordered
    /// after assembly.
    pub stage_factories: Vec<Arc<dyn StageFactory>>,
}

impl PipelineDescription {
    /// Start a description from its input columns and sampling policy.
    #[must_use]
    pub fn new(input_columns: Vec<String>, sampling: SamplingPolicy) -> Self {
        Self {
            input_columns,
            sampling,
            stage_factories: Vec::with_capacity(4),
        }
    }

    /// Append a stage factory. Append order is execution order.
    pub fn push_stage(&mut self, factory: Arc<dyn StageFactory>) {
        self.stage_factories.push(factory);
    }

    /// Stage kinds in execution order.
    #[must_use]
    pub fn stage_kinds(&self) -> Vec<StageKind> {
        self.stage_factories.iter().map(|f| f.kind()).collect()
    }

    /// Check the structural invariants: at least one input column and at
    /// least one stage factory.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.input_columns.is_empty() {
            return Err(PipelineError::InvalidDescription(
                "no input columns".to_string(),
            ));
        }
        if self.stage_factories.is_empty() {
            return Err(PipelineError::InvalidDescription(
                "no stage factories".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct NullFactory(StageKind);

    impl StageFactory for NullFactory {
        fn kind(&self) -> StageKind {
            self.0
        }

        fn device(&self) -> DeviceType {
            DeviceType::Cpu
        }

        fn name(&self) -> &'static str {
            "null"
        }
    }

    #[test]
    fn test_validate_rejects_empty_description() {
        let desc = PipelineDescription::new(vec![], SamplingPolicy::All);
        assert!(matches!(
            desc.validate().unwrap_err(),
            PipelineError::InvalidDescription(_)
        ));

        let desc = PipelineDescription::new(vec!["frame".to_string()], SamplingPolicy::All);
        assert!(matches!(
            desc.validate().unwrap_err(),
            PipelineError::InvalidDescription(_)
        ));
    }

    #[test]
    fn test_stage_kinds_preserve_append_order() {
        let mut desc = PipelineDescription::new(
            vec!["frame".to_string()],
            SamplingPolicy::Strided { stride: 10 },
        );
        desc.push_stage(Arc::new(NullFactory(StageKind::Decode)));
        desc.push_stage(Arc::new(NullFactory(StageKind::Preprocess)));
        desc.push_stage(Arc::new(NullFactory(StageKind::Inference)));
        desc.push_stage(Arc::new(NullFactory(StageKind::Parse)));

        desc.validate().unwrap();
        assert_eq!(
            desc.stage_kinds(),
            vec![
                StageKind::Decode,
                StageKind::Preprocess,
                StageKind::Inference,
                StageKind::Parse
            ]
        );
    }

    #[test]
    fn test_sampling_policy_yaml_tag() {
        let yaml = serde_yaml::to_string(&SamplingPolicy::Strided { stride: 10 }).unwrap();
        assert!(yaml.contains("strided"));
        assert!(yaml.contains("stride: 10"));

        let back: SamplingPolicy = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, SamplingPolicy::Strided { stride: 10 });
    }
}
