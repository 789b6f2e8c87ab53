//! Pipeline registration and assembly by name

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};
use video_pipeline_common::{DatasetMetadata, VideoItemMetadata};

use crate::description::PipelineDescription;
use crate::error::PipelineError;

/// Assembly function registered under a pipeline name.
pub type AssemblyFn = dyn Fn(&DatasetMetadata, &[VideoItemMetadata]) -> Result<PipelineDescription, PipelineError>
    + Send
    + Sync;

/// Registry of named pipelines, populated once at process startup.
#[derive(Default)]
pub struct PipelineRegistry {
    pipelines: HashMap<String, Arc<AssemblyFn>>,
}

impl PipelineRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pipelines: HashMap::new(),
        }
    }

    /// Register an assembly function under `name`.
    ///
    /// Re-registering a name replaces the previous entry.
    pub fn register(&mut self, name: impl Into<String>, assemble: Arc<AssemblyFn>) {
        let name = name.into();
        info!("registering pipeline: {name}");
        self.pipelines.insert(name, assemble);
    }

    /// Assemble the named pipeline against the given dataset.
    ///
    /// The returned description has passed its structural validation.
    pub fn assemble(
        &self,
        name: &str,
        dataset: &DatasetMetadata,
        items: &[VideoItemMetadata],
    ) -> Result<PipelineDescription, PipelineError> {
        let assemble = self
            .pipelines
            .get(name)
            .ok_or_else(|| PipelineError::UnknownPipeline(name.to_string()))?;

        debug!("assembling pipeline: {name}");
        let description = assemble(dataset, items)?;
        description.validate()?;
        Ok(description)
    }

    /// Names of all registered pipelines, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.pipelines.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether a pipeline is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.pipelines.contains_key(name)
    }
}
