use std::io::Write;
use std::sync::Arc;

use tempfile::NamedTempFile;
use video_pipeline_common::{DatasetMetadata, VideoItemMetadata};
use video_pipeline_core::{
    DeviceCapabilities, DevicePreference, DeviceSelection, DeviceType, EmulatedMemory,
    PipelineError, PipelineRegistry, SamplingPolicy, StageKind,
};
use video_pipeline_faster_rcnn::{assemble_with, AssemblyOptions, PIPELINE_NAME};

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

fn manifest_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(MANIFEST.as_bytes()).unwrap();
    file
}

fn dataset() -> DatasetMetadata {
    DatasetMetadata::new("traffic", vec!["frame".to_string()])
}

fn items() -> Vec<VideoItemMetadata> {
    vec![
        VideoItemMetadata::new(640, 480, 300),
        VideoItemMetadata::new(1920, 1080, 120),
    ]
}

const EXPECTED_KINDS: [StageKind; 4] = [
    StageKind::Decode,
    StageKind::Preprocess,
    StageKind::Inference,
    StageKind::Parse,
];

#[test]
fn host_assembly_produces_four_stages_in_order() {
    let manifest = manifest_file();
    let options = AssemblyOptions::host(manifest.path());

    let description = assemble_with(&options, &dataset(), &items()).unwrap();

    assert_eq!(description.input_columns, vec!["frame".to_string()]);
    assert_eq!(description.sampling, SamplingPolicy::Strided { stride: 10 });
    assert_eq!(description.stage_kinds(), EXPECTED_KINDS);

    let devices: Vec<DeviceType> = description
        .stage_factories
        .iter()
        .map(|f| f.device())
        .collect();
    assert_eq!(
        devices,
        vec![
            DeviceType::Cpu,
            DeviceType::Cpu,
            DeviceType::Cpu,
            DeviceType::Cpu
        ]
    );
}

#[test]
fn accelerated_assembly_keeps_the_same_stage_order() {
    let manifest = manifest_file();
    let options = AssemblyOptions::accelerated(manifest.path(), Arc::new(EmulatedMemory::new()));

    let description = assemble_with(&options, &dataset(), &items()).unwrap();

    assert_eq!(description.input_columns, vec!["frame".to_string()]);
    assert_eq!(description.sampling, SamplingPolicy::Strided { stride: 10 });
    assert_eq!(description.stage_kinds(), EXPECTED_KINDS);

    let devices: Vec<DeviceType> = description
        .stage_factories
        .iter()
        .map(|f| f.device())
        .collect();
    // Decode and inference move to the GPU; preprocessing arithmetic and
    // proposal parsing stay on the host.
    assert_eq!(
        devices,
        vec![
            DeviceType::Gpu,
            DeviceType::Cpu,
            DeviceType::Gpu,
            DeviceType::Cpu
        ]
    );
}

#[test]
fn assembly_is_idempotent() {
    let manifest = manifest_file();
    let options = AssemblyOptions::host(manifest.path());

    let first = assemble_with(&options, &dataset(), &items()).unwrap();
    let second = assemble_with(&options, &dataset(), &items()).unwrap();

    assert_eq!(first.input_columns, second.input_columns);
    assert_eq!(first.sampling, second.sampling);
    assert_eq!(first.stage_kinds(), second.stage_kinds());

    let names =
        |d: &video_pipeline_core::PipelineDescription| -> Vec<&'static str> {
            d.stage_factories.iter().map(|f| f.name()).collect()
        };
    assert_eq!(names(&first), names(&second));
}

#[test]
fn missing_descriptor_aborts_assembly() {
    let options = AssemblyOptions::host("nonexistent/faster_rcnn.yaml");
    let err = assemble_with(&options, &dataset(), &items()).unwrap_err();
    assert!(matches!(err, PipelineError::DescriptorRead { .. }));
}

#[test]
fn accelerated_request_without_capability_fails_resolution() {
    let caps = DeviceCapabilities { accelerated: false };
    let err = DeviceSelection::resolve(DevicePreference::Accelerated, &caps).unwrap_err();
    assert!(matches!(err, PipelineError::Configuration(_)));
}

#[test]
fn registry_assembles_by_name() {
    let manifest = manifest_file();
    let options = AssemblyOptions::host(manifest.path());

    let mut registry = PipelineRegistry::new();
    registry.register(
        PIPELINE_NAME,
        Arc::new(
            move |ds: &DatasetMetadata, it: &[VideoItemMetadata]| assemble_with(&options, ds, it),
        ),
    );

    let description = registry
        .assemble(PIPELINE_NAME, &dataset(), &items())
        .unwrap();
    assert_eq!(description.stage_kinds(), EXPECTED_KINDS);

    let err = registry
        .assemble("unknown_pipeline", &dataset(), &items())
        .unwrap_err();
    assert!(matches!(err, PipelineError::UnknownPipeline(_)));
}
