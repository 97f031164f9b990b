use std::path::Path;

use heat_distance::parsers::{MgzParser, PREAMBLE_SIZE, VolumeHeader, VoxelType, gunzip};
use heat_distance::performance::PerformanceStore;
use heat_distance::utils::parser::{VolumeParser, VolumePayload};
use heat_distance::{ErrorKind, Grid, LabelSets, RunConfig, SolverParams, run};

const SHAPE: [usize; 3] = [5, 5, 5];

/// k=0 为标签 1，k=4 为标签 2，k=1..3 的内部为标签 3，侧壁为 0
fn slab_labels() -> Grid<u8> {
    let mut labels = Grid::filled(SHAPE, 0u8);
    for k in 0..5 {
        for j in 0..5 {
            for i in 0..5 {
                let label = match k {
                    0 => 1,
                    4 => 2,
                    _ if (1..4).contains(&i) && (1..4).contains(&j) => 3,
                    _ => 0,
                };
                labels.set(i, j, k, label);
            }
        }
    }
    labels
}

fn write_input(dir: &Path) -> String {
    let path = dir.join("slab.mgz");
    let mut header = VolumeHeader::new(SHAPE, VoxelType::Uchar);
    header.good_ras_flag = 1;
    header.voxel_size = [1.0, 1.0, 1.0];
    header.dof = 7;
    MgzParser::new()
        .write_to_file(&path, &VolumePayload::Labels(&slab_labels()), &header)
        .unwrap();
    path.to_str().unwrap().to_string()
}

fn config(input: String, out: &Path) -> RunConfig {
    let mut config = RunConfig::new(
        input,
        LabelSets {
            low: vec![1],
            high: vec![2],
            simulate: vec![3],
        },
    );
    config.solver = SolverParams {
        omega: 0.1,
        iterations: 600,
        show_all: false,
    };
    config.output_dir = Some(out.to_path_buf());
    config
}

fn read_i32(bytes: &[u8], offset: usize) -> i32 {
    i32::from_be_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

fn float_payload(bytes: &[u8]) -> Vec<f32> {
    bytes[PREAMBLE_SIZE..]
        .chunks_exact(4)
        .map(|c| f32::from_be_bytes(c.try_into().unwrap()))
        .collect()
}

#[test]
fn full_run_writes_all_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());
    let mut cfg = config(input, dir.path());
    cfg.segments = Some(3);
    cfg.gradient = true;

    let perf = PerformanceStore::new();
    let outputs = run(&cfg, &perf).unwrap();

    assert_eq!(outputs.shape, SHAPE);
    assert_eq!(outputs.simulated_voxels, 27);
    assert!(outputs.temperature.ends_with("slab_temperature.mgz"));

    // 温度场: float，单帧，文件头沿用输入
    let temperature = gunzip(&std::fs::read(&outputs.temperature).unwrap()).unwrap();
    assert_eq!(read_i32(&temperature, 4), 5);
    assert_eq!(read_i32(&temperature, 16), 1);
    assert_eq!(read_i32(&temperature, 20), 3);
    assert_eq!(read_i32(&temperature, 24), 7);
    let field = Grid::new(SHAPE, float_payload(&temperature)).unwrap();
    let expected = [0.0325f32, 0.055, 0.0775];
    for k in 1..4 {
        let value = *field.get(2, 2, k).unwrap();
        assert!((value - expected[k - 1]).abs() < 1e-5, "k={k}: {value}");
    }
    assert_eq!(*field.get(2, 2, 0).unwrap(), 0.0);

    // 距离分段: uint8，每一层一个标签，冷端为 1
    let label_path = outputs.label.unwrap();
    let (segments, header) = MgzParser::new().parse_from_file(&label_path).unwrap();
    assert_eq!(header.datatype, VoxelType::Uchar);
    assert_eq!(header.voxel_size, [1.0, 1.0, 1.0]);
    let layer = |k: usize| *segments.get(2, 2, k).unwrap();
    assert_eq!(layer(0), 0);
    assert_eq!(layer(1), 1);
    assert!(layer(1) <= layer(2) && layer(2) <= layer(3));
    assert!(layer(3) > layer(1));
    assert!((1..=3).contains(&layer(3)));

    // 梯度: 三帧 float，侧壁与两端为 0
    let gradient = gunzip(&std::fs::read(outputs.gradient.unwrap()).unwrap()).unwrap();
    assert_eq!(read_i32(&gradient, 16), 3);
    assert_eq!(read_i32(&gradient, 20), 3);
    let frames = float_payload(&gradient);
    assert_eq!(frames.len(), 3 * 125);
    let voxel = field.index(2, 2, 2);
    assert!(frames[voxel].abs() < 1e-6);
    assert!((frames[2 * 125 + voxel] - 0.0225).abs() < 1e-5);
    assert_eq!(frames[2 * 125 + field.index(2, 2, 0)], 0.0);

    let groups: Vec<String> = perf
        .get_records()
        .into_iter()
        .map(|r| r.channel_group)
        .collect();
    assert!(groups.contains(&"simulate".to_string()));
    assert_eq!(groups.iter().filter(|g| *g == "write").count(), 3);
}

#[test]
fn distance_output_is_optional() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());
    let mut cfg = config(input, dir.path());
    cfg.solver.iterations = 5;

    let outputs = run(&cfg, &PerformanceStore::new()).unwrap();
    assert!(outputs.label.is_none());
    assert!(outputs.gradient.is_none());
    assert!(outputs.temperature.exists());
    assert!(!dir.path().join("slab_label.mgz").exists());
}

#[test]
fn single_segment_labels_every_simulated_voxel_one() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(dir.path());
    let mut cfg = config(input, dir.path());
    cfg.solver.iterations = 10;
    cfg.segments = Some(1);

    let outputs = run(&cfg, &PerformanceStore::new()).unwrap();
    let (segments, _) = MgzParser::new()
        .parse_from_file(&outputs.label.unwrap())
        .unwrap();
    let labels = slab_labels();
    for (segment, label) in segments.get_data().iter().zip(labels.get_data()) {
        let expected = if *label == 3 { 1 } else { 0 };
        assert_eq!(*segment, expected);
    }
}

#[test]
fn configuration_errors_stop_before_reading() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config("does-not-exist.mgz".to_string(), dir.path());
    cfg.segments = Some(0);
    let err = run(&cfg, &PerformanceStore::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn missing_input_is_resource_error() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = config(
        dir.path().join("missing.mgz").to_str().unwrap().to_string(),
        dir.path(),
    );
    let err = run(&cfg, &PerformanceStore::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Resource);
}

#[test]
fn bad_version_is_format_error_and_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.mgh");
    let mut header = VolumeHeader::new(SHAPE, VoxelType::Uchar);
    header.version = 3;
    heat_distance::parsers::MghParser::new()
        .write_to_file(&path, &VolumePayload::Labels(&slab_labels()), &header)
        .unwrap();

    let cfg = config(path.to_str().unwrap().to_string(), dir.path());
    let err = run(&cfg, &PerformanceStore::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
    assert!(!dir.path().join("broken_temperature.mgh").exists());
}

#[test]
fn unsupported_extension_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("labels.nii");
    std::fs::write(&path, [0u8; 300]).unwrap();
    let cfg = config(path.to_str().unwrap().to_string(), dir.path());
    let err = run(&cfg, &PerformanceStore::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}
