//! End-to-end runs of the pipeline on synthetic volumes.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use image::AnimationDecoder;
use image::codecs::gif::GifDecoder;
use ndarray::{Array3, Array4, ArrayD, IxDyn};
use nifti::writer::WriterOptions;
use volume_preview::{
    FileStatus, PipelineConfig, PipelineError, Plane, RawVolume, process_raw, run_batch,
};

fn gradient(shape: (usize, usize, usize)) -> Array3<f32> {
    Array3::from_shape_fn(shape, |(i, j, k)| (i * 7 + j * 3 + k) as f32)
}

fn gif_frames(path: &Path) -> Vec<image::Frame> {
    let reader = BufReader::new(File::open(path).unwrap());
    GifDecoder::new(reader)
        .unwrap()
        .into_frames()
        .collect_frames()
        .unwrap()
}

fn png_count(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "png"))
        .count()
}

#[test]
fn anisotropic_volume_produces_full_output_tree() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("scan");
    let raw = RawVolume::new(gradient((4, 6, 5)).into_dyn(), vec![1.5, 1.0, 1.2]);
    let config = PipelineConfig {
        rotations: volume_preview::PlaneRotations::default().with(Plane::Sagittal, 90),
        ..Default::default()
    };

    let status = process_raw(raw, &out, &config).unwrap();
    let FileStatus::Encoded(summary) = status else {
        panic!("expected encoded status, got {status:?}");
    };
    assert_eq!(summary.edge_length, 6);
    assert_eq!(summary.slice_images, 18);
    assert_eq!(summary.composite_images, 18);
    assert_eq!(summary.animations.len(), 5);

    for plane in Plane::ALL {
        assert_eq!(png_count(&out.join(plane.name())), 6);
    }
    assert!(out.join("axial/axial_0000.png").is_file());
    assert!(out.join("axial/axial_0005.png").is_file());
    assert!(out.join("composite/0_axial_0000.png").is_file());
    assert!(out.join("composite/2_coronal_0005.png").is_file());
    assert_eq!(png_count(&out.join("composite")), 18);

    let slice = image::open(out.join("sagittal/sagittal_0003.png")).unwrap();
    assert_eq!((slice.width(), slice.height()), (6, 6));

    // per-plane and composite animations keep every second frame
    assert_eq!(gif_frames(&out.join("animations/axial.gif")).len(), 3);
    assert_eq!(gif_frames(&out.join("animations/coronal.gif")).len(), 3);
    assert_eq!(gif_frames(&out.join("animations/composite.gif")).len(), 9);

    let synchronized = gif_frames(&out.join("animations/synchronized.gif"));
    assert_eq!(synchronized.len(), 6);
    assert_eq!(synchronized[0].delay().numer_denom_ms(), (80, 1));
    let per_plane = gif_frames(&out.join("animations/axial.gif"));
    assert_eq!(per_plane[0].delay().numer_denom_ms(), (100, 1));
}

#[test]
fn requested_plane_subset_limits_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("scan");
    let raw = RawVolume::new(gradient((3, 3, 3)).into_dyn(), vec![]);
    let config = PipelineConfig {
        planes: vec![Plane::Coronal],
        ..Default::default()
    };

    let FileStatus::Encoded(summary) = process_raw(raw, &out, &config).unwrap() else {
        panic!("expected encoded status");
    };
    assert_eq!(summary.slice_images, 3);
    assert!(!out.join("axial").exists());
    assert!(out.join("animations/coronal.gif").is_file());
    assert!(!out.join("animations/axial.gif").exists());
}

#[test]
fn rerun_into_same_output_only_animates_new_images() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("scan");
    let raw = || RawVolume::new(gradient((4, 4, 4)).into_dyn(), vec![]);

    process_raw(raw(), &out, &PipelineConfig::default()).unwrap();
    assert_eq!(png_count(&out.join("composite")), 12);

    let config = PipelineConfig {
        planes: vec![Plane::Coronal],
        ..Default::default()
    };
    process_raw(raw(), &out, &config).unwrap();
    assert_eq!(png_count(&out.join("composite")), 4);
    assert_eq!(png_count(&out.join("coronal")), 4);
    assert_eq!(gif_frames(&out.join("animations/composite.gif")).len(), 2);
    assert_eq!(gif_frames(&out.join("animations/coronal.gif")).len(), 2);
}

#[test]
fn rank_four_volume_is_skipped_before_any_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("timeseries");
    let raw = RawVolume::new(ArrayD::zeros(IxDyn(&[3, 3, 3, 2])), vec![1.0; 4]);

    let status = process_raw(raw, &out, &PipelineConfig::default()).unwrap();
    assert!(matches!(status, FileStatus::Skipped(_)));
    assert!(!out.exists());
}

#[test]
fn constant_volume_still_renders() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("flat");
    let raw = RawVolume::new(ArrayD::from_elem(IxDyn(&[2, 2, 2]), 0.25), vec![]);

    let status = process_raw(raw, &out, &PipelineConfig::default()).unwrap();
    assert!(matches!(status, FileStatus::Encoded(_)));
    let slice = image::open(out.join("axial/axial_0000.png"))
        .unwrap()
        .into_luma8();
    assert!(slice.pixels().all(|p| p[0] == 64));
}

#[test]
fn batch_isolates_failures_and_names_outputs() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    WriterOptions::new(input.path().join("a_scan.nii.gz"))
        .write_nifti(&gradient((3, 4, 3)))
        .unwrap();
    WriterOptions::new(input.path().join("b_timeseries.nii"))
        .write_nifti(&Array4::<f32>::zeros((2, 2, 2, 3)))
        .unwrap();
    std::fs::write(input.path().join("c_broken.nii"), b"not a volume").unwrap();

    let report = run_batch(input.path(), output.path(), &PipelineConfig::default()).unwrap();
    assert_eq!(report.files.len(), 3);
    assert!(matches!(report.files[0].1, FileStatus::Encoded(_)));
    assert!(matches!(report.files[1].1, FileStatus::Skipped(_)));
    assert!(matches!(report.files[2].1, FileStatus::Failed(_)));
    assert_eq!((report.encoded(), report.skipped(), report.failed()), (1, 1, 1));

    assert!(output.path().join("a_scan/axial/axial_0003.png").is_file());
    assert!(!output.path().join("b_timeseries").exists());
}

#[test]
fn batch_fail_fast_and_limit() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    std::fs::write(input.path().join("a_broken.nii"), b"not a volume").unwrap();
    WriterOptions::new(input.path().join("b_scan.nii"))
        .write_nifti(&gradient((2, 2, 2)))
        .unwrap();

    let config = PipelineConfig {
        fail_fast: true,
        ..Default::default()
    };
    assert!(matches!(
        run_batch(input.path(), output.path(), &config),
        Err(PipelineError::Loader(_))
    ));
    assert!(!output.path().join("b_scan").exists());

    let config = PipelineConfig {
        max_files: Some(1),
        ..Default::default()
    };
    let report = run_batch(input.path(), output.path(), &config).unwrap();
    assert_eq!(report.files.len(), 1);
    assert_eq!(report.failed(), 1);
}
