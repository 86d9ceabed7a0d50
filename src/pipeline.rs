//! Per-file processing and the batch entry point.
//!
//! One file moves through `Loaded -> Resampled -> Normalized ->
//! {SlicesRendered, FramesRendered} -> Encoded`. A volume that is not rank 3
//! stops right after loading and is reported as skipped.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, error, info, info_span, warn};

use crate::animation::AnimationEncoder;
use crate::composite::CompositeComposer;
use crate::config::PipelineConfig;
use crate::enums::Plane;
use crate::error::{PipelineError, PipelineResult};
use crate::interpolator::Interpolator;
use crate::sequencer::FrameSequencer;
use crate::volume::{RawVolume, Volume};
use crate::volume_loader::VolumeLoader;

const MIN_INDEX_WIDTH: usize = 4;
const STRIPPED_SUFFIXES: [&str; 4] = [".gz", ".nii", ".img", ".hdr"];

/// Where every artefact of one input file goes.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
    index_width: usize,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, edge_length: usize) -> Self {
        let digits = edge_length.saturating_sub(1).to_string().len();
        Self {
            root: root.into(),
            index_width: digits.max(MIN_INDEX_WIDTH),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn plane_dir(&self, plane: Plane) -> PathBuf {
        self.root.join(plane.name())
    }

    pub fn slice_path(&self, plane: Plane, index: usize) -> PathBuf {
        self.plane_dir(plane)
            .join(format!("{}_{}.png", plane.name(), self.padded(index)))
    }

    pub fn composite_dir(&self) -> PathBuf {
        self.root.join("composite")
    }

    /// `position` is the reference plane's place in the requested order, so
    /// name order groups composites by reference plane.
    pub fn composite_path(&self, position: usize, reference: Plane, index: usize) -> PathBuf {
        self.composite_dir().join(format!(
            "{position}_{}_{}.png",
            reference.name(),
            self.padded(index)
        ))
    }

    pub fn animation_dir(&self) -> PathBuf {
        self.root.join("animations")
    }

    pub fn animation_path(&self, name: &str) -> PathBuf {
        self.animation_dir().join(format!("{name}.gif"))
    }

    fn padded(&self, index: usize) -> String {
        format!("{index:0width$}", width = self.index_width)
    }
}

/// What came out of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSummary {
    pub edge_length: usize,
    pub slice_images: usize,
    pub composite_images: usize,
    pub animations: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileStatus {
    Encoded(FileSummary),
    Skipped(String),
    Failed(String),
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub files: Vec<(PathBuf, FileStatus)>,
}

impl BatchReport {
    fn count(&self, pred: impl Fn(&FileStatus) -> bool) -> usize {
        self.files.iter().filter(|(_, status)| pred(status)).count()
    }

    pub fn encoded(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Encoded(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Failed(_)))
    }
}

/// Output directory name for `path`: the file name with trailing
/// `.gz`/`.nii`/`.img`/`.hdr` suffixes removed.
pub fn output_name(path: &Path) -> String {
    let mut name = path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    while let Some(stripped) = STRIPPED_SUFFIXES.iter().find_map(|suffix| {
        let lower = name.to_ascii_lowercase();
        lower
            .ends_with(suffix)
            .then(|| name[..name.len() - suffix.len()].to_string())
    }) {
        if stripped.is_empty() {
            break;
        }
        name = stripped;
    }
    name
}

/// Load `path` and run it through the pipeline into `output_root/<name>/`.
pub fn process_file(
    path: &Path,
    output_root: &Path,
    config: &PipelineConfig,
) -> PipelineResult<FileStatus> {
    let span = info_span!("file", path = %path.display());
    let _guard = span.enter();

    let raw = VolumeLoader::load(path)?;
    info!(shape = ?raw.data.shape(), "loaded");
    process_raw(raw, &output_root.join(output_name(path)), config)
}

/// Run an already loaded volume through the pipeline into `output_dir`.
pub fn process_raw(
    raw: RawVolume,
    output_dir: &Path,
    config: &PipelineConfig,
) -> PipelineResult<FileStatus> {
    let volume = match Volume::try_from(raw) {
        Ok(volume) => volume,
        Err(PipelineError::UnsupportedRank(rank)) => {
            warn!(rank, "skipping volume, only 3D volumes are processed");
            return Ok(FileStatus::Skipped(format!("unsupported rank {rank}")));
        }
        Err(err) => return Err(err),
    };

    let volume = Interpolator::resample_to_cube(volume);
    info!(dim = ?volume.dim(), "resampled");
    let volume = volume.normalized();
    info!("normalized");

    let edge_length = volume.dim().0;
    let layout = OutputLayout::new(output_dir, edge_length);
    fs::create_dir_all(layout.root())?;

    let slice_images = write_slice_images(&volume, &layout, config)?;
    let composite_images = write_composites(&volume, &layout, config)?;
    info!(slice_images, composite_images, "slices rendered");

    let mut animations = Vec::new();
    for &plane in &config.planes {
        let out = layout.animation_path(plane.name());
        let encoded = AnimationEncoder::encode_directory(
            &layout.plane_dir(plane),
            &out,
            &config.slice_animation,
        );
        record_animation(encoded.map_err(PipelineError::from), out, &mut animations)?;
    }

    let out = layout.animation_path("composite");
    let encoded = AnimationEncoder::encode_directory(
        &layout.composite_dir(),
        &out,
        &config.composite_animation,
    );
    record_animation(encoded.map_err(PipelineError::from), out, &mut animations)?;

    let out = layout.animation_path("synchronized");
    let encoded = encode_synchronized(&volume, &out, config);
    info!("frames rendered");
    record_animation(encoded, out, &mut animations)?;

    info!(animations = animations.len(), "encoded");
    Ok(FileStatus::Encoded(FileSummary {
        edge_length,
        slice_images,
        composite_images,
        animations,
    }))
}

/// Walk `input_dir` in file name order and process every entry.
///
/// Files are treated as NIfTI, directories as DICOM series. Failures are
/// recorded per file unless `config.fail_fast` is set.
pub fn run_batch(
    input_dir: &Path,
    output_dir: &Path,
    config: &PipelineConfig,
) -> PipelineResult<BatchReport> {
    let mut entries: Vec<PathBuf> = fs::read_dir(input_dir)?
        .filter_map(Result::ok)
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .map(|entry| entry.path())
        .collect();
    entries.sort();
    if let Some(max) = config.max_files {
        entries.truncate(max);
    }
    info!(count = entries.len(), input = %input_dir.display(), "starting batch");

    let mut report = BatchReport::default();
    for path in entries {
        let status = match process_file(&path, output_dir, config) {
            Ok(status) => status,
            Err(err) if config.fail_fast => {
                error!(path = %path.display(), %err, "aborting batch");
                return Err(err);
            }
            Err(err) => {
                error!(path = %path.display(), %err, "file failed");
                FileStatus::Failed(err.to_string())
            }
        };
        report.files.push((path, status));
    }

    info!(
        encoded = report.encoded(),
        skipped = report.skipped(),
        failed = report.failed(),
        "batch finished"
    );
    Ok(report)
}

fn write_slice_images(
    volume: &Volume,
    layout: &OutputLayout,
    config: &PipelineConfig,
) -> PipelineResult<usize> {
    let mut written = 0;
    for &plane in &config.planes {
        reset_dir(&layout.plane_dir(plane))?;
        let angle = config.rotations.get(plane);
        let len = volume.len_along(plane);
        (0..len)
            .into_par_iter()
            .try_for_each(|index| -> PipelineResult<()> {
                let slice = volume.get_slice_from_axis(index, plane)?.rotated(angle);
                slice.to_image().save(layout.slice_path(plane, index))?;
                Ok(())
            })?;
        written += len;
    }
    Ok(written)
}

fn write_composites(
    volume: &Volume,
    layout: &OutputLayout,
    config: &PipelineConfig,
) -> PipelineResult<usize> {
    reset_dir(&layout.composite_dir())?;
    let composer = CompositeComposer::new(volume, &config.planes, config.rotations);
    let mut written = 0;
    for (position, &reference) in config.planes.iter().enumerate() {
        let len = composer.len(reference);
        (0..len)
            .into_par_iter()
            .try_for_each(|index| -> PipelineResult<()> {
                let image = composer.compose(reference, index)?;
                image.save(layout.composite_path(position, reference, index))?;
                Ok(())
            })?;
        written += len;
    }
    Ok(written)
}

fn encode_synchronized(
    volume: &Volume,
    out: &Path,
    config: &PipelineConfig,
) -> PipelineResult<usize> {
    let sequencer = FrameSequencer::new(volume, &config.planes, config.rotations)?;
    let mut failed = None;
    let frames = sequencer.frames().map_while(|frame| match frame {
        Ok(frame) => Some(frame.render()),
        Err(err) => {
            failed = Some(err);
            None
        }
    });
    let encoded = AnimationEncoder::encode_frames(frames, out, &config.synchronized_animation);
    if let Some(err) = failed {
        return Err(err);
    }
    Ok(encoded?)
}

/// Empty `dir`, so animations built from it only see this run's images.
fn reset_dir(dir: &Path) -> PipelineResult<()> {
    if dir.exists() {
        debug!(dir = %dir.display(), "clearing images from an earlier run");
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

/// Keep the path of a written animation; an empty frame set is only a skip.
fn record_animation(
    result: PipelineResult<usize>,
    out: PathBuf,
    animations: &mut Vec<PathBuf>,
) -> PipelineResult<()> {
    match result {
        Ok(_) => {
            animations.push(out);
            Ok(())
        }
        Err(PipelineError::EmptyFrameSet) => {
            warn!(path = %out.display(), "no source frames, animation skipped");
            Ok(())
        }
        Err(err) => Err(err),
    }
}
