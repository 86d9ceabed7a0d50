//! # volume-preview
//!
//! Turns volumetric scans into slice images and looping animations for quick
//! visual quality checks without a dedicated volume viewer.
//!
//! Volumes are read from NIfTI files (`.nii`, `.nii.gz`) or from directories
//! holding a DICOM series. Every volume is resampled to a cube with linear
//! interpolation, its intensities are rescaled to `[0, 1]`, and it is then
//! sliced in the three medical planes:
//!  - Axial (fixes the last axis)
//!  - Coronal (fixes the middle axis)
//!  - Sagittal (fixes the first axis)
//!
//! Each plane can be rotated by a multiple of 90 degrees. Per input the
//! pipeline writes one image per plane and index, composite images that pair
//! a moving slice with fixed mid-volume slices of the other planes, and GIF
//! animations, among them a synchronized one where all planes move together.
//!
//! Rank-4 (time series) volumes are detected and skipped.
//!
//! # Examples
//!
//! ## Rendering a single slice
//!
//! ```no_run
//! # use volume_preview::{Interpolator, Plane, Volume, VolumeLoader};
//! let raw = VolumeLoader::load("scan.nii.gz").expect("should have loaded the scan");
//! let volume = Volume::try_from(raw).expect("should be a 3D volume");
//! let volume = Interpolator::resample_to_cube(volume).normalized();
//! let slice = volume
//!     .get_slice_from_axis(volume.mid_index(Plane::Coronal), Plane::Coronal)
//!     .expect("mid index is always in range")
//!     .rotated(90);
//! slice.to_image().save("result.png").expect("should have written the image");
//! ```
//!
//! ## Processing a directory
//!
//! ```no_run
//! # use volume_preview::{PipelineConfig, run_batch};
//! # use std::path::Path;
//! let report = run_batch(Path::new("scans"), Path::new("out"), &PipelineConfig::default())
//!     .expect("should have listed the input directory");
//! println!("{} encoded, {} skipped", report.encoded(), report.skipped());
//! ```

pub mod animation;
pub mod composite;
pub mod config;
pub mod enums;
pub mod error;
pub mod interpolator;
pub mod pipeline;
pub mod render;
pub mod sequencer;
pub mod slice;
pub mod volume;
pub mod volume_loader;

pub use animation::{AnimationEncoder, AnimationParams, EncoderError, apply_stride};
pub use composite::{CompositeComposer, PlaneIndices};
pub use config::{PipelineConfig, PlaneRotations, RotationArg};
pub use enums::{Plane, SortBy};
pub use error::{PipelineError, PipelineResult};
pub use interpolator::Interpolator;
pub use pipeline::{
    BatchReport, FileStatus, FileSummary, OutputLayout, output_name, process_file, process_raw,
    run_batch,
};
pub use sequencer::{Frame, FrameSequencer};
pub use slice::{Slice, quarter_turns};
pub use volume::{RawVolume, Volume};
pub use volume_loader::{VolumeLoader, VolumeLoaderError};
