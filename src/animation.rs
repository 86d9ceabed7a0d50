//! Looping GIF animations from ordered frame sequences.
//!
//! Stride is applied before anything is written: every `stride`-th frame is
//! kept in its original order. An empty sequence never creates a file.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, DynamicImage, Frame, GrayImage, ImageError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum EncoderError {
    #[error("no source frames")]
    NoSourceFrames,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] ImageError),
}

/// Playback parameters of one animation.
///
/// Each animation kind has its own timing and stride, so a configured entry
/// must name both; only `loop_count` may be left out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationParams {
    pub frame_duration_ms: u32,
    /// 0 loops forever.
    #[serde(default)]
    pub loop_count: u16,
    pub stride: usize,
}

impl AnimationParams {
    pub fn new(frame_duration_ms: u32, stride: usize) -> Self {
        Self {
            frame_duration_ms,
            loop_count: 0,
            stride,
        }
    }
}

impl Default for AnimationParams {
    fn default() -> Self {
        Self::new(100, 1)
    }
}

/// Keep every `stride`-th item, starting with the first.
pub fn apply_stride<T>(
    frames: impl IntoIterator<Item = T>,
    stride: usize,
) -> impl Iterator<Item = T> {
    frames.into_iter().step_by(stride.max(1))
}

pub struct AnimationEncoder;

impl AnimationEncoder {
    /// Encode `frames` into a looping GIF at `output`.
    ///
    /// Returns the number of frames written after striding.
    pub fn encode_frames<I>(
        frames: I,
        output: &Path,
        params: &AnimationParams,
    ) -> Result<usize, EncoderError>
    where
        I: IntoIterator<Item = GrayImage>,
    {
        let mut frames = apply_stride(frames, params.stride).peekable();
        if frames.peek().is_none() {
            return Err(EncoderError::NoSourceFrames);
        }
        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)?;
        }

        let writer = BufWriter::new(File::create(output)?);
        let mut encoder = GifEncoder::new(writer);
        encoder.set_repeat(match params.loop_count {
            0 => Repeat::Infinite,
            n => Repeat::Finite(n),
        })?;

        let delay = Delay::from_numer_denom_ms(params.frame_duration_ms, 1);
        let mut written = 0;
        for image in frames {
            let rgba = DynamicImage::ImageLuma8(image).into_rgba8();
            encoder.encode_frame(Frame::from_parts(rgba, 0, 0, delay))?;
            written += 1;
        }
        info!(
            path = %output.display(),
            frames = written,
            duration_ms = params.frame_duration_ms,
            stride = params.stride,
            "animation written"
        );
        Ok(written)
    }

    /// Encode every image in `dir`, in lexicographic file name order.
    pub fn encode_directory(
        dir: &Path,
        output: &Path,
        params: &AnimationParams,
    ) -> Result<usize, EncoderError> {
        let paths = Self::source_frames(dir)?;
        debug!(dir = %dir.display(), count = paths.len(), "collected source frames");

        let kept: Vec<PathBuf> = apply_stride(paths, params.stride).collect();
        if kept.is_empty() {
            return Err(EncoderError::NoSourceFrames);
        }
        let images = kept
            .iter()
            .map(|path| image::open(path).map(|img| img.into_luma8()))
            .collect::<Result<Vec<_>, _>>()?;

        let stride_applied = AnimationParams { stride: 1, ..*params };
        Self::encode_frames(images, output, &stride_applied)
    }

    /// PNG files directly inside `dir`, sorted by name. A missing directory
    /// has no frames.
    pub fn source_frames(dir: &Path) -> Result<Vec<PathBuf>, EncoderError> {
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut paths: Vec<_> = fs::read_dir(dir)?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .and_then(|s| s.to_str())
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
            })
            .collect();
        paths.sort();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{AnimationDecoder, Luma, codecs::gif::GifDecoder};
    use proptest::prelude::*;
    use std::io::BufReader;

    fn frame(value: u8) -> GrayImage {
        GrayImage::from_pixel(4, 3, Luma([value]))
    }

    fn decode(path: &Path) -> Vec<image::Frame> {
        let reader = BufReader::new(File::open(path).unwrap());
        GifDecoder::new(reader)
            .unwrap()
            .into_frames()
            .collect_frames()
            .unwrap()
    }

    #[test]
    fn stride_two_keeps_even_indices() {
        let kept: Vec<_> = apply_stride(0..10, 2).collect();
        assert_eq!(kept, vec![0, 2, 4, 6, 8]);
    }

    #[test]
    fn empty_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.gif");
        let err = AnimationEncoder::encode_frames(Vec::new(), &output, &AnimationParams::default())
            .unwrap_err();
        assert!(matches!(err, EncoderError::NoSourceFrames));
        assert!(!output.exists());
    }

    #[test]
    fn empty_directory_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("anim").join("out.gif");
        let params = AnimationParams::new(100, 2);
        let err = AnimationEncoder::encode_directory(dir.path(), &output, &params).unwrap_err();
        assert!(matches!(err, EncoderError::NoSourceFrames));
        assert!(!output.exists());
    }

    #[test]
    fn frames_keep_order_and_timing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.gif");
        let params = AnimationParams::new(80, 2);
        let frames: Vec<_> = (0..5u8).map(|i| frame(i * 50)).collect();

        let written = AnimationEncoder::encode_frames(frames, &output, &params).unwrap();
        assert_eq!(written, 3);

        let decoded = decode(&output);
        assert_eq!(decoded.len(), 3);
        let firsts: Vec<u8> = decoded.iter().map(|f| f.buffer().get_pixel(0, 0)[0]).collect();
        assert_eq!(firsts, vec![0, 100, 200]);
        assert_eq!(decoded[0].delay().numer_denom_ms(), (80, 1));
    }

    #[test]
    fn directory_frames_follow_file_name_order() {
        let dir = tempfile::tempdir().unwrap();
        for (name, value) in [("b_0001.png", 30u8), ("b_0000.png", 10), ("b_0002.png", 90)] {
            frame(value).save(dir.path().join(name)).unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let output = dir.path().join("anim.gif");

        let written =
            AnimationEncoder::encode_directory(dir.path(), &output, &AnimationParams::new(100, 1))
                .unwrap();
        assert_eq!(written, 3);
        let firsts: Vec<u8> = decode(&output)
            .iter()
            .map(|f| f.buffer().get_pixel(0, 0)[0])
            .collect();
        assert_eq!(firsts, vec![10, 30, 90]);
    }

    proptest! {
        #[test]
        fn stride_preserves_relative_order(len in 0usize..50, stride in 1usize..7) {
            let kept: Vec<_> = apply_stride(0..len, stride).collect();
            prop_assert_eq!(kept.len(), len.div_ceil(stride));
            prop_assert!(kept.windows(2).all(|w| w[1] - w[0] == stride));
        }
    }
}
