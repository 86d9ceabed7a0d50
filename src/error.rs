use thiserror::Error;

use crate::animation::EncoderError;
use crate::enums::Plane;
use crate::volume_loader::VolumeLoaderError;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("unsupported volume rank {0}, only 3D volumes are processed")]
    UnsupportedRank(usize),

    #[error("volume has an empty axis: {0:?}")]
    EmptyVolume(Vec<usize>),

    #[error("volume of shape {0:?} is not isotropic")]
    NotIsotropic((usize, usize, usize)),

    #[error("index {index} out of range for {plane} plane of length {len}")]
    IndexOutOfRange { plane: Plane, index: usize, len: usize },

    #[error("no source frames")]
    EmptyFrameSet,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("loader error: {0}")]
    Loader(#[from] VolumeLoaderError),

    #[error("encoder error: {0}")]
    Encoder(EncoderError),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<EncoderError> for PipelineError {
    fn from(err: EncoderError) -> Self {
        match err {
            EncoderError::NoSourceFrames => Self::EmptyFrameSet,
            other => Self::Encoder(other),
        }
    }
}
