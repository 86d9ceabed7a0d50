use crate::enums::Plane;
use crate::error::{PipelineError, PipelineResult};
use crate::slice::Slice;

use std::cmp::Ordering;

use ndarray::{Array3, ArrayD, Axis, Ix3};
use tracing::debug;

/// Loader output before any rank check.
///
/// `spacing` holds one entry per axis of `data` when the source carries it.
#[derive(Debug, Clone)]
pub struct RawVolume {
    pub data: ArrayD<f32>,
    pub spacing: Vec<f32>,
}

impl RawVolume {
    pub fn new(data: ArrayD<f32>, spacing: Vec<f32>) -> Self {
        Self { data, spacing }
    }

    pub fn rank(&self) -> usize {
        self.data.ndim()
    }
}

/// A rank-3 scan in `(x, y, z)` axis order.
///
/// Every processing step consumes the volume and hands back a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    pub data: Array3<f32>,
    pub spacing: (f32, f32, f32),
}

impl Volume {
    pub fn new(data: Array3<f32>, spacing: (f32, f32, f32)) -> Self {
        Self { data, spacing }
    }

    /// Get the dimensions of the volume (x, y, z)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }

    /// Number of slices available in `plane`.
    pub fn len_along(&self, plane: Plane) -> usize {
        self.data.len_of(Axis(plane.axis()))
    }

    pub fn is_isotropic(&self) -> bool {
        let (x, y, z) = self.dim();
        x == y && y == z
    }

    /// Shared edge length of a cubic volume.
    pub fn edge_length(&self) -> Option<usize> {
        self.is_isotropic().then(|| self.dim().0)
    }

    /// Fixed mid-volume index used for the non-moving composite panels.
    pub fn mid_index(&self, plane: Plane) -> usize {
        self.len_along(plane) / 2
    }

    /// Global `(min, max)` over all samples, NaNs ignored.
    pub fn intensity_range(&self) -> (f32, f32) {
        self.data.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
    }

    /// Rescale intensities to `[0, 1]`.
    ///
    /// A constant volume comes back untouched.
    pub fn normalized(self) -> Self {
        let (min, max) = self.intensity_range();
        if max.partial_cmp(&min) != Some(Ordering::Greater) {
            debug!(min, max, "degenerate intensity range, skipping normalization");
            return self;
        }
        let range = max - min;
        let Volume { mut data, spacing } = self;
        data.par_mapv_inplace(|v| (v - min) / range);
        Volume { data, spacing }
    }

    /// Slice at `index`, fixing the axis bound to `plane`.
    ///
    /// The remaining two axes keep their natural order.
    pub fn get_slice_from_axis(&self, index: usize, plane: Plane) -> PipelineResult<Slice<'_>> {
        let len = self.len_along(plane);
        if index >= len {
            return Err(PipelineError::IndexOutOfRange { plane, index, len });
        }
        let view = self.data.index_axis(Axis(plane.axis()), index);
        Ok(Slice::new(view, plane, index))
    }
}

impl TryFrom<RawVolume> for Volume {
    type Error = PipelineError;

    fn try_from(raw: RawVolume) -> Result<Self, Self::Error> {
        let rank = raw.rank();
        if rank != 3 {
            return Err(PipelineError::UnsupportedRank(rank));
        }
        let shape = raw.data.shape().to_vec();
        if shape.contains(&0) {
            return Err(PipelineError::EmptyVolume(shape));
        }
        let data = raw
            .data
            .into_dimensionality::<Ix3>()
            .map_err(|_| PipelineError::UnsupportedRank(rank))?;
        let spacing_at = |i: usize| {
            raw.spacing
                .get(i)
                .copied()
                .filter(|s| s.is_finite() && *s > 0.0)
                .unwrap_or(1.0)
        };
        Ok(Volume::new(data, (spacing_at(0), spacing_at(1), spacing_at(2))))
    }
}
