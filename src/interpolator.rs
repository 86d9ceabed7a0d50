use crate::volume::Volume;

use ndarray::{Array3, Axis, Zip};
use rayon::prelude::*;
use tracing::{debug, instrument};

/// Resamples anisotropic volumes to a cube with linear interpolation.
///
/// Output sample `o` along an axis of length `n` resampled to `m` reads the
/// source at `o * (n - 1) / (m - 1)`, so both end samples are kept in place.
/// The three axes are interpolated one after another, which is the same as
/// trilinear interpolation.
pub struct Interpolator;

impl Interpolator {
    /// Edge length of the resampled cube: the longest axis.
    pub fn get_cubic_dimensions(original_dim: (usize, usize, usize)) -> (usize, usize, usize) {
        let (x, y, z) = original_dim;
        let m = x.max(y).max(z);
        (m, m, m)
    }

    /// Per-axis zoom factor `m / axis_length`.
    pub fn scale_factors(original_dim: (usize, usize, usize)) -> (f64, f64, f64) {
        let (m, _, _) = Self::get_cubic_dimensions(original_dim);
        let (x, y, z) = original_dim;
        (
            m as f64 / x as f64,
            m as f64 / y as f64,
            m as f64 / z as f64,
        )
    }

    #[instrument(skip(volume), fields(dim = ?volume.dim()))]
    pub fn resample_to_cube(volume: Volume) -> Volume {
        let original_dim = volume.dim();
        let (m, _, _) = Self::get_cubic_dimensions(original_dim);
        debug!(
            edge = m,
            scale = ?Self::scale_factors(original_dim),
            "resampling to cube"
        );

        let Volume { data, spacing } = volume;
        let data = Self::resample_axis(data, Axis(0), m);
        let data = Self::resample_axis(data, Axis(1), m);
        let data = Self::resample_axis(data, Axis(2), m);

        let rescale = |s: f32, len: usize| s * len as f32 / m as f32;
        let spacing = (
            rescale(spacing.0, original_dim.0),
            rescale(spacing.1, original_dim.1),
            rescale(spacing.2, original_dim.2),
        );
        Volume::new(data, spacing)
    }

    /// Source neighbours and blend weight for every output position.
    pub(crate) fn linear_weights(in_len: usize, out_len: usize) -> Vec<(usize, usize, f32)> {
        if in_len <= 1 || out_len <= 1 {
            return vec![(0, 0, 0.0); out_len];
        }
        let step = (in_len - 1) as f64 / (out_len - 1) as f64;
        (0..out_len)
            .map(|o| {
                let src = (o as f64 * step).min((in_len - 1) as f64);
                let i0 = src.floor() as usize;
                let i1 = (i0 + 1).min(in_len - 1);
                (i0, i1, (src - i0 as f64) as f32)
            })
            .collect()
    }

    fn resample_axis(input: Array3<f32>, axis: Axis, out_len: usize) -> Array3<f32> {
        let in_len = input.len_of(axis);
        if in_len == out_len {
            return input;
        }
        let weights = Self::linear_weights(in_len, out_len);

        let mut shape = input.raw_dim();
        shape[axis.index()] = out_len;
        let mut output = Array3::<f32>::zeros(shape);

        output
            .axis_iter_mut(axis)
            .into_par_iter()
            .zip(weights.par_iter())
            .for_each(|(mut plane, &(i0, i1, t))| {
                Zip::from(&mut plane)
                    .and(&input.index_axis(axis, i0))
                    .and(&input.index_axis(axis, i1))
                    .for_each(|out, &a, &b| *out = Self::lerp(a, b, t));
            });

        output
    }

    #[inline]
    fn lerp(a: f32, b: f32, t: f32) -> f32 {
        let value = a.mul_add(1.0 - t, b * t);
        // NaN neighbours propagate; clamp panics on NaN bounds
        if a.is_nan() || b.is_nan() {
            return value;
        }
        value.clamp(a.min(b), a.max(b))
    }
}
