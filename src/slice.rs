use crate::enums::Plane;

use image::{GrayImage, ImageBuffer};
use ndarray::{ArrayView2, Axis};

/// Number of counter-clockwise quarter turns for `angle` degrees.
///
/// Angles that are not a multiple of 90 are floored to the next lower
/// multiple, so 100 gives one turn and -45 gives three.
pub fn quarter_turns(angle: i32) -> u8 {
    angle.div_euclid(90).rem_euclid(4) as u8
}

/// A 2D cut through a [`Volume`](crate::volume::Volume).
///
/// The slice borrows the volume; rotation only permutes strides, so no
/// pixel is copied until the slice is rasterized.
#[derive(Debug, Clone)]
pub struct Slice<'a> {
    data: ArrayView2<'a, f32>,
    plane: Plane,
    index: usize,
    quarter_turns: u8,
}

impl<'a> Slice<'a> {
    pub fn new(data: ArrayView2<'a, f32>, plane: Plane, index: usize) -> Self {
        Self {
            data,
            plane,
            index,
            quarter_turns: 0,
        }
    }

    pub fn plane(&self) -> Plane {
        self.plane
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Total rotation applied so far, in quarter turns modulo 4.
    pub fn quarter_turns(&self) -> u8 {
        self.quarter_turns
    }

    /// (rows, columns)
    pub fn dim(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn view(&self) -> &ArrayView2<'a, f32> {
        &self.data
    }

    /// Rotate by `angle` degrees counter-clockwise, see [`quarter_turns`].
    pub fn rotated(self, angle: i32) -> Self {
        self.rotated_quarter_turns(quarter_turns(angle))
    }

    /// Rotate by `k` quarter turns. Each turn maps `out[i][j] = in[j][w - 1 - i]`.
    pub fn rotated_quarter_turns(self, k: u8) -> Self {
        let k = k % 4;
        if k == 0 {
            return self;
        }
        let Slice {
            mut data,
            plane,
            index,
            quarter_turns,
        } = self;
        match k {
            1 => {
                data = data.reversed_axes();
                data.invert_axis(Axis(0));
            }
            2 => {
                data.invert_axis(Axis(0));
                data.invert_axis(Axis(1));
            }
            _ => {
                data = data.reversed_axes();
                data.invert_axis(Axis(1));
            }
        }
        Slice {
            data,
            plane,
            index,
            quarter_turns: (quarter_turns + k) % 4,
        }
    }

    /// Rasterize to 8-bit grey, row by row in logical order.
    pub fn to_image(&self) -> GrayImage {
        let (height, width) = self.data.dim();
        let pixel_data: Vec<u8> = self.data.iter().map(|&v| normalize_to_u8(v)).collect();
        // from_raw only fails on a length mismatch, which the view rules out
        ImageBuffer::from_raw(width as u32, height as u32, pixel_data)
            .unwrap_or_else(|| GrayImage::new(width as u32, height as u32))
    }
}

#[inline]
pub(crate) fn normalize_to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
