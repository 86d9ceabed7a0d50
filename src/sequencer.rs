use crate::config::PlaneRotations;
use crate::enums::Plane;
use crate::error::{PipelineError, PipelineResult};
use crate::render::{Panel, compose_panels};
use crate::slice::Slice;
use crate::volume::Volume;

use image::GrayImage;
use tracing::debug;

const PROGRESS_EVERY: usize = 20;

/// Slices of every requested plane at one shared index.
#[derive(Debug, Clone)]
pub struct Frame<'a> {
    pub index: usize,
    pub total: usize,
    pub slices: Vec<Slice<'a>>,
}

impl Frame<'_> {
    pub fn caption(&self, plane: Plane) -> String {
        format!(
            "{} {} OF {}",
            plane.name().to_ascii_uppercase(),
            self.index + 1,
            self.total
        )
    }

    pub fn render(&self) -> GrayImage {
        let panels: Vec<Panel> = self
            .slices
            .iter()
            .map(|slice| Panel::from_slice(slice, self.caption(slice.plane())))
            .collect();
        compose_panels(&panels)
    }
}

/// Walks an isotropic volume so that all planes move together.
pub struct FrameSequencer<'a> {
    volume: &'a Volume,
    planes: &'a [Plane],
    rotations: PlaneRotations,
    edge_length: usize,
}

impl<'a> FrameSequencer<'a> {
    pub fn new(
        volume: &'a Volume,
        planes: &'a [Plane],
        rotations: PlaneRotations,
    ) -> PipelineResult<Self> {
        let edge_length = volume
            .edge_length()
            .ok_or(PipelineError::NotIsotropic(volume.dim()))?;
        Ok(Self {
            volume,
            planes,
            rotations,
            edge_length,
        })
    }

    pub fn len(&self) -> usize {
        self.edge_length
    }

    pub fn is_empty(&self) -> bool {
        self.edge_length == 0
    }

    /// Frame at `index`; past the end of the cube this is `IndexOutOfRange`.
    pub fn frame(&self, index: usize) -> PipelineResult<Frame<'a>> {
        let slices = self
            .planes
            .iter()
            .map(|&plane| {
                self.volume
                    .get_slice_from_axis(index, plane)
                    .map(|slice| slice.rotated(self.rotations.get(plane)))
            })
            .collect::<PipelineResult<Vec<_>>>()?;
        Ok(Frame {
            index,
            total: self.edge_length,
            slices,
        })
    }

    /// Frames in increasing index order.
    pub fn frames(&self) -> impl Iterator<Item = PipelineResult<Frame<'a>>> + '_ {
        (0..self.edge_length).map(move |index| {
            self.report_progress(index);
            self.frame(index)
        })
    }

    fn report_progress(&self, index: usize) {
        if index == 0 || index + 1 == self.edge_length || index % PROGRESS_EVERY == 0 {
            debug!(index = index + 1, total = self.edge_length, "rendering frame");
        }
    }
}
