use crate::config::PlaneRotations;
use crate::enums::Plane;
use crate::error::PipelineResult;
use crate::render::{Panel, compose_panels};
use crate::volume::Volume;

use image::GrayImage;

/// Slice index per plane for one composite frame.
///
/// Built fresh for every frame and passed by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaneIndices([usize; 3]);

impl PlaneIndices {
    /// Every plane at its mid-volume index.
    pub fn mid_volume(volume: &Volume) -> Self {
        let mut indices = [0; 3];
        for plane in Plane::ALL {
            indices[plane.axis()] = volume.mid_index(plane);
        }
        Self(indices)
    }

    pub fn get(&self, plane: Plane) -> usize {
        self.0[plane.axis()]
    }

    /// Copy with `plane` moved to `index`.
    pub fn with(self, plane: Plane, index: usize) -> Self {
        let mut indices = self.0;
        indices[plane.axis()] = index;
        Self(indices)
    }
}

/// One moving reference slice next to fixed mid-volume slices of the other
/// requested planes.
pub struct CompositeComposer<'a> {
    volume: &'a Volume,
    planes: &'a [Plane],
    rotations: PlaneRotations,
    mid: PlaneIndices,
}

impl<'a> CompositeComposer<'a> {
    pub fn new(volume: &'a Volume, planes: &'a [Plane], rotations: PlaneRotations) -> Self {
        Self {
            volume,
            planes,
            rotations,
            mid: PlaneIndices::mid_volume(volume),
        }
    }

    /// Reference plane first, then the remaining requested planes in order.
    pub fn panel_order(&self, reference: Plane) -> Vec<Plane> {
        std::iter::once(reference)
            .chain(self.planes.iter().copied().filter(|p| *p != reference))
            .collect()
    }

    pub fn indices_for(&self, reference: Plane, index: usize) -> PlaneIndices {
        self.mid.with(reference, index)
    }

    /// Number of composite frames with `reference` as the moving plane.
    pub fn len(&self, reference: Plane) -> usize {
        self.volume.len_along(reference)
    }

    pub fn compose(&self, reference: Plane, index: usize) -> PipelineResult<GrayImage> {
        let indices = self.indices_for(reference, index);
        let panels = self
            .panel_order(reference)
            .into_iter()
            .map(|plane| {
                let slice = self
                    .volume
                    .get_slice_from_axis(indices.get(plane), plane)?
                    .rotated(self.rotations.get(plane));
                let caption = format!(
                    "{} {} OF {}",
                    plane.name().to_ascii_uppercase(),
                    slice.index() + 1,
                    self.volume.len_along(plane)
                );
                Ok(Panel::from_slice(&slice, caption))
            })
            .collect::<PipelineResult<Vec<_>>>()?;
        Ok(compose_panels(&panels))
    }
}
