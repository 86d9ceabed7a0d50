use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Anatomical slicing direction.
///
/// Each plane fixes exactly one axis of an `(x, y, z)` volume when slicing.
/// The binding never changes between calls, see [`Plane::axis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plane {
    Axial,
    Sagittal,
    Coronal,
}

impl Plane {
    pub const ALL: [Plane; 3] = [Plane::Axial, Plane::Sagittal, Plane::Coronal];

    /// Index of the array axis held constant when slicing in this plane.
    pub const fn axis(self) -> usize {
        match self {
            Plane::Sagittal => 0,
            Plane::Coronal => 1,
            Plane::Axial => 2,
        }
    }

    /// Lower-case name used for directories and file names.
    pub const fn name(self) -> &'static str {
        match self {
            Plane::Axial => "axial",
            Plane::Sagittal => "sagittal",
            Plane::Coronal => "coronal",
        }
    }
}

impl fmt::Display for Plane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown plane '{0}', expected axial, sagittal or coronal")]
pub struct ParsePlaneError(String);

impl FromStr for Plane {
    type Err = ParsePlaneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "axial" => Ok(Plane::Axial),
            "sagittal" => Ok(Plane::Sagittal),
            "coronal" => Ok(Plane::Coronal),
            _ => Err(ParsePlaneError(s.to_string())),
        }
    }
}

/// Ordering applied to the images of a DICOM series before stacking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    #[default]
    ImagePositionPatient,
    TablePosition,
    InstanceNumber,
    None,
}
