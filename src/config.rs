use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::animation::AnimationParams;
use crate::enums::Plane;
use crate::error::{PipelineError, PipelineResult};

/// Rotation in degrees per plane, 0 for any plane not given.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaneRotations {
    pub axial: i32,
    pub sagittal: i32,
    pub coronal: i32,
}

impl PlaneRotations {
    pub fn get(&self, plane: Plane) -> i32 {
        match plane {
            Plane::Axial => self.axial,
            Plane::Sagittal => self.sagittal,
            Plane::Coronal => self.coronal,
        }
    }

    pub fn with(mut self, plane: Plane, degrees: i32) -> Self {
        match plane {
            Plane::Axial => self.axial = degrees,
            Plane::Sagittal => self.sagittal = degrees,
            Plane::Coronal => self.coronal = degrees,
        }
        self
    }
}

/// A single `plane=degrees` override, as given on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationArg {
    pub plane: Plane,
    pub degrees: i32,
}

impl FromStr for RotationArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (plane, degrees) = s
            .split_once('=')
            .ok_or_else(|| format!("expected PLANE=DEGREES, got '{s}'"))?;
        let plane = plane.parse::<Plane>().map_err(|e| e.to_string())?;
        let degrees = degrees
            .trim()
            .parse::<i32>()
            .map_err(|e| format!("invalid angle '{degrees}': {e}"))?;
        Ok(Self { plane, degrees })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Requested planes, in panel order.
    pub planes: Vec<Plane>,
    pub rotations: PlaneRotations,
    /// Per-plane slice animations.
    pub slice_animation: AnimationParams,
    pub composite_animation: AnimationParams,
    /// Fully synchronized multi-plane animation.
    pub synchronized_animation: AnimationParams,
    /// Stop after this many input entries.
    pub max_files: Option<usize>,
    /// Abort the batch on the first loader or encoder failure.
    pub fail_fast: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            planes: vec![Plane::Axial, Plane::Sagittal, Plane::Coronal],
            rotations: PlaneRotations::default(),
            slice_animation: AnimationParams::new(100, 2),
            composite_animation: AnimationParams::new(100, 2),
            synchronized_animation: AnimationParams::new(80, 1),
            max_files: None,
            fail_fast: false,
        }
    }
}

impl PipelineConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| PipelineError::config(format!("{}: {e}", path.display())))?;
        config.validated()
    }

    /// Drop duplicate planes and reject settings the pipeline cannot honour.
    pub fn validated(mut self) -> PipelineResult<Self> {
        let mut seen = Vec::with_capacity(self.planes.len());
        self.planes.retain(|plane| {
            if seen.contains(plane) {
                false
            } else {
                seen.push(*plane);
                true
            }
        });
        if self.planes.is_empty() {
            return Err(PipelineError::config("at least one plane must be requested"));
        }
        for (name, params) in [
            ("slice_animation", &self.slice_animation),
            ("composite_animation", &self.composite_animation),
            ("synchronized_animation", &self.synchronized_animation),
        ] {
            if params.stride == 0 {
                return Err(PipelineError::config(format!("{name}: stride must be at least 1")));
            }
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_output_contract() {
        let config = PipelineConfig::default();
        assert_eq!(config.planes, Plane::ALL.to_vec());
        assert_eq!(config.slice_animation.frame_duration_ms, 100);
        assert_eq!(config.slice_animation.stride, 2);
        assert_eq!(config.composite_animation.frame_duration_ms, 100);
        assert_eq!(config.composite_animation.stride, 2);
        assert_eq!(config.synchronized_animation.frame_duration_ms, 80);
        assert_eq!(config.synchronized_animation.stride, 1);
        assert_eq!(config.rotations.get(Plane::Coronal), 0);
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"rotations": {"axial": 90}, "planes": ["coronal"]}"#)
                .unwrap();
        assert_eq!(config.rotations.get(Plane::Axial), 90);
        assert_eq!(config.rotations.get(Plane::Sagittal), 0);
        assert_eq!(config.planes, vec![Plane::Coronal]);
        assert_eq!(config.synchronized_animation.frame_duration_ms, 80);
    }

    #[test]
    fn partial_animation_entry_is_rejected() {
        let err =
            serde_json::from_str::<PipelineConfig>(r#"{"slice_animation": {"loop_count": 3}}"#)
                .unwrap_err();
        assert!(err.to_string().contains("frame_duration_ms"));

        let config: PipelineConfig = serde_json::from_str(
            r#"{"slice_animation": {"frame_duration_ms": 50, "stride": 3}}"#,
        )
        .unwrap();
        assert_eq!(config.slice_animation, AnimationParams::new(50, 3));
        assert_eq!(config.composite_animation, AnimationParams::new(100, 2));
        assert_eq!(config.synchronized_animation, AnimationParams::new(80, 1));
    }

    #[test]
    fn partial_animation_file_reports_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preview.json");
        fs::write(&path, r#"{"synchronized_animation": {"stride": 2}}"#).unwrap();
        assert!(matches!(
            PipelineConfig::from_json_file(&path),
            Err(PipelineError::Config(_))
        ));
    }

    #[test]
    fn validation_dedups_planes_and_rejects_zero_stride() {
        let config = PipelineConfig {
            planes: vec![Plane::Coronal, Plane::Axial, Plane::Coronal],
            ..Default::default()
        };
        assert_eq!(
            config.validated().unwrap().planes,
            vec![Plane::Coronal, Plane::Axial]
        );

        let mut config = PipelineConfig::default();
        config.composite_animation.stride = 0;
        assert!(matches!(config.validated(), Err(PipelineError::Config(_))));

        let config = PipelineConfig {
            planes: vec![],
            ..Default::default()
        };
        assert!(config.validated().is_err());
    }

    #[test]
    fn rotation_args_parse() {
        let arg: RotationArg = "sagittal=270".parse().unwrap();
        assert_eq!(
            arg,
            RotationArg {
                plane: Plane::Sagittal,
                degrees: 270
            }
        );
        assert!("axial".parse::<RotationArg>().is_err());
        assert!("axial=ninety".parse::<RotationArg>().is_err());
        assert_eq!(PlaneRotations::default().with(Plane::Axial, 90).axial, 90);
    }
}
