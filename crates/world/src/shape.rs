//! Shape descriptors and their normalization.
//!
//! Requests carry a [`ShapeSpec`] with optional material fields; exactly
//! one normalization step resolves it against the active config into a
//! fully-populated [`ShapeDesc`]. No other code path fills defaults.

use bodyspace_config::SimConfig;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::WorldError;

/// Widening applied to a computed terrain height range.
const HEIGHT_RANGE_MARGIN: f32 = 1.0;

/// Material parameters as they appear in a create request. `None` means
/// "use the configured default".
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialParams {
    pub restitution: Option<f32>,
    pub friction: Option<f32>,
    pub rolling_friction: Option<f32>,
    pub linear_damping: Option<f32>,
    pub angular_damping: Option<f32>,
}

/// Fully-resolved material properties of a dynamic body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub restitution: f32,
    pub friction: f32,
    pub rolling_friction: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl MaterialParams {
    fn resolve(self, config: &SimConfig) -> Material {
        let pick = |v: Option<f32>, default: f32| match v {
            Some(v) if v.is_finite() && v >= 0.0 => v,
            _ => default,
        };
        Material {
            restitution: pick(self.restitution, config.restitution),
            friction: pick(self.friction, config.friction),
            rolling_friction: pick(self.rolling_friction, config.rolling_friction),
            linear_damping: pick(self.linear_damping, config.linear_damping),
            angular_damping: pick(self.angular_damping, config.angular_damping),
        }
    }
}

/// Shape descriptor as supplied by a create request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeSpec {
    Sphere {
        radius: f32,
        mass: f32,
        material: MaterialParams,
    },
    Box {
        width: f32,
        height: f32,
        depth: f32,
        mass: f32,
        material: MaterialParams,
    },
    Terrain {
        /// Samples along the x axis.
        width: u32,
        /// Samples along the z axis.
        depth: u32,
        /// Row-major heights, `depth` rows of `width` samples.
        heightmap: Vec<f32>,
        /// Per-axis scale: cell spacing in x/z, height multiplier in y.
        scale: Vector3<f32>,
        /// Lower bound of the height range; computed from the heightmap
        /// when unset.
        min_height: Option<f32>,
        /// Upper bound of the height range; computed from the heightmap
        /// when unset.
        max_height: Option<f32>,
    },
}

/// Fully-normalized shape descriptor retained for the lifetime of the
/// object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ShapeDesc {
    Sphere {
        radius: f32,
        mass: f32,
        material: Material,
    },
    Box {
        width: f32,
        height: f32,
        depth: f32,
        mass: f32,
        material: Material,
    },
    Terrain {
        width: u32,
        depth: u32,
        heightmap: Vec<f32>,
        scale: Vector3<f32>,
        min_height: f32,
        max_height: f32,
    },
}

impl ShapeSpec {
    /// Replace the descriptor's mass (used by the optional create-time
    /// mass override). Terrain has no mass to replace.
    pub fn with_mass(mut self, new_mass: f32) -> Self {
        match &mut self {
            ShapeSpec::Sphere { mass, .. } | ShapeSpec::Box { mass, .. } => *mass = new_mass,
            ShapeSpec::Terrain { .. } => {}
        }
        self
    }

    /// Validate and resolve the descriptor against the active config.
    ///
    /// Non-positive or non-finite dimensions fall back to a default unit
    /// sphere instead of failing the create; a terrain whose heightmap is
    /// empty or does not match its grid dimensions is the only rejection.
    pub fn normalize(self, config: &SimConfig) -> Result<ShapeDesc, WorldError> {
        let clean_mass = |mass: f32| if mass.is_finite() && mass >= 0.0 { mass } else { 1.0 };
        match self {
            ShapeSpec::Sphere {
                radius,
                mass,
                material,
            } => {
                if !(radius.is_finite() && radius > 0.0) {
                    return Ok(Self::fallback_sphere(clean_mass(mass), config));
                }
                Ok(ShapeDesc::Sphere {
                    radius,
                    mass: clean_mass(mass),
                    material: material.resolve(config),
                })
            }
            ShapeSpec::Box {
                width,
                height,
                depth,
                mass,
                material,
            } => {
                let ok = [width, height, depth]
                    .iter()
                    .all(|d| d.is_finite() && *d > 0.0);
                if !ok {
                    return Ok(Self::fallback_sphere(clean_mass(mass), config));
                }
                Ok(ShapeDesc::Box {
                    width,
                    height,
                    depth,
                    mass: clean_mass(mass),
                    material: material.resolve(config),
                })
            }
            ShapeSpec::Terrain {
                width,
                depth,
                heightmap,
                scale,
                min_height,
                max_height,
            } => {
                if width < 2 || depth < 2 {
                    return Err(WorldError::InvalidShape(format!(
                        "terrain grid {width}x{depth} is too small"
                    )));
                }
                if heightmap.len() != (width * depth) as usize {
                    return Err(WorldError::InvalidShape(format!(
                        "heightmap has {} samples, expected {}",
                        heightmap.len(),
                        width * depth
                    )));
                }
                if heightmap.iter().any(|h| !h.is_finite()) {
                    return Err(WorldError::InvalidShape(
                        "heightmap contains non-finite samples".into(),
                    ));
                }
                let scale = Vector3::new(
                    positive_or(scale.x, 1.0),
                    positive_or(scale.y, 1.0),
                    positive_or(scale.z, 1.0),
                );
                // One scan at creation time; never repeated per tick.
                let (min_height, max_height) = match (min_height, max_height) {
                    (Some(min), Some(max)) if min.is_finite() && max.is_finite() && min <= max => {
                        (min, max)
                    }
                    _ => scan_height_range(&heightmap),
                };
                Ok(ShapeDesc::Terrain {
                    width,
                    depth,
                    heightmap,
                    scale,
                    min_height,
                    max_height,
                })
            }
        }
    }

    fn fallback_sphere(mass: f32, config: &SimConfig) -> ShapeDesc {
        ShapeDesc::Sphere {
            radius: 1.0,
            mass,
            material: MaterialParams::default().resolve(config),
        }
    }
}

impl ShapeDesc {
    /// Terrain is always static; other shapes are static when massless.
    pub fn is_static(&self) -> bool {
        match self {
            ShapeDesc::Terrain { .. } => true,
            ShapeDesc::Sphere { mass, .. } | ShapeDesc::Box { mass, .. } => *mass == 0.0,
        }
    }

    pub fn is_terrain(&self) -> bool {
        matches!(self, ShapeDesc::Terrain { .. })
    }

    pub fn mass(&self) -> f32 {
        match self {
            ShapeDesc::Sphere { mass, .. } | ShapeDesc::Box { mass, .. } => *mass,
            ShapeDesc::Terrain { .. } => 0.0,
        }
    }

    /// Characteristic radius used for CCD thresholds.
    pub fn ccd_radius(&self) -> Option<f32> {
        match self {
            ShapeDesc::Sphere { radius, .. } => Some(*radius),
            ShapeDesc::Box {
                width,
                height,
                depth,
                ..
            } => Some(0.5 * width.min(*height).min(*depth)),
            ShapeDesc::Terrain { .. } => None,
        }
    }
}

fn positive_or(v: f32, default: f32) -> f32 {
    if v.is_finite() && v > 0.0 { v } else { default }
}

fn scan_height_range(heightmap: &[f32]) -> (f32, f32) {
    let mut min = heightmap[0];
    let mut max = heightmap[0];
    for &h in &heightmap[1..] {
        if h < min {
            min = h;
        }
        if h > max {
            max = h;
        }
    }
    (min - HEIGHT_RANGE_MARGIN, max + HEIGHT_RANGE_MARGIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> SimConfig {
        SimConfig::default()
    }

    #[test]
    fn sphere_material_defaults_come_from_config() {
        let desc = ShapeSpec::Sphere {
            radius: 2.0,
            mass: 3.0,
            material: MaterialParams::default(),
        }
        .normalize(&cfg())
        .unwrap();
        match desc {
            ShapeDesc::Sphere {
                radius,
                mass,
                material,
            } => {
                assert_eq!(radius, 2.0);
                assert_eq!(mass, 3.0);
                assert_eq!(material.restitution, cfg().restitution);
                assert_eq!(material.friction, cfg().friction);
            }
            other => panic!("expected sphere, got {other:?}"),
        }
    }

    #[test]
    fn explicit_material_fields_win_over_defaults() {
        let desc = ShapeSpec::Sphere {
            radius: 1.0,
            mass: 1.0,
            material: MaterialParams {
                restitution: Some(0.25),
                ..MaterialParams::default()
            },
        }
        .normalize(&cfg())
        .unwrap();
        match desc {
            ShapeDesc::Sphere { material, .. } => assert_eq!(material.restitution, 0.25),
            other => panic!("expected sphere, got {other:?}"),
        }
    }

    #[test]
    fn non_positive_dimensions_fall_back_to_default_sphere() {
        // The defensive-create fallback: a degenerate box still produces a
        // usable body instead of failing the whole request.
        let desc = ShapeSpec::Box {
            width: -1.0,
            height: 2.0,
            depth: 2.0,
            mass: 5.0,
            material: MaterialParams::default(),
        }
        .normalize(&cfg())
        .unwrap();
        match desc {
            ShapeDesc::Sphere { radius, mass, .. } => {
                assert_eq!(radius, 1.0);
                assert_eq!(mass, 5.0);
            }
            other => panic!("expected fallback sphere, got {other:?}"),
        }
    }

    #[test]
    fn nan_radius_falls_back_to_default_sphere() {
        let desc = ShapeSpec::Sphere {
            radius: f32::NAN,
            mass: 1.0,
            material: MaterialParams::default(),
        }
        .normalize(&cfg())
        .unwrap();
        assert!(matches!(desc, ShapeDesc::Sphere { radius, .. } if radius == 1.0));
    }

    #[test]
    fn terrain_height_range_computed_with_margin() {
        let desc = ShapeSpec::Terrain {
            width: 2,
            depth: 2,
            heightmap: vec![0.0, 1.0, -2.0, 3.0],
            scale: Vector3::new(1.0, 1.0, 1.0),
            min_height: None,
            max_height: None,
        }
        .normalize(&cfg())
        .unwrap();
        match desc {
            ShapeDesc::Terrain {
                min_height,
                max_height,
                ..
            } => {
                assert_eq!(min_height, -3.0);
                assert_eq!(max_height, 4.0);
            }
            other => panic!("expected terrain, got {other:?}"),
        }
    }

    #[test]
    fn terrain_explicit_height_range_is_kept() {
        let desc = ShapeSpec::Terrain {
            width: 2,
            depth: 2,
            heightmap: vec![0.0; 4],
            scale: Vector3::new(1.0, 1.0, 1.0),
            min_height: Some(-10.0),
            max_height: Some(10.0),
        }
        .normalize(&cfg())
        .unwrap();
        match desc {
            ShapeDesc::Terrain {
                min_height,
                max_height,
                ..
            } => {
                assert_eq!(min_height, -10.0);
                assert_eq!(max_height, 10.0);
            }
            other => panic!("expected terrain, got {other:?}"),
        }
    }

    #[test]
    fn terrain_sample_count_mismatch_is_rejected() {
        let err = ShapeSpec::Terrain {
            width: 4,
            depth: 4,
            heightmap: vec![0.0; 7],
            scale: Vector3::new(1.0, 1.0, 1.0),
            min_height: None,
            max_height: None,
        }
        .normalize(&cfg())
        .unwrap_err();
        assert!(matches!(err, WorldError::InvalidShape(_)));
    }

    #[test]
    fn mass_override_replaces_descriptor_mass() {
        let spec = ShapeSpec::Sphere {
            radius: 1.0,
            mass: 1.0,
            material: MaterialParams::default(),
        }
        .with_mass(7.5);
        assert!(matches!(spec, ShapeSpec::Sphere { mass, .. } if mass == 7.5));
    }

    #[test]
    fn static_classification() {
        let cfg = cfg();
        let sphere = ShapeSpec::Sphere {
            radius: 1.0,
            mass: 0.0,
            material: MaterialParams::default(),
        }
        .normalize(&cfg)
        .unwrap();
        assert!(sphere.is_static());

        let terrain = ShapeSpec::Terrain {
            width: 2,
            depth: 2,
            heightmap: vec![0.0; 4],
            scale: Vector3::new(1.0, 1.0, 1.0),
            min_height: None,
            max_height: None,
        }
        .normalize(&cfg)
        .unwrap();
        assert!(terrain.is_static());
        assert!(terrain.is_terrain());
    }
}
