//! Configuration types for loading simulation scenarios from YAML.
//!
//! This module defines a thin, `serde`-deserializable representation of a
//! simulation scenario:
//!
//! - [`EngineConfig`]     – scheduling options (worker count, pacing)
//! - [`ParametersConfig`] – tick duration and physical constants
//! - [`BodyConfig`]       – initial state for each body
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario file
//!
//! # YAML format
//! An example scenario YAML matching these types:
//!
//! ```yaml
//! engine:
//!   workers: 2            # worker thread count
//!   pacing: spin          # "spin" (precise, busy core) or "sleep"
//!
//! parameters:
//!   tick: 0.005           # tick duration (s)
//!   G: 6.67408e-11        # gravitational constant
//!   g: 9.8                # uniform field strength
//!   eps: 1.0e-9           # regularization epsilon
//!   stiffness: 1000.0     # penalty spring constant
//!
//! bodies:
//!   - shape: sphere
//!     radius: 0.5
//!     x: [ 0.0, 0.0, 4.0 ]
//!     v: [ 0.0, 0.0, 0.0 ]
//!     m: 1.0
//!   - shape: cube
//!     half_extents: [ 4.0, 4.0, 0.5 ]
//!     x: [ 0.0, 0.0, -0.5 ]
//!     v: [ 0.0, 0.0, 0.0 ]
//!     m: 50.0
//!     movable: false
//! ```
//!
//! The engine maps this configuration into its internal runtime scenario
//! representation.

use serde::Deserialize;

/// How the coordinator waits out the remainder of each tick.
/// `pacing: "spin"` or `pacing: "sleep"`
#[derive(Deserialize, Debug, Clone)]
pub enum PacingConfig {
    #[serde(rename = "spin")] // poll the clock in a hot loop; sub-millisecond precision, one busy core
    Spin,

    #[serde(rename = "sleep")] // hand the remainder to the OS scheduler; cheaper, jittery wake-ups
    Sleep,
}

/// Scheduling configuration for the engine.
#[derive(Deserialize, Debug)]
pub struct EngineConfig {
    pub workers: usize, // worker thread count; each drains the per-phase index queue
    pub pacing: PacingConfig, // tick pacing strategy
}

/// Tick duration and physical constants for a scenario.
#[derive(Deserialize, Debug, Clone)]
pub struct ParametersConfig {
    pub tick: f64, // tick duration (s)
    #[serde(rename = "G")]
    pub big_g: f64, // gravitational constant
    pub g: f64, // uniform field strength
    pub eps: f64, // regularization - prevents singular forces and divides at very small separations
    pub stiffness: f64, // penalty spring constant
}

/// Shape section of a body entry, tagged by `shape:`.
#[derive(Deserialize, Debug, Clone)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum ShapeConfig {
    Sphere { radius: f64 },
    Cube { half_extents: [f64; 3] },
}

/// Configuration for a single body's initial state.
#[derive(Deserialize, Debug)]
pub struct BodyConfig {
    #[serde(flatten)]
    pub shape: ShapeConfig, // shape tag plus its extents
    pub x: [f64; 3], // initial centroid
    pub v: [f64; 3], // initial velocity
    pub m: f64, // mass
    #[serde(default = "default_movable")]
    pub movable: bool, // immovable bodies exert forces but never move under them
}

fn default_movable() -> bool {
    true
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug)]
pub struct ScenarioConfig {
    pub engine: EngineConfig, // scheduling options
    pub parameters: ParametersConfig, // physical constants
    pub bodies: Vec<BodyConfig>, // initial state of the scene
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sphere_and_cube_entries() {
        let yaml = r#"
engine:
  workers: 2
  pacing: spin
parameters:
  tick: 0.005
  G: 6.67408e-11
  g: 9.8
  eps: 1.0e-9
  stiffness: 1000.0
bodies:
  - shape: sphere
    radius: 0.5
    x: [0.0, 0.0, 4.0]
    v: [0.0, 0.0, 0.0]
    m: 1.0
  - shape: cube
    half_extents: [4.0, 4.0, 0.5]
    x: [0.0, 0.0, -0.5]
    v: [0.0, 0.0, 0.0]
    m: 50.0
    movable: false
"#;
        let cfg: ScenarioConfig = serde_yaml::from_str(yaml).expect("valid scenario");
        assert_eq!(cfg.engine.workers, 2);
        assert_eq!(cfg.bodies.len(), 2);
        assert!(matches!(cfg.bodies[0].shape, ShapeConfig::Sphere { radius } if radius == 0.5));
        assert!(!cfg.bodies[1].movable);
        // movable defaults to true when omitted
        assert!(cfg.bodies[0].movable);
    }
}
