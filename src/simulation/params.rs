//! Numerical and physical parameters for the simulation
//!
//! `Parameters` holds the per-run physical constants:
//! - tick duration,
//! - gravitational constant and uniform field strength (`big_g`, `g`),
//! - regularization epsilon (`eps`) for near-zero distances and masses,
//! - penalty spring stiffness for collision response
//!
//! `EngineSettings` holds the scheduling knobs (worker count, pacing mode).

use crate::configuration::config::PacingConfig;

#[derive(Debug, Clone)]
pub struct Parameters {
    pub tick: f64, // tick duration (s)
    pub big_g: f64, // gravitational constant G
    pub g: f64, // uniform field strength
    pub eps: f64, // regularization; bounds but does not eliminate blow-up at r -> 0
    pub stiffness: f64, // penalty spring constant, a realism knob
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            tick: 0.01,
            big_g: 6.67408e-11,
            g: 9.8,
            eps: 1e-9,
            stiffness: 1000.0,
        }
    }
}

/// Runtime scheduling settings for the engine.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub workers: usize, // worker thread count
    pub pacing: PacingConfig, // spin or sleep between ticks
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            workers: 1,
            pacing: PacingConfig::Spin,
        }
    }
}
