//! Build fully-initialized simulation scenarios from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces the runtime bundle:
//! - engine settings (`EngineSettings`)
//! - physical parameters (`Parameters`)
//! - the initial body list
//!
//! `into_simulation` wires the bundle into a ready-to-start [`Simulation`].

use crate::configuration::config::{BodyConfig, ScenarioConfig, ShapeConfig};
use crate::error::Result;
use crate::simulation::engine::Simulation;
use crate::simulation::params::{EngineSettings, Parameters};
use crate::simulation::states::{Body, Shape};

pub struct Scenario {
    pub settings: EngineSettings,
    pub parameters: Parameters,
    pub bodies: Vec<Body>,
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> Self {
        // Bodies: map `BodyConfig` -> runtime `Body` using nalgebra vectors.
        // Ids are provisional here; `set_scene` assigns them by position.
        let bodies: Vec<Body> = cfg
            .bodies
            .iter()
            .enumerate()
            .map(|(i, bc): (usize, &BodyConfig)| Body {
                id: i,
                shape: match &bc.shape {
                    ShapeConfig::Sphere { radius } => Shape::Sphere { radius: *radius },
                    ShapeConfig::Cube { half_extents } => Shape::Cube {
                        half_extents: (*half_extents).into(),
                    },
                },
                m: bc.m,
                x: bc.x.into(),
                v: bc.v.into(),
                movable: bc.movable,
            })
            .collect();

        let p_cfg = cfg.parameters;
        let parameters = Parameters {
            tick: p_cfg.tick,
            big_g: p_cfg.big_g,
            g: p_cfg.g,
            eps: p_cfg.eps,
            stiffness: p_cfg.stiffness,
        };

        let e_cfg = cfg.engine;
        let settings = EngineSettings {
            workers: e_cfg.workers,
            pacing: e_cfg.pacing,
        };

        Self {
            settings,
            parameters,
            bodies,
        }
    }

    /// Validate the bundle and produce an engine with the scene installed.
    pub fn into_simulation(self) -> Result<Simulation> {
        let mut sim = Simulation::new(self.parameters, self.settings)?;
        sim.set_scene(self.bodies)?;
        Ok(sim)
    }
}
