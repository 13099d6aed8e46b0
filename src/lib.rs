pub mod simulation;
pub mod configuration;
pub mod benchmark;
pub mod error;

pub use error::{Error, Result};

pub use simulation::states::{Body, NVec3, Shape, ShapeKind, System};
pub use simulation::params::{EngineSettings, Parameters};
pub use simulation::collision::{test_pair, Contact, ContactGrid, ContactRow};
pub use simulation::forces::{BodyForce, ForceSet, PairwiseGravity, PenaltySpring, UniformField};
pub use simulation::engine::Simulation;
pub use simulation::scenario::Scenario;

pub use configuration::config::{
    BodyConfig, EngineConfig, PacingConfig, ParametersConfig, ScenarioConfig, ShapeConfig,
};

pub use benchmark::benchmark::{bench_collision, bench_forces};
