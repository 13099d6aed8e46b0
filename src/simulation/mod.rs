pub mod states;
pub mod params;
pub mod queue;
pub mod collision;
pub mod forces;
pub mod integrator;
pub mod workers;
pub mod engine;
pub mod scenario;
