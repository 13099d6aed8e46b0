//! The master coordinator: phase sequencing, real-time pacing, lifecycle.
//!
//! Per tick the coordinator runs
//! `CollisionPhase -> barrier -> ForcePhase -> barrier -> SerialIntegrate`,
//! then paces out the remainder of the tick interval. The force phase never
//! observes a partially-written contact grid because the collision phase
//! fully joins first.
//!
//! Ownership: the engine core exclusively owns the body arena and all
//! per-body buffers. Workers receive the core only through the phase runner
//! seam and write strictly to the row/slot of the index they dequeued.
//! Callers never mutate body state while a tick is in flight.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::configuration::config::PacingConfig;
use crate::error::{Error, Result};
use crate::simulation::collision::ContactGrid;
use crate::simulation::forces::ForceSet;
use crate::simulation::integrator::{self, NextStates};
use crate::simulation::params::{EngineSettings, Parameters};
use crate::simulation::queue::EventQueue;
use crate::simulation::states::{Body, NVec3, Shape, System};
use crate::simulation::workers::{Phase, PhaseRunner, WorkerPool};

/// Shared engine state for one scene: the body arena, the contact grid, the
/// next-state buffer, and the dispatch queue.
struct EngineCore {
    params: Parameters,
    system: RwLock<System>,
    grid: ContactGrid,
    next: NextStates,
    queue: Arc<EventQueue>,
    forces: ForceSet,
    fault: Mutex<Option<Error>>, // first invariant violation seen by the loop
}

impl EngineCore {
    /// Run one full tick: both parallel phases, then the serial integrate.
    fn step(&self, pool: &WorkerPool) -> Result<()> {
        let n = self.system.read().expect("system lock poisoned").bodies.len();
        if self.grid.len() != n || self.next.len() != n {
            return Err(Error::StateSizeMismatch {
                expected: self.grid.len(),
                actual: n,
            });
        }

        self.refill_queue(n)?;
        pool.run_phase(Phase::Collision);

        // The force phase depends on this tick's completed contact grid;
        // the barrier above guarantees it.
        self.refill_queue(n)?;
        pool.run_phase(Phase::Force);

        let mut sys = self.system.write().expect("system lock poisoned");
        integrator::apply_deltas(&mut sys, &self.next, self.params.tick);
        Ok(())
    }

    /// A non-empty queue here means a prior phase failed to drain: a
    /// synchronization bug, reported rather than ignored.
    fn refill_queue(&self, n: usize) -> Result<()> {
        let remaining = self.queue.len();
        if remaining != 0 {
            return Err(Error::QueueNotDrained { remaining });
        }
        self.queue.push_all(n);
        Ok(())
    }

    fn body_count(&self) -> usize {
        self.system.read().expect("system lock poisoned").bodies.len()
    }

    fn record_fault(&self, e: Error) {
        let mut fault = self.fault.lock().expect("fault slot lock poisoned");
        fault.get_or_insert(e);
    }

    fn take_fault(&self) -> Option<Error> {
        self.fault.lock().expect("fault slot lock poisoned").take()
    }
}

impl PhaseRunner for EngineCore {
    fn run(&self, phase: Phase, index: usize) {
        match phase {
            Phase::Collision => {
                let sys = self.system.read().expect("system lock poisoned");
                self.grid.update_row(index, &sys);
            }
            Phase::Force => {
                let sys = self.system.read().expect("system lock poisoned");
                let contacts = self.grid.lock_row(index);
                let body = &sys.bodies[index];

                let mut force = NVec3::zeros();
                self.forces.accumulate(body, &sys, &contacts, &mut force);

                // Buffered, never applied to the live velocity here: other
                // workers are still reading this body as a force source.
                if body.movable {
                    let dv = force / (body.m + self.params.eps) * self.params.tick;
                    self.next.store(index, dv);
                }
            }
        }
    }
}

/// The public control surface of the simulation engine.
///
/// Construction validates configuration, `set_scene` builds the per-scene
/// buffers, `start` launches the coordinator thread, `finish` stops after
/// the in-flight tick and reports any fault the loop recorded. `step_once`
/// drives a single tick synchronously (worker pool engaged, no pacing) for
/// headless and test use.
pub struct Simulation {
    params: Parameters,
    settings: EngineSettings,
    core: Option<Arc<EngineCore>>,
    pool: Option<Arc<WorkerPool>>,
    coordinator: Option<JoinHandle<()>>,
    run: Arc<AtomicBool>,
}

impl Simulation {
    pub fn new(params: Parameters, settings: EngineSettings) -> Result<Self> {
        if !(params.tick.is_finite() && params.tick > 0.0) {
            return Err(Error::InvalidParam("tick must be finite and > 0".into()));
        }
        if !(params.eps.is_finite() && params.eps > 0.0) {
            return Err(Error::InvalidParam("eps must be finite and > 0".into()));
        }
        if !(params.stiffness.is_finite() && params.stiffness >= 0.0) {
            return Err(Error::InvalidParam(
                "stiffness must be finite and >= 0".into(),
            ));
        }
        if !params.big_g.is_finite() || !params.g.is_finite() {
            return Err(Error::InvalidParam("G and g must be finite".into()));
        }
        if settings.workers == 0 {
            return Err(Error::InvalidParam("worker count must be at least 1".into()));
        }

        Ok(Self {
            params,
            settings,
            core: None,
            pool: None,
            coordinator: None,
            run: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Install the scene. Ids are assigned by position in `bodies`; the body
    /// count is fixed until the next `set_scene`.
    pub fn set_scene(&mut self, mut bodies: Vec<Body>) -> Result<()> {
        if self.coordinator.is_some() {
            return Err(Error::AlreadyRunning);
        }
        if bodies.is_empty() {
            return Err(Error::InvalidParam("scene has no bodies".into()));
        }
        for (i, body) in bodies.iter_mut().enumerate() {
            validate_body(i, body)?;
            body.id = i;
        }

        // The pool is bound to the previous scene's core; rebuild it lazily.
        if let Some(pool) = self.pool.take() {
            pool.shutdown();
        }

        let n = bodies.len();
        self.core = Some(Arc::new(EngineCore {
            params: self.params.clone(),
            system: RwLock::new(System { bodies, t: 0.0 }),
            grid: ContactGrid::new(n),
            next: NextStates::new(n),
            queue: Arc::new(EventQueue::new()),
            forces: ForceSet::standard(&self.params),
            fault: Mutex::new(None),
        }));
        Ok(())
    }

    /// Launch the coordinator thread. Non-blocking; ticks run at the
    /// configured interval until `finish`.
    pub fn start(&mut self) -> Result<()> {
        if self.coordinator.is_some() {
            return Err(Error::AlreadyRunning);
        }
        let core = Arc::clone(self.core.as_ref().ok_or(Error::NoScene)?);
        let pool = self.ensure_pool()?;

        let run = Arc::clone(&self.run);
        run.store(true, Ordering::SeqCst);
        let tick = Duration::from_secs_f64(self.params.tick);
        let pacing = self.settings.pacing.clone();

        log::info!(
            "starting: {} bodies, {} workers, tick {:?}, pacing {:?}",
            core.body_count(),
            self.settings.workers,
            tick,
            pacing
        );

        let handle = thread::Builder::new()
            .name("rbsim-coordinator".into())
            .spawn(move || {
                // The run flag is checked once per iteration only; stopping
                // waits out the in-flight tick, including its pacing wait.
                while run.load(Ordering::SeqCst) {
                    let started = Instant::now();
                    if let Err(e) = core.step(&pool) {
                        log::error!("tick aborted: {e}");
                        core.record_fault(e);
                        break;
                    }
                    pace(started, tick, &pacing);
                }
            })?;
        self.coordinator = Some(handle);
        Ok(())
    }

    /// Unimplemented; ticks keep running. Kept on the control surface as a
    /// documented gap.
    pub fn pause(&self) {}

    /// Stop after the in-flight tick, join the coordinator, and tear down
    /// the worker pool. Returns the first fault the tick loop recorded, if
    /// any; a panicked coordinator is re-raised as unrecoverable.
    pub fn finish(&mut self) -> Result<()> {
        if self.coordinator.is_none() && self.pool.is_none() {
            return Err(Error::NotRunning);
        }
        self.run.store(false, Ordering::SeqCst);
        if let Some(handle) = self.coordinator.take() {
            if let Err(payload) = handle.join() {
                std::panic::resume_unwind(payload);
            }
        }
        if let Some(pool) = self.pool.take() {
            pool.shutdown();
        }
        log::info!("stopped");

        if let Some(core) = &self.core {
            if let Some(e) = core.take_fault() {
                return Err(e);
            }
        }
        Ok(())
    }

    /// Drive exactly one tick through the full phased protocol on the
    /// calling thread. Not available while the coordinator is running.
    pub fn step_once(&mut self) -> Result<()> {
        if self.coordinator.is_some() {
            return Err(Error::AlreadyRunning);
        }
        let core = Arc::clone(self.core.as_ref().ok_or(Error::NoScene)?);
        let pool = self.ensure_pool()?;
        core.step(&pool)
    }

    /// Per-body centroids, read-only. Safe to call while ticks are running.
    pub fn positions(&self) -> Result<Vec<NVec3>> {
        let core = self.core.as_ref().ok_or(Error::NoScene)?;
        let sys = core.system.read().expect("system lock poisoned");
        Ok(sys.bodies.iter().map(|b| b.x).collect())
    }

    /// Per-body velocities, read-only. Safe to call while ticks are running.
    pub fn velocities(&self) -> Result<Vec<NVec3>> {
        let core = self.core.as_ref().ok_or(Error::NoScene)?;
        let sys = core.system.read().expect("system lock poisoned");
        Ok(sys.bodies.iter().map(|b| b.v).collect())
    }

    /// Simulated time elapsed since the scene was set.
    pub fn time(&self) -> Result<f64> {
        let core = self.core.as_ref().ok_or(Error::NoScene)?;
        Ok(core.system.read().expect("system lock poisoned").t)
    }

    fn ensure_pool(&mut self) -> Result<Arc<WorkerPool>> {
        let core = self.core.as_ref().ok_or(Error::NoScene)?;
        match &self.pool {
            Some(pool) => Ok(Arc::clone(pool)),
            None => {
                let pool = Arc::new(WorkerPool::spawn(
                    self.settings.workers,
                    Arc::clone(&core.queue),
                    Arc::clone(core),
                )?);
                self.pool = Some(Arc::clone(&pool));
                Ok(pool)
            }
        }
    }
}

impl Drop for Simulation {
    fn drop(&mut self) {
        self.run.store(false, Ordering::SeqCst);
        if let Some(handle) = self.coordinator.take() {
            let _ = handle.join();
        }
        if let Some(pool) = self.pool.take() {
            pool.shutdown();
        }
    }
}

/// Wait out the remainder of the tick interval.
///
/// Spin pacing polls the monotonic clock in a hot loop for sub-millisecond
/// precision at the price of a fully busy core; sleep pacing hands the
/// remainder to the OS scheduler and accepts its wake-up jitter.
fn pace(started: Instant, tick: Duration, pacing: &PacingConfig) {
    match pacing {
        PacingConfig::Spin => {
            while started.elapsed() < tick {
                std::hint::spin_loop();
            }
        }
        PacingConfig::Sleep => {
            let elapsed = started.elapsed();
            if elapsed < tick {
                thread::sleep(tick - elapsed);
            }
        }
    }
}

fn validate_body(i: usize, body: &Body) -> Result<()> {
    if !(body.m.is_finite() && body.m >= 0.0) {
        return Err(Error::InvalidParam(format!(
            "body {i}: mass must be finite and >= 0"
        )));
    }
    if !body.x.iter().all(|c| c.is_finite()) || !body.v.iter().all(|c| c.is_finite()) {
        return Err(Error::InvalidParam(format!(
            "body {i}: position and velocity must be finite"
        )));
    }
    match &body.shape {
        Shape::Sphere { radius } => {
            if !(radius.is_finite() && *radius > 0.0) {
                return Err(Error::InvalidParam(format!(
                    "body {i}: sphere radius must be finite and > 0"
                )));
            }
        }
        Shape::Cube { half_extents } => {
            if !half_extents.iter().all(|h| h.is_finite() && *h > 0.0) {
                return Err(Error::InvalidParam(format!(
                    "body {i}: cube half-extents must be finite and > 0"
                )));
            }
        }
    }
    Ok(())
}
