//! Next-state buffering and the serial integration step.
//!
//! `NextStates` holds one velocity-delta slot per body. The force phase
//! stores into the slot matching the index it dequeued; the integrator
//! consumes and clears every slot after both phases have joined.

use std::mem;
use std::sync::Mutex;

use crate::simulation::states::{NVec3, System};

/// Per-body velocity-delta accumulator. Slot `i` is written by at most one
/// worker per tick (the owner of index `i`), so the per-slot lock is never
/// contended.
pub struct NextStates {
    slots: Vec<Mutex<NVec3>>,
}

impl NextStates {
    pub fn new(n: usize) -> Self {
        Self {
            slots: (0..n).map(|_| Mutex::new(NVec3::zeros())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Record the buffered delta for body `i`. The body's live velocity is
    /// untouched until integration; other workers keep reading a stable
    /// source state for the rest of the phase.
    pub fn store(&self, i: usize, dv: NVec3) {
        *self.slots[i].lock().expect("next-state slot lock poisoned") = dv;
    }

    fn take(&self, i: usize) -> NVec3 {
        let mut slot = self.slots[i].lock().expect("next-state slot lock poisoned");
        mem::replace(&mut *slot, NVec3::zeros())
    }
}

/// Apply the buffered deltas and advance positions by one tick, serially.
///
/// Velocity updates first, then the displacement uses the already-updated
/// velocity (semi-implicit Euler). Reversing that ordering changes the
/// energy behavior of the scheme and is a correctness bug, not a style
/// choice. Immovable bodies have empty slots and keep their velocity, but
/// still displace by it.
pub fn apply_deltas(sys: &mut System, next: &NextStates, dt: f64) {
    for body in sys.bodies.iter_mut() {
        let dv = next.take(body.id);
        body.v += dv;
        body.x += dt * body.v;
    }
    sys.t += dt;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::states::{Body, Shape};

    fn one_sphere(v: NVec3) -> System {
        System {
            bodies: vec![Body {
                id: 0,
                shape: Shape::Sphere { radius: 1.0 },
                m: 1.0,
                x: NVec3::zeros(),
                v,
                movable: true,
            }],
            t: 0.0,
        }
    }

    #[test]
    fn displacement_uses_updated_velocity() {
        let mut sys = one_sphere(NVec3::new(1.0, 0.0, 0.0));
        let next = NextStates::new(1);
        next.store(0, NVec3::new(1.0, 0.0, 0.0));

        apply_deltas(&mut sys, &next, 0.5);

        // v = 2 first, then x = 2 * 0.5; the pre-update velocity would give 0.5.
        assert_eq!(sys.bodies[0].v, NVec3::new(2.0, 0.0, 0.0));
        assert_eq!(sys.bodies[0].x, NVec3::new(1.0, 0.0, 0.0));
        assert_eq!(sys.t, 0.5);
    }

    #[test]
    fn slots_clear_after_apply() {
        let mut sys = one_sphere(NVec3::zeros());
        let next = NextStates::new(1);
        next.store(0, NVec3::new(0.0, 0.0, -1.0));

        apply_deltas(&mut sys, &next, 1.0);
        apply_deltas(&mut sys, &next, 1.0);

        // Second tick saw an empty slot; velocity unchanged.
        assert_eq!(sys.bodies[0].v, NVec3::new(0.0, 0.0, -1.0));
    }
}
