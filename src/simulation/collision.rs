//! Pairwise collision detection and the per-tick contact matrices.
//!
//! Three N×N buffers are rebuilt from scratch every tick:
//! - `collided[i][j]` (bool, symmetric)
//! - `depth[i][j]`    (signed squared-space scalar, symmetric; negative = overlap)
//! - `normal[i][j]`   (unnormalized direction, antisymmetric)
//!
//! The grid is stored as one row per body behind its own mutex. During the
//! collision phase each row is rebuilt exclusively by the worker that popped
//! its index; the row lock is therefore never contended, it exists to make
//! the partition-by-destination write pattern expressible in safe code.
//! Antisymmetry is not enforced by cross-row writes: the owner of row j
//! independently evaluates the mirrored pair (j, i).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::simulation::states::{Body, NVec3, Shape, System};

/// Result of one ordered pair test. `depth` is the most negative penetration
/// found across the pair's sub-tests; `normal` is the direction that pushes
/// the first body of the pair away from the second.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub depth: f64,
    pub normal: NVec3,
}

/// One row of the contact matrices, indexed by partner id.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactRow {
    pub collided: Vec<bool>,
    pub depth: Vec<f64>,
    pub normal: Vec<NVec3>,
}

impl ContactRow {
    pub fn new(n: usize) -> Self {
        Self {
            collided: vec![false; n],
            depth: vec![0.0; n],
            normal: vec![NVec3::zeros(); n],
        }
    }

    /// Clear every cell, including the self-pair. Rows carry last tick's
    /// values until this runs, so it must precede the pair tests.
    fn reset(&mut self) {
        self.collided.fill(false);
        self.depth.fill(0.0);
        self.normal.fill(NVec3::zeros());
    }
}

/// The N×N contact state, row-partitioned for the worker phase.
pub struct ContactGrid {
    rows: Vec<Mutex<ContactRow>>,
    gap_logged: AtomicBool, // cube-cube warning fires once per grid
}

impl ContactGrid {
    pub fn new(n: usize) -> Self {
        Self {
            rows: (0..n).map(|_| Mutex::new(ContactRow::new(n))).collect(),
            gap_logged: AtomicBool::new(false),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rebuild row `i` from the current body positions. Called by exactly one
    /// worker per index per phase; every ordered pair (i, j) is tested here,
    /// so the mirrored cell (j, i) is produced when the owner of row j runs.
    pub fn update_row(&self, i: usize, sys: &System) {
        let mut row = self.rows[i].lock().expect("contact row lock poisoned");
        row.reset();

        let body = &sys.bodies[i];
        for (j, other) in sys.bodies.iter().enumerate() {
            if j == i {
                continue;
            }
            match test_pair(body, other) {
                Ok(Some(contact)) => {
                    row.collided[j] = true;
                    row.depth[j] = contact.depth;
                    row.normal[j] = contact.normal;
                }
                Ok(None) => {}
                Err(e) => {
                    // Unimplemented pair geometry is treated as no contact in
                    // the tick loop; the typed error stays visible to direct
                    // callers and the gap is reported once here.
                    if !self.gap_logged.swap(true, Ordering::Relaxed) {
                        log::warn!("{e}; pair left as non-colliding");
                    }
                }
            }
        }
    }

    /// Exclusive access to row `i`, used by the force phase for the same
    /// index it dequeued.
    pub fn lock_row(&self, i: usize) -> MutexGuard<'_, ContactRow> {
        self.rows[i].lock().expect("contact row lock poisoned")
    }

    /// Clone of row `i`, for inspection outside a phase.
    pub fn row_snapshot(&self, i: usize) -> ContactRow {
        self.lock_row(i).clone()
    }
}

/// Test the ordered pair (a, b) and return the contact oriented for `a`,
/// `None` when the shapes do not overlap, or a typed error for pair
/// geometries the detector does not support (cube-cube).
pub fn test_pair(a: &Body, b: &Body) -> Result<Option<Contact>> {
    match (&a.shape, &b.shape) {
        (Shape::Sphere { radius: ra }, Shape::Sphere { radius: rb }) => {
            Ok(sphere_sphere(a.x, *ra, b.x, *rb))
        }
        (Shape::Sphere { radius }, Shape::Cube { half_extents }) => {
            Ok(sphere_cube(a.x, *radius, b.x, half_extents))
        }
        (Shape::Cube { half_extents }, Shape::Sphere { radius }) => {
            // Same tests, re-oriented so the normal pushes the cube.
            Ok(sphere_cube(b.x, *radius, a.x, half_extents).map(|c| Contact {
                depth: c.depth,
                normal: -c.normal,
            }))
        }
        (Shape::Cube { .. }, Shape::Cube { .. }) => {
            Err(Error::UnsupportedPair(a.shape.kind(), b.shape.kind()))
        }
    }
}

/// Sphere-sphere overlap in squared space: depth = d^2 - (ra + rb)^2, which
/// avoids the square root. The normal is the unnormalized center offset.
fn sphere_sphere(xa: NVec3, ra: f64, xb: NVec3, rb: f64) -> Option<Contact> {
    let offset = xa - xb;
    let depth = offset.norm_squared() - (ra + rb) * (ra + rb);
    if depth < 0.0 {
        Some(Contact {
            depth,
            normal: offset,
        })
    } else {
        None
    }
}

/// Sphere against an axis-aligned cube: six oriented face-plane tests
/// restricted to the face footprint, then eight corner tests. Every hit
/// feeds the same cell through min-penetration accumulation; on equal depth
/// the earlier test wins, so faces shadow corners. That tie order is an
/// accepted approximation, not a geometric invariant.
fn sphere_cube(center: NVec3, radius: f64, cube_center: NVec3, half_extents: &NVec3) -> Option<Contact> {
    let axes = cube_axes(half_extents);
    let r2 = radius * radius;
    let mut best: Option<Contact> = None;

    // Face tests: two signed normals per axis.
    for (k, axis) in axes.iter().enumerate() {
        for normal in [*axis, -*axis] {
            let plane = cube_center + normal;
            let depth = dist2_point_plane(&center, &plane, &normal) - r2;
            if depth < 0.0 && point_in_face(&center, &plane, &normal, &axes, k) {
                merge_hit(&mut best, depth, normal);
            }
        }
    }

    // Corner tests: point-to-point squared distance against the radius.
    for s0 in [1.0, -1.0] {
        for s1 in [1.0, -1.0] {
            for s2 in [1.0, -1.0] {
                let corner = cube_center + s0 * axes[0] + s1 * axes[1] + s2 * axes[2];
                let depth = (corner - center).norm_squared() - r2;
                if depth < 0.0 {
                    merge_hit(&mut best, depth, center - corner);
                }
            }
        }
    }

    best
}

/// Keep the most negative depth and the normal of whichever test produced it.
fn merge_hit(best: &mut Option<Contact>, depth: f64, normal: NVec3) {
    match best {
        Some(c) if depth >= c.depth => {}
        _ => *best = Some(Contact { depth, normal }),
    }
}

/// The cube's three half-extent vectors along the coordinate axes.
fn cube_axes(half_extents: &NVec3) -> [NVec3; 3] {
    [
        NVec3::new(half_extents.x, 0.0, 0.0),
        NVec3::new(0.0, half_extents.y, 0.0),
        NVec3::new(0.0, 0.0, half_extents.z),
    ]
}

/// Squared distance from `point` to the plane through `plane` with (not
/// necessarily unit) normal `normal`.
fn dist2_point_plane(point: &NVec3, plane: &NVec3, normal: &NVec3) -> f64 {
    let v = point - plane;
    let d = v.dot(normal);
    d * d / normal.dot(normal)
}

/// Whether `point` sits on the outward side of the face through `plane` and
/// projects inside the face rectangle. `skip` is the axis index of the face
/// normal; the other two axes span the rectangle.
fn point_in_face(point: &NVec3, plane: &NVec3, normal: &NVec3, axes: &[NVec3; 3], skip: usize) -> bool {
    if normal.dot(&(point - plane)) < 0.0 {
        return false;
    }

    let mut tangents = [NVec3::zeros(); 2];
    let mut t = 0;
    for (k, axis) in axes.iter().enumerate() {
        if k != skip {
            tangents[t] = *axis;
            t += 1;
        }
    }
    let (u, w) = (tangents[0], tangents[1]);

    let corners = [plane + u + w, plane - u + w, plane - u - w, plane + u - w];
    for i in 0..4 {
        let ea = corners[(i + 1) % 4] - corners[i];
        let eb = corners[(i + 3) % 4] - corners[i];
        let p = point - corners[i];
        if ea.dot(&p) < 0.0 || eb.dot(&p) < 0.0 {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn point_plane_distance_is_squared() {
        let d2 = dist2_point_plane(
            &NVec3::new(0.0, 0.0, 1.3),
            &NVec3::new(0.0, 0.0, 1.0),
            &NVec3::new(0.0, 0.0, 2.0), // unnormalized on purpose
        );
        assert_relative_eq!(d2, 0.09, max_relative = 1e-12);
    }

    #[test]
    fn face_footprint_rejects_point_behind_plane() {
        let axes = cube_axes(&NVec3::new(1.0, 1.0, 1.0));
        let normal = axes[2];
        let plane = NVec3::new(0.0, 0.0, 1.0);
        assert!(point_in_face(&NVec3::new(0.0, 0.0, 1.5), &plane, &normal, &axes, 2));
        // Inside the cube, behind the +z face plane.
        assert!(!point_in_face(&NVec3::new(0.0, 0.0, 0.5), &plane, &normal, &axes, 2));
        // Beyond the rectangle footprint.
        assert!(!point_in_face(&NVec3::new(1.5, 0.0, 1.5), &plane, &normal, &axes, 2));
    }

    #[test]
    fn merge_hit_prefers_deeper_and_earlier() {
        let mut best = None;
        merge_hit(&mut best, -0.1, NVec3::new(1.0, 0.0, 0.0));
        merge_hit(&mut best, -0.3, NVec3::new(0.0, 1.0, 0.0));
        // Equal depth must not displace the earlier hit.
        merge_hit(&mut best, -0.3, NVec3::new(0.0, 0.0, 1.0));
        let c = best.expect("hit recorded");
        assert_eq!(c.depth, -0.3);
        assert_eq!(c.normal, NVec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn separated_spheres_return_none() {
        assert!(sphere_sphere(NVec3::zeros(), 1.0, NVec3::new(2.0, 0.0, 0.0), 1.0).is_none());
    }
}
