//! Core state types for the rigid body simulation.
//!
//! Defines the body/system structs shared by every phase:
//! - `Shape` – tagged shape variant (sphere or axis-aligned cube)
//! - `Body`  – per-object physical state, no behavior
//! - `System` – the body arena plus the current simulation time `t`
//!
//! The body count is fixed for the lifetime of a run; `Body::id` is the
//! stable index into every per-body buffer (contact rows, next-state slots).

use std::fmt;

use nalgebra::Vector3;
pub type NVec3 = Vector3<f64>;

/// Geometric shape of a body. Extents are half-sizes: a sphere carries its
/// radius, a cube the three half-extents along the coordinate axes.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Sphere { radius: f64 },
    Cube { half_extents: NVec3 },
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Sphere { .. } => ShapeKind::Sphere,
            Shape::Cube { .. } => ShapeKind::Cube,
        }
    }
}

/// Shape discriminant, used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Sphere,
    Cube,
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeKind::Sphere => write!(f, "sphere"),
            ShapeKind::Cube => write!(f, "cube"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Body {
    pub id: usize, // stable index into all per-body buffers
    pub shape: Shape,
    pub m: f64, // mass; 0 is allowed and handled by the regularized divide
    pub x: NVec3, // centroid
    pub v: NVec3, // velocity
    pub movable: bool, // immovable bodies exert forces but never accumulate deltas
}

#[derive(Debug, Clone)]
pub struct System {
    pub bodies: Vec<Body>, // arena; index == Body::id
    pub t: f64, // time
}
