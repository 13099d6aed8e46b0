//! Force contributors for the rigid body engine
//!
//! Each term implements [`BodyForce`] and adds its contribution for one body
//! into a shared accumulator; the standard set is pairwise gravity, the
//! uniform field, and the collision penalty spring.
//!
//! Terms are evaluated during the force phase for the body index a worker
//! dequeued. They read the whole system and that body's contact row, and
//! write nothing; the caller turns the summed force into a buffered
//! velocity delta.

use crate::simulation::collision::ContactRow;
use crate::simulation::params::Parameters;
use crate::simulation::states::{Body, NVec3, System};

/// Collection of force terms. Contributions are summed into a single force
/// vector per body.
pub struct ForceSet {
    terms: Vec<Box<dyn BodyForce + Send + Sync>>,
}

impl ForceSet {
    /// Create an empty force set
    pub fn new() -> Self {
        Self { terms: Vec::new() }
    }

    /// Add a force term
    pub fn with<T>(mut self, term: T) -> Self
    where
        T: BodyForce + Send + Sync + 'static,
    {
        self.terms.push(Box::new(term));
        self
    }

    /// The engine's standard model: pairwise gravity, uniform field, penalty
    /// spring, all driven by `params`.
    pub fn standard(params: &Parameters) -> Self {
        Self::new()
            .with(PairwiseGravity {
                big_g: params.big_g,
                eps: params.eps,
            })
            .with(UniformField { g: params.g })
            .with(PenaltySpring {
                stiffness: params.stiffness,
            })
    }

    /// Sum all contributions for `body` into `out`.
    pub fn accumulate(&self, body: &Body, sys: &System, contacts: &ContactRow, out: &mut NVec3) {
        *out = NVec3::zeros();
        for term in &self.terms {
            term.accumulate(body, sys, contacts, out);
        }
    }
}

impl Default for ForceSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for force sources acting on a single body.
/// Implementations add their contribution into `out`.
pub trait BodyForce {
    fn accumulate(&self, body: &Body, sys: &System, contacts: &ContactRow, out: &mut NVec3);
}

/// Newtonian gravity over all partners, regularized by `eps`:
/// F += G * m_i * m_j / (r^2 + eps) * (dx / (r + eps)).
/// The epsilon bounds the force at r -> 0 instead of excluding close pairs;
/// once bodies actually overlap the penalty spring dominates.
pub struct PairwiseGravity {
    pub big_g: f64, // gravitational constant
    pub eps: f64, // regularization
}

impl BodyForce for PairwiseGravity {
    fn accumulate(&self, body: &Body, sys: &System, _contacts: &ContactRow, out: &mut NVec3) {
        for other in &sys.bodies {
            if other.id == body.id {
                continue;
            }
            // Offset toward the partner; attraction acts along +offset.
            let offset = other.x - body.x;
            let r2 = offset.norm_squared();
            let r = r2.sqrt();
            *out += self.big_g * body.m * other.m / (r2 + self.eps) * (offset / (r + self.eps));
        }
    }
}

/// Uniform field term (0, 0, -m*g).
pub struct UniformField {
    pub g: f64,
}

impl BodyForce for UniformField {
    fn accumulate(&self, body: &Body, _sys: &System, _contacts: &ContactRow, out: &mut NVec3) {
        out.z -= body.m * self.g;
    }
}

/// Penalty spring pushing colliding bodies apart:
/// F += stiffness * |depth| * normalize(normal), per colliding partner.
/// The detector records depth as a negative value and the test compares the
/// sign; the force only uses the magnitude.
pub struct PenaltySpring {
    pub stiffness: f64,
}

impl BodyForce for PenaltySpring {
    fn accumulate(&self, _body: &Body, _sys: &System, contacts: &ContactRow, out: &mut NVec3) {
        for (j, &hit) in contacts.collided.iter().enumerate() {
            if !hit {
                continue;
            }
            // Coincident centers leave a zero-length normal; such a contact
            // exerts no penalty force rather than producing NaN.
            if let Some(n) = contacts.normal[j].try_normalize(0.0) {
                *out += self.stiffness * contacts.depth[j].abs() * n;
            }
        }
    }
}
