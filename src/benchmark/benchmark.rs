use std::time::Instant;

use crate::simulation::collision::{test_pair, ContactRow};
use crate::simulation::forces::ForceSet;
use crate::simulation::params::Parameters;
use crate::simulation::states::{Body, NVec3, Shape, System};

/// Helper to build a deterministic sphere cloud of size `n`
fn make_system(n: usize) -> System {
    let mut bodies = Vec::with_capacity(n);

    for i in 0..n {
        let i_f = i as f64;
        // deterministic positions, no rand needed
        let x = NVec3::new(
            (i_f * 0.37).sin() * 5.0,
            (i_f * 0.13).cos() * 5.0,
            (i_f * 0.07).sin() * 5.0,
        );

        bodies.push(Body {
            id: i,
            shape: Shape::Sphere { radius: 0.5 },
            m: 1.0,
            x,
            v: NVec3::zeros(),
            movable: true,
        });
    }

    System { bodies, t: 0.0 }
}

/// Benchmark the full N^2 ordered-pair collision sweep for a range of n.
pub fn bench_collision() {
    let ns = [50, 100, 200, 400, 800];

    for n in ns {
        let sys = make_system(n);

        let sweep = || {
            let mut hits = 0usize;
            for i in 0..n {
                for j in 0..n {
                    if i == j {
                        continue;
                    }
                    if let Ok(Some(_)) = test_pair(&sys.bodies[i], &sys.bodies[j]) {
                        hits += 1;
                    }
                }
            }
            hits
        };

        // Warm up
        let hits = sweep();

        let t0 = Instant::now();
        let _ = sweep();
        let dt = t0.elapsed().as_secs_f64();

        println!("N = {n:4}, collision sweep = {dt:9.6} s, contacts = {hits}");
    }
}

/// Benchmark force accumulation over all bodies for a range of n.
pub fn bench_forces() {
    let ns = [50, 100, 200, 400, 800];
    let params = Parameters::default();

    for n in ns {
        let sys = make_system(n);
        let forces = ForceSet::standard(&params);
        let contacts = ContactRow::new(n);
        let mut out = NVec3::zeros();

        let pass = |out: &mut NVec3| {
            for body in &sys.bodies {
                forces.accumulate(body, &sys, &contacts, out);
            }
        };

        // Warm up
        pass(&mut out);

        let t0 = Instant::now();
        pass(&mut out);
        let dt = t0.elapsed().as_secs_f64();

        println!("N = {n:4}, force pass = {dt:9.6} s");
    }
}
