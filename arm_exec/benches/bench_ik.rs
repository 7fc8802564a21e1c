//! Benchmark for the IK solver.
//!
//! A full solve runs inside the control cycle on every replan, so its
//! duration bounds how late a replan can happen without overrunning the
//! cycle.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use arm_lib::{
    kin_model::{ChainParams, KinematicModel, SerialChain},
    paddle_ctrl::{IkGoal, IkSolver, Params},
};
use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::{DVector, Vector3};

// ---------------------------------------------------------------------------
// BENCHMARKS
// ---------------------------------------------------------------------------

fn bench_ik_solve(c: &mut Criterion) {
    let params = Params::default();
    let solver = IkSolver::new(&params);
    let chain = SerialChain::from_params(&ChainParams::default())
        .expect("default chain is valid");

    let q_seed = DVector::from_vec(params.idle_pose_rad.clone());

    // Goal taken from a perturbed configuration so the solve always
    // converges
    let mut q_goal = q_seed.clone();
    let perturbation = [0.3, -0.2, 0.4, 0.3, -0.2, 0.1, 0.2];
    for (i, dq) in perturbation.iter().enumerate() {
        q_goal[i] += dq;
    }
    let goal_task = chain.fkin(&q_goal);

    let goal = IkGoal {
        pos_m: goal_task.pos_m,
        rot: goal_task.rot,
        lin_vel_ms: Vector3::new(0.1, -0.2, 0.3),
        ang_vel_rads: Vector3::zeros(),
    };

    c.bench_function("ik_solve", |b| {
        b.iter(|| {
            solver
                .solve(&chain, &q_seed, &goal)
                .expect("benchmark goal is reachable")
        })
    });
}

criterion_group!(benches, bench_ik_solve);
criterion_main!(benches);
