//! State structures and processing for the BallSim module

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::info;
use nalgebra::Vector3;
use serde::Serialize;

// Internal
use super::{BallSimError, Params};
use util::{
    maths::lin_map,
    module::State,
    params,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Fractional part of the golden ratio, used as a low-discrepancy sequence
/// increment for the spawn states.
const GOLDEN_FRAC: f64 = 0.618_033_988_75;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Ball simulation module.
pub struct BallSim {
    /// Parameters for the module.
    params: Params,

    /// Current ball position.
    pos_m: Vector3<f64>,

    /// Current ball velocity.
    vel_ms: Vector3<f64>,

    /// Time of the last processing cycle.
    last_time_s: f64,

    /// Time at which the next regeneration occurs.
    next_regen_time_s: f64,

    /// Number of regenerations so far.
    num_regens: u64,
}

/// Input data to BallSim.
#[derive(Debug, Clone, Copy)]
pub struct InputData {
    /// Current control time.
    ///
    /// Units: seconds
    pub time_s: f64,
}

/// An observation of the simulated ball.
#[derive(Debug, Clone)]
pub struct BallObservation {
    /// Ball position.
    ///
    /// Units: meters
    pub pos_m: Vector3<f64>,

    /// Ball velocity.
    ///
    /// Units: meters/second
    pub vel_ms: Vector3<f64>,

    /// True on the cycle in which the ball was regenerated.
    pub regenerated: bool,
}

/// Status report on the operation of BallSim during a cycle.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusReport {
    /// Total number of regenerations since initialisation.
    pub num_regens: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for BallSim {
    fn default() -> Self {
        Self {
            params: Params::default(),
            pos_m: Vector3::zeros(),
            vel_ms: Vector3::zeros(),
            last_time_s: 0.0,
            next_regen_time_s: 0.0,
            num_regens: 0,
        }
    }
}

impl BallSim {
    /// Regenerate the ball at a new spawn state.
    ///
    /// Spawn states follow a golden-ratio low-discrepancy sequence through
    /// the configured windows, spreading them evenly while keeping the run
    /// fully deterministic.
    fn regenerate(&mut self) {
        for i in 0..3 {
            let phase = (self.num_regens as f64 * GOLDEN_FRAC
                + i as f64 * GOLDEN_FRAC * GOLDEN_FRAC)
                .fract();

            self.pos_m[i] = lin_map(
                (0.0, 1.0),
                (self.params.spawn_pos_min_m[i], self.params.spawn_pos_max_m[i]),
                phase,
            );
            self.vel_ms[i] = lin_map(
                (0.0, 1.0),
                (self.params.spawn_vel_min_ms[i], self.params.spawn_vel_max_ms[i]),
                phase,
            );
        }

        self.num_regens += 1;

        info!(
            "Ball regenerated at [{:.3}, {:.3}, {:.3}] m with velocity \
            [{:.3}, {:.3}, {:.3}] m/s",
            self.pos_m.x, self.pos_m.y, self.pos_m.z,
            self.vel_ms.x, self.vel_ms.y, self.vel_ms.z
        );
    }
}

impl State for BallSim {
    type InitData = &'static str;
    type InitError = BallSimError;

    type InputData = InputData;
    type OutputData = BallObservation;
    type StatusReport = StatusReport;
    type ProcError = BallSimError;

    /// Initialise the ball simulation.
    ///
    /// Expected init data: path to the parameter file.
    fn init(
        &mut self,
        init_data: Self::InitData,
        _session: &Session,
    ) -> Result<(), Self::InitError> {
        self.params = params::load(init_data)?;
        Ok(())
    }

    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        let dt_s = input_data.time_s - self.last_time_s;
        if dt_s < 0.0 {
            return Err(BallSimError::NegativeTimeStep(dt_s));
        }
        self.last_time_s = input_data.time_s;

        let regenerated = input_data.time_s >= self.next_regen_time_s;

        if regenerated {
            self.regenerate();
            self.next_regen_time_s =
                input_data.time_s + self.params.regen_period_s;
        }
        else {
            // Ballistic propagation
            self.pos_m += self.vel_ms * dt_s;
            self.vel_ms.z -= self.params.gravity_mss * dt_s;
        }

        Ok((
            BallObservation {
                pos_m: self.pos_m,
                vel_ms: self.vel_ms,
                regenerated,
            },
            StatusReport {
                num_regens: self.num_regens,
            },
        ))
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_first_cycle_regenerates() {
        let mut sim = BallSim::default();

        let (obs, report) = sim.proc(&InputData { time_s: 0.0 }).unwrap();
        assert!(obs.regenerated);
        assert_eq!(report.num_regens, 1);

        // Spawn state lies inside the configured windows
        let params = Params::default();
        for i in 0..3 {
            assert!(obs.pos_m[i] >= params.spawn_pos_min_m[i]);
            assert!(obs.pos_m[i] <= params.spawn_pos_max_m[i]);
            assert!(obs.vel_ms[i] >= params.spawn_vel_min_ms[i]);
            assert!(obs.vel_ms[i] <= params.spawn_vel_max_ms[i]);
        }
    }

    #[test]
    fn test_ballistic_propagation() {
        let mut sim = BallSim::default();

        let (spawn, _) = sim.proc(&InputData { time_s: 0.0 }).unwrap();
        let (obs, _) = sim.proc(&InputData { time_s: 0.01 }).unwrap();

        assert!(!obs.regenerated);
        assert!((obs.pos_m - (spawn.pos_m + spawn.vel_ms * 0.01)).norm() < 1e-12);
        assert!(
            (obs.vel_ms.z - (spawn.vel_ms.z - 9.82 * 0.01)).abs() < 1e-12
        );
    }

    #[test]
    fn test_regeneration_period() {
        let mut sim = BallSim::default();
        let params = Params::default();

        let mut num_regens = 0;
        let mut time_s = 0.0;
        while time_s < 2.0 * params.regen_period_s + 0.005 {
            let (obs, _) = sim.proc(&InputData { time_s }).unwrap();
            if obs.regenerated {
                num_regens += 1;
            }
            time_s += 0.01;
        }

        assert_eq!(num_regens, 3);
    }

    #[test]
    fn test_deterministic_spawns() {
        let mut sim_a = BallSim::default();
        let mut sim_b = BallSim::default();

        for k in 0..1000 {
            let input = InputData { time_s: k as f64 * 0.01 };
            let (obs_a, _) = sim_a.proc(&input).unwrap();
            let (obs_b, _) = sim_b.proc(&input).unwrap();
            assert_eq!(obs_a.pos_m, obs_b.pos_m);
            assert_eq!(obs_a.vel_ms, obs_b.vel_ms);
        }
    }

    #[test]
    fn test_negative_time_step_rejected() {
        let mut sim = BallSim::default();
        sim.proc(&InputData { time_s: 1.0 }).unwrap();

        assert!(matches!(
            sim.proc(&InputData { time_s: 0.5 }),
            Err(BallSimError::NegativeTimeStep(_))
        ));
    }
}
