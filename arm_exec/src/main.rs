//! Main arm executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise all modules
//!     - Main loop:
//!         - Ball simulation processing
//!         - Paddle control processing
//!         - Cycle management
//!
//! # Modules
//!
//! Cyclic modules (e.g. `ball_sim`) shall provide a public struct
//! implementing the `util::module::State` trait. `PaddleCtrl` owns a boxed
//! kinematic model and is constructed directly from its parameter file
//! instead.

// ---------------------------------------------------------------------------
// USE MODULES FROM LIBRARY
// ---------------------------------------------------------------------------

use arm_lib::{
    ball_sim::BallSim,
    kin_model::SerialChain,
    paddle_ctrl::PaddleCtrl,
};

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::{info, warn};
use nalgebra::Vector3;
use serde::Deserialize;
use serde_json::json;
use std::thread;
use std::time::{Duration, Instant};

// Internal
use util::{
    logger::{logger_init, LevelFilter},
    module::State,
    raise_error,
    session::Session,
};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Target period of one cycle.
const CYCLE_PERIOD_S: f64 = 0.01;

/// Number of consecutive cycle overruns before the exec gives up.
const MAX_CONSEC_CYCLE_OVERRUNS: u64 = 500;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Top level parameters of the executable.
#[derive(Debug, Clone, Deserialize)]
struct ExecParams {
    /// Point the ball shall be redirected toward.
    ///
    /// Units: meters
    target_pos_m: [f64; 3],

    /// Total run duration.
    ///
    /// Units: seconds
    run_duration_s: f64,
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("arm_exec", "sessions")
        .wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(LevelFilter::Debug, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Paddle Arm Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: ExecParams = util::params::load("arm_exec.toml")
        .wrap_err("Could not load exec params")?;

    let target_pos_m = Vector3::from(exec_params.target_pos_m);

    info!("Exec parameters loaded");
    info!("    Target: {:?} m", exec_params.target_pos_m);
    info!("    Run duration: {} s\n", exec_params.run_duration_s);

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let chain = SerialChain::from_param_file("arm_chain.toml")
        .wrap_err("Failed to load the kinematic chain")?;

    let mut paddle_ctrl = PaddleCtrl::init("paddle_ctrl.toml", Box::new(chain))
        .wrap_err("Failed to initialise PaddleCtrl")?;
    info!("PaddleCtrl init complete");

    let mut ball_sim = BallSim::default();
    ball_sim
        .init("ball_sim.toml", &session)
        .wrap_err("Failed to initialise BallSim")?;
    info!("BallSim init complete");

    info!("Module initialisation complete\n");

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let mut time_s = 0.0;
    let mut num_consec_cycle_overruns = 0u64;
    let mut ball_sim_report = Default::default();
    let mut paddle_ctrl_report = Default::default();

    while time_s < exec_params.run_duration_s {
        // Get cycle start time
        let cycle_start_instant = Instant::now();

        // ---- BALL SIMULATION PROCESSING ----

        let ball_obs = match ball_sim.proc(
            &arm_lib::ball_sim::InputData { time_s }
        ) {
            Ok((o, r)) => {
                ball_sim_report = r;
                o
            }
            Err(e) => raise_error!("Error during BallSim processing: {}", e),
        };

        // ---- CONTROL ALGORITHM PROCESSING ----

        let paddle_ctrl_input = arm_lib::paddle_ctrl::InputData {
            time_s,
            ball_pos_m: ball_obs.pos_m,
            ball_vel_ms: ball_obs.vel_ms,
            target_pos_m,
            ball_regenerated: ball_obs.regenerated,
        };

        match paddle_ctrl.proc(&paddle_ctrl_input) {
            Ok((o, r)) => {
                if !o.diag.is_empty() {
                    info!("{}", o.diag);
                }
                paddle_ctrl_report = r;
            }
            Err(e) => {
                // PaddleCtrl errors indicate a configuration problem rather
                // than a bad cycle, so issue the warning and continue.
                warn!("Error during PaddleCtrl processing: {}", e)
            }
        };

        // ---- CYCLE MANAGEMENT ----

        let cycle_dur = Instant::now() - cycle_start_instant;

        // Get sleep duration
        match Duration::from_secs_f64(CYCLE_PERIOD_S).checked_sub(cycle_dur) {
            Some(d) => {
                num_consec_cycle_overruns = 0;
                thread::sleep(d);
            }
            None => {
                warn!(
                    "Cycle overran by {:.06} s",
                    cycle_dur.as_secs_f64() - CYCLE_PERIOD_S
                );
                num_consec_cycle_overruns += 1;

                if num_consec_cycle_overruns > MAX_CONSEC_CYCLE_OVERRUNS {
                    raise_error!(
                        "More than {} consecutive cycle overruns!",
                        MAX_CONSEC_CYCLE_OVERRUNS
                    );
                }
            }
        }

        time_s += CYCLE_PERIOD_S;
    }

    // ---- SHUTDOWN ----

    session.save_json(
        "final_report.json",
        &json!({
            "paddle_ctrl": paddle_ctrl_report,
            "ball_sim": ball_sim_report,
        }),
    );

    info!("End of execution");

    Ok(())
}
