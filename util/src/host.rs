//! Host platform utility functions

use std::path::PathBuf;

/// Name of the environment variable pointing at the root of the software
/// repository, used to resolve parameter files and session directories.
pub const SW_ROOT_ENV_VAR: &str = "PADDLE_SW_ROOT";

/// Get the software root directory from the environment.
pub fn get_paddle_sw_root() -> Result<PathBuf, std::env::VarError> {
    std::env::var(SW_ROOT_ENV_VAR).map(PathBuf::from)
}
