//! # Voxel World Demo
//!
//! Generates a small world around the origin, lights and meshes it, and saves
//! it to `./world`. An optional JSON config path may be passed as the only
//! argument.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- world.json
//! ```

use std::{path::PathBuf, process::ExitCode};

use log::error;

fn main() -> ExitCode {
    voxel_world::init_logging();
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    match voxel_world::run(config_path.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
