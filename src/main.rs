//! Client entrypoint for the CSR build.

// Bin target reuses lib deps, silence noisy lint.
#![allow(unused_crate_dependencies)]

use incident_viz::{init_logging, start};
use log::error;

fn main() {
	init_logging();

	if let Err(e) = start() {
		error!("incident-viz: failed to start: {e}");
	}
}
