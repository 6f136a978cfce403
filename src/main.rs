//! AppDir bundler entry point.

use appdir_bundler::cli::{self, OutputManager};
use std::process;

fn main() {
    env_logger::init();

    match cli::run() {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            // Never quiet for fatal errors
            let output = OutputManager::new(false, false);
            output.error(&format!("Fatal error: {e}"));
            process::exit(1);
        }
    }
}
