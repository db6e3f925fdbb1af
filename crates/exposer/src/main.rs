//! `exposerd`: serves the built-in operations over HTTP until signalled.

use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    match exposer::run_runtime() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let mut stderr = io::stderr().lock();
            if writeln!(stderr, "exposerd: {error}").is_err() {
                return ExitCode::FAILURE;
            }
            ExitCode::FAILURE
        }
    }
}
