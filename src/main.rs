//! datasheet command-line entry point.

use std::process::ExitCode;

fn main() -> ExitCode {
    datasheet::cli::run()
}
