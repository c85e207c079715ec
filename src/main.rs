// SPDX-License-Identifier: MIT
// Copyright 2026 Tyler Zervas

//! Combine `A = B = 0..16` with the kernel in `./hello.cl` and print C as a
//! 4×4 grid. Exits with 1 on any failure.

use std::process::ExitCode;
use vector_combine::backend::OpenClBackend;
use vector_combine::{
    init_logging, write_grid, CombineConfig, ErrorClass, LogConfig, VectorCombine, GRID_COLUMNS,
};

fn main() -> ExitCode {
    init_logging(&LogConfig::default());

    let result = VectorCombine::new(OpenClBackend::new(), CombineConfig::default())
        .and_then(|combiner| combiner.run_indexed());

    let c = match result {
        Ok(c) => c,
        Err(err) => {
            if err.class() == ErrorClass::ResourceIo {
                eprintln!("Failed to load kernel.");
            }
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = write_grid(&mut std::io::stdout().lock(), c.as_slice(), GRID_COLUMNS) {
        eprintln!("error: failed to write result: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
