// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::process::ExitCode;

use clap::Parser;
use gwctl::Error;
use gwctl::cli::{Cli, USAGE, run, verbosity};
use gwctl::error::{EXIT_FAILURE, EXIT_USAGE};
use log::error;

#[allow(clippy::print_stdout, clippy::print_stderr)]
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are not failures.
            let code = if e.use_stderr() { EXIT_USAGE } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };
    if cli.commands.is_empty() {
        eprintln!("{USAGE}");
        return ExitCode::from(EXIT_USAGE);
    }

    let level = match verbosity(&cli.log) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("{e}\n{USAGE}");
            return ExitCode::from(EXIT_USAGE);
        }
    };
    if let Err(e) = simple_logger::init_with_level(level) {
        eprintln!("failed to initialize logging: {e}");
        return ExitCode::from(EXIT_FAILURE);
    }

    let mut stdout = std::io::stdout();
    match run(&cli, &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(report) = e.report() {
                eprint!("{report}");
            }
            error!("{e}");
            if matches!(e, Error::Usage(_)) {
                eprintln!("{USAGE}");
            }
            ExitCode::from(e.exit_code())
        }
    }
}
