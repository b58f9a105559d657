// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

//! Molten driver CLI.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod artifacts;
mod pipeline;
mod reconcile;
mod session;
mod toolchain;
mod watch;

#[cfg(test)]
mod testutil;

#[derive(Parser)]
#[command(name = "molten")]
#[command(author, version, about = "Molten: hot-code-reloading for a restricted DSL")]
struct Cli {
    /// Path to the program source file
    #[arg(value_name = "FILE")]
    program: PathBuf,

    /// Execution backend
    #[arg(long, value_enum, default_value = "native")]
    backend: Backend,

    /// Print the generated target source to stderr before execution
    #[arg(long)]
    show_generated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Compile to a native executable with live-reloadable shared objects
    Native,
    /// Serve the program to a browser (not available in this build)
    Browser,
}

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("MOLTEN_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.backend {
        Backend::Browser => Err(miette::miette!(
            "the browser backend is not available in this build; use --backend native"
        )),
        Backend::Native => {
            let code = session::run(&cli.program, cli.show_generated)?;
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
    }
}
