//! The `tripc` CLI (spec §6): compiles `.trip` source to `.tripc` objects,
//! and links `.tripc` objects down to an emitted SKI expression.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::Parser;
use log::debug;

/// `tripc <src.trip> <out.tripc>` compiles; `tripc --link <a.tripc> <b.tripc> ...` links.
#[derive(Parser)]
#[command(name = "tripc", version, about = "The TripLang compiler and linker")]
struct Cli {
    /// Link the given `.tripc` object files instead of compiling.
    #[arg(long = "link")]
    link: bool,

    /// Raise logging to debug level.
    #[arg(short = 'V', long = "verbose")]
    verbose: bool,

    /// Compile mode: `<src.trip> <out.tripc>`. Link mode: one or more `.tripc` files.
    paths: Vec<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = if cli.link {
        commands::link::run(&cli.paths)
    } else {
        commands::compile::run(&cli.paths)
    };

    if let Err(message) = result {
        eprintln!("error: {message}");
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
    debug!("logging initialised at level {default_level}");
}
