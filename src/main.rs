mod args;
mod rollup;

use clap::Parser;
use log::{error, info};
use snafu::ErrorCompat;

use crate::args::Args;

fn main() {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .init();

    info!("args: {:?}", args);

    match rollup::run_rollup(&args) {
        Ok(_) => {}
        Err(e) => {
            error!("An error occured: {}", e);
            let mut source = std::error::Error::source(&e);
            while let Some(s) = source {
                error!("  caused by: {}", s);
                source = s.source();
            }
            if let Some(bt) = ErrorCompat::backtrace(&e) {
                error!("trace: {}", bt);
            }
            std::process::exit(1);
        }
    }
}
