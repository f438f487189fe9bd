// src/main.rs

use specrun::cli::{self, ServeArgs};
use specrun::errors::LauncherError;
use specrun::lifecycle::{self, HostProcess};
use specrun::logging;

fn main() {
    let args = cli::process_args();
    let code = HostProcess::global().main(|| run_main(args));
    std::process::exit(code);
}

fn run_main(args: Vec<String>) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;

    if args.first().map(String::as_str) == Some("serve") {
        let serve_args = ServeArgs::parse_args(&args[1..]);
        logging::init_logging(serve_args.log_level)?;
        runtime.block_on(specrun::serve(serve_args))?;
        return Ok(());
    }

    logging::init_logging(None)?;
    let status = match runtime.block_on(specrun::run(args)) {
        Ok(status) => status,
        // Usage errors, `--help` and `--version` print and exit the way clap
        // intends.
        Err(LauncherError::Config(e)) => e.exit(),
        Err(e) => return Err(e.into()),
    };

    if status.is_success() {
        Ok(())
    } else {
        Err(lifecycle::exit(status.code()))
    }
}
