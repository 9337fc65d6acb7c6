//! LSIG CLI - differential fuzzing harness for logic signature evaluators

mod cli;
mod commands;
mod terminal;

use clap::Parser;

use cli::Cli;

fn main() {
    let cli = Cli::parse();

    let metrics_handle = if cli.metrics {
        lsig::metrics::CliRecorder::new().install()
    } else {
        None
    };
    lsig::metrics::init();

    let default_level = if cli.verbose {
        "lsig=debug,lsig_eval=debug"
    } else if cli.silent {
        "lsig=error,lsig_eval=error"
    } else {
        "lsig=info,lsig_eval=info"
    };
    lsig::init_logging(default_level);

    let exit_code = commands::run_command(&cli);

    if let Some(handle) = metrics_handle {
        handle.print_summary();
    }

    std::process::exit(exit_code);
}
