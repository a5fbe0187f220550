use std::process::ExitCode;

use airlink_emulator::app;
use airlink_emulator::cli::DualCli;
use channel_control::ThreadPacer;
use clap::Parser;
use log::error;

fn run(cli: DualCli) -> anyhow::Result<()> {
    let options = cli.into_options()?;
    let stop = app::install_stop_handler()?;
    let mut graph = app::open_graph(&options.device_args)?;
    app::run_emulator(graph.as_mut(), &options, &stop, &mut ThreadPacer)
}

fn main() -> ExitCode {
    app::init_logging();
    match run(DualCli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
