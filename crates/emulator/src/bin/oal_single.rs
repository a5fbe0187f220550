use std::process::ExitCode;

use airlink_emulator::app;
use airlink_emulator::cli::SingleCli;
use channel_control::ThreadPacer;
use clap::Parser;
use log::error;

fn run(cli: SingleCli) -> anyhow::Result<()> {
    let options = cli.into_options()?;
    let stop = app::install_stop_handler()?;
    let mut graph = app::open_graph(&options.device_args)?;
    app::run_emulator(graph.as_mut(), &options, &stop, &mut ThreadPacer)
}

fn main() -> ExitCode {
    app::init_logging();
    match run(SingleCli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
