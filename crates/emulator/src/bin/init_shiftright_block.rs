use std::process::ExitCode;

use airlink_emulator::app;
use airlink_emulator::init_block::{probe_shiftright, PROBE_VALUE};
use clap::Parser;
use log::error;

/// Init RFNoC shiftright block: finds a shiftright block in a USRP and peeks/pokes its register.
#[derive(Parser, Debug)]
#[command(name = "init_shiftright_block", version)]
struct Cli {
    /// Device address args
    #[arg(long, default_value = "")]
    args: String,
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let graph = app::open_graph(&cli.args)?;
    probe_shiftright(&*graph, PROBE_VALUE)?;
    Ok(())
}

fn main() -> ExitCode {
    app::init_logging();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
