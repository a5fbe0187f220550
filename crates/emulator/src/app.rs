//! Process plumbing and the emulator main sequence.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use airlink_types::GraphError;
use anyhow::Context;
use channel_control::{ChannelHandles, ManualSource, Pacer, ReloadLoop, ScriptSource};
use log::{info, warn};
use rfnoc_host::{RfnocGraph, SimGraph};

use crate::cli::EmulatorOptions;
use crate::setup::{
    build_links, channel_handles, configure_radios, load_passthrough, start_streaming,
    stop_streaming,
};

/// Time the stop commands get to reach the radios before the process exits.
const STOP_PROPAGATION: Duration = Duration::from_millis(100);

/// Log to stderr at `info` unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

/// Raise the returned flag on Ctrl-C.
pub fn install_stop_handler() -> anyhow::Result<Arc<AtomicBool>> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();
    ctrlc::set_handler(move || {
        info!("Received Ctrl+C, stopping");
        flag.store(true, Ordering::SeqCst);
    })
    .context("Error setting Ctrl-C handler")?;
    Ok(stop)
}

/// Open the RFNoC graph for a device address.
///
/// Only the in-memory host is built in; any other device type is reported
/// as not found.
pub fn open_graph(args: &str) -> Result<Box<dyn RfnocGraph>, GraphError> {
    info!("Creating the RFNoC graph with args: '{}'", args);
    Ok(Box::new(SimGraph::make(args)?))
}

/// Pick the reload mode. A script that cannot be opened falls back to manual polling.
pub fn open_reload_loop(options: &EmulatorOptions, links: Vec<ChannelHandles>) -> ReloadLoop {
    let cadence = options.settings.cadence();
    let manual = ManualSource::new(options.manual_path(), links.len());
    if !options.script {
        info!("Polling {} every {}s", manual.path().display(), cadence.update_t);
        return ReloadLoop::manual(links, manual, cadence);
    }

    let script_path = options.script_path();
    match ScriptSource::open(&script_path, links.len()) {
        Ok(script) => {
            info!("Following script {}", script_path.display());
            ReloadLoop::scripted(links, script, cadence)
        }
        Err(err) => {
            warn!(
                "Cannot use script {}: {}. Falling back to manual mode",
                script_path.display(),
                err
            );
            ReloadLoop::manual(links, manual, cadence)
        }
    }
}

fn wait_for_enter() -> io::Result<()> {
    print!("Press Enter to start the script...");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(())
}

/// Set up the links, run the reload loop until `stop` is raised, then stop streaming.
pub fn run_emulator(
    graph: &mut dyn RfnocGraph,
    options: &EmulatorOptions,
    stop: &AtomicBool,
    pacer: &mut impl Pacer,
) -> anyhow::Result<()> {
    let links = build_links(graph, &options.settings.links).context("Failed to set up the links")?;
    configure_radios(&links, &options.tunings, &options.radio)
        .context("Failed to configure the radios")?;
    load_passthrough(&links).context("Failed to load the initial channel")?;
    let setup_delay = options.settings.stream.setup_delay()?;
    start_streaming(&*graph, &links, setup_delay).context("Failed to start streaming")?;

    let handles = links.iter().map(channel_handles).collect();
    let mut reload = open_reload_loop(options, handles);
    if reload.is_scripted() && !options.no_prompt {
        wait_for_enter().context("Failed to read from stdin")?;
    }
    reload.run(stop, pacer);

    info!("Stopping streams");
    stop_streaming(&links);
    thread::sleep(STOP_PROPAGATION);
    Ok(())
}
