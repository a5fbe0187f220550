//! Bringing the emulated links up and down.

use std::thread;
use std::time::Duration;

use airlink_types::{ChannelConfig, DeviceError, GraphError};
use blocks::StreamCmd;
use channel_control::{apply, ChannelHandles};
use log::{error, info};
use rfnoc_host::{connect_chain, resolve_link, LinkHandles, LinkSpec, RfnocGraph};

/// Centre frequencies for one link, in Hz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkTuning {
    /// Applied to the source radio's receive path.
    pub rx_freq: f64,
    /// Applied to the sink radio's transmit path.
    pub tx_freq: f64,
}

/// Front-end settings shared by every link.
#[derive(Debug, Clone, PartialEq)]
pub struct RadioSettings {
    pub rx_gain: f64,
    pub tx_gain: f64,
    pub rx_bw: f64,
    pub tx_bw: f64,
    pub rx_timestamps: bool,
    pub spp: usize,
}

/// Resolve every link, wire the chain and commit the graph.
pub fn build_links(
    graph: &mut dyn RfnocGraph,
    specs: &[LinkSpec],
) -> Result<Vec<LinkHandles>, GraphError> {
    let links = specs
        .iter()
        .map(|spec| resolve_link(&*graph, spec))
        .collect::<Result<Vec<_>, _>>()?;
    connect_chain(graph, specs)?;
    graph.commit()?;
    Ok(links)
}

pub fn channel_handles(link: &LinkHandles) -> ChannelHandles {
    ChannelHandles::new(link.spec.name.clone(), link.fir.clone(), link.shiftright.clone())
}

/// Load the pass-through FIR with no shift on every link.
pub fn load_passthrough(links: &[LinkHandles]) -> Result<(), DeviceError> {
    for link in links {
        apply(&channel_handles(link), &ChannelConfig::passthrough())?;
        info!(
            "{}: {} supports up to {} taps",
            link.spec.name,
            link.spec.fir,
            link.fir.get_max_num_coefficients()
        );
    }
    Ok(())
}

/// Tune, set gains and bandwidths, and configure streaming on every link.
pub fn configure_radios(
    links: &[LinkHandles],
    tunings: &[LinkTuning],
    settings: &RadioSettings,
) -> Result<(), DeviceError> {
    for (link, tuning) in links.iter().zip(tunings) {
        let (rx, rx_chan) = (&link.source, link.spec.source.chan);
        let (tx, tx_chan) = (&link.sink, link.spec.sink.chan);
        let rx_id = &link.spec.source.radio;
        let tx_id = &link.spec.sink.radio;

        rx.enable_rx_timestamps(settings.rx_timestamps, rx_chan)?;
        rx.set_rx_dc_offset(true, rx_chan)?;
        info!("{}: sample rate {:.3} Msps", rx_id, rx.get_rate() / 1e6);

        rx.set_rx_frequency(tuning.rx_freq, rx_chan)?;
        info!("{}: actual RX freq {:.3} MHz", rx_id, rx.get_rx_frequency(rx_chan)? / 1e6);
        tx.set_tx_frequency(tuning.tx_freq, tx_chan)?;
        info!("{}: actual TX freq {:.3} MHz", tx_id, tx.get_tx_frequency(tx_chan)? / 1e6);

        rx.set_rx_gain(settings.rx_gain, rx_chan)?;
        info!("{}: actual RX gain {:.1} dB", rx_id, rx.get_rx_gain(rx_chan)?);
        tx.set_tx_gain(settings.tx_gain, tx_chan)?;
        info!("{}: actual TX gain {:.1} dB", tx_id, tx.get_tx_gain(tx_chan)?);

        rx.set_rx_bandwidth(settings.rx_bw, rx_chan)?;
        info!("{}: actual RX bandwidth {:.3} MHz", rx_id, rx.get_rx_bandwidth(rx_chan)? / 1e6);
        tx.set_tx_bandwidth(settings.tx_bw, tx_chan)?;
        info!("{}: actual TX bandwidth {:.3} MHz", tx_id, tx.get_tx_bandwidth(tx_chan)? / 1e6);

        rx.set_spp(settings.spp, rx_chan)?;
        info!("{}: samples per packet {}", rx_id, rx.get_spp(rx_chan)?);
    }
    Ok(())
}

/// Wait `setup_delay`, then start every RX radio at the same device time.
pub fn start_streaming(
    graph: &dyn RfnocGraph,
    links: &[LinkHandles],
    setup_delay: Duration,
) -> Result<(), GraphError> {
    let Some(first) = links.first() else {
        return Ok(());
    };
    thread::sleep(setup_delay);
    let start = graph.time_now(first.spec.source.radio.device_no())? + setup_delay.as_secs_f64();
    let cmd = StreamCmd::start_at(start);
    for link in links {
        link.source.issue_stream_cmd(&cmd, link.spec.source.chan)?;
    }
    info!("Streaming starts at device time {:.3}s", start);
    Ok(())
}

/// Stop streaming on every RX radio. Failures are logged and skipped.
pub fn stop_streaming(links: &[LinkHandles]) {
    let cmd = StreamCmd::stop_now();
    for link in links {
        if let Err(err) = link.source.issue_stream_cmd(&cmd, link.spec.source.chan) {
            error!("{}: failed to stop streaming: {}", link.spec.source.radio, err);
        }
    }
}
