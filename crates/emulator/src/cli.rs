use std::path::PathBuf;

use airlink_types::BlockId;
use clap::{Args, Parser};

use crate::settings::{load_settings, EmulatorSettings, Topology};
use crate::setup::{LinkTuning, RadioSettings};

const DEFAULT_FREQ: f64 = 3619.2e6;

/// Options shared by both emulator applications.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Device address args, e.g. "type=sim,radios=2"
    #[arg(long, default_value = "")]
    pub args: String,

    /// RX gain in dB
    #[arg(long, default_value_t = 0.0)]
    pub rx_gain: f64,

    /// RX analog front-end filter bandwidth in Hz
    #[arg(long, default_value_t = 80e6)]
    pub rx_bw: f64,

    /// TX analog front-end filter bandwidth in Hz
    #[arg(long, default_value_t = 80e6)]
    pub tx_bw: f64,

    /// Seconds between manual config reloads [default: 1]
    #[arg(long)]
    pub udt: Option<f64>,

    /// Seconds between device state printouts in manual mode [default: 5]
    #[arg(long)]
    pub prt: Option<f64>,

    /// Script tick period in seconds [default: 0.2]
    #[arg(long)]
    pub scr_t: Option<f64>,

    /// Follow the timeline in the script file instead of polling the manual file
    #[arg(long)]
    pub script: bool,

    /// Start the script without waiting for Enter
    #[arg(long)]
    pub no_prompt: bool,

    /// Keep RX timestamps enabled
    #[arg(long)]
    pub rx_timestamps: bool,

    /// Directory holding the channel control files
    #[arg(long, default_value = "channel_control")]
    pub config_dir: PathBuf,

    /// JSON settings file overriding links, file names and cadences
    #[arg(long)]
    pub settings: Option<PathBuf>,
}

/// Two-way channel emulator: RF A -> RF B and RF B -> RF A through FIR and shiftright blocks.
#[derive(Parser, Debug, Clone)]
#[command(name = "airlink_dual", version)]
pub struct DualCli {
    #[command(flatten)]
    pub common: CommonArgs,

    /// RF A centre frequency in Hz
    #[arg(long, default_value_t = DEFAULT_FREQ)]
    pub rfa_freq: f64,

    /// RF B centre frequency in Hz
    #[arg(long, default_value_t = DEFAULT_FREQ)]
    pub rfb_freq: f64,

    /// TX gain in dB
    #[arg(long, default_value_t = 20.0)]
    pub tx_gain: f64,
}

/// One-way channel emulator: RX radio -> FIR -> shiftright -> TX radio.
#[derive(Parser, Debug, Clone)]
#[command(name = "oal_single", version)]
pub struct SingleCli {
    #[command(flatten)]
    pub common: CommonArgs,

    /// RX centre frequency in Hz
    #[arg(long, default_value_t = DEFAULT_FREQ)]
    pub rx_freq: f64,

    /// TX centre frequency in Hz
    #[arg(long, default_value_t = DEFAULT_FREQ)]
    pub tx_freq: f64,

    /// TX gain in dB
    #[arg(long, default_value_t = 0.0)]
    pub tx_gain: f64,
}

/// Fully resolved run options.
#[derive(Debug, Clone)]
pub struct EmulatorOptions {
    pub device_args: String,
    pub settings: EmulatorSettings,
    /// One entry per link in `settings.links`
    pub tunings: Vec<LinkTuning>,
    pub radio: RadioSettings,
    pub script: bool,
    pub no_prompt: bool,
    pub config_dir: PathBuf,
}

impl EmulatorOptions {
    pub fn manual_path(&self) -> PathBuf {
        self.config_dir.join(&self.settings.files.manual)
    }

    pub fn script_path(&self) -> PathBuf {
        self.config_dir.join(&self.settings.files.script)
    }
}

impl CommonArgs {
    fn settings(&self, topology: Topology) -> anyhow::Result<EmulatorSettings> {
        let mut settings = match &self.settings {
            Some(path) => load_settings(path, topology)?,
            None => EmulatorSettings::defaults(topology),
        };
        if let Some(update_t) = self.udt {
            settings.cadence.update_t = update_t;
        }
        if let Some(print_t) = self.prt {
            settings.cadence.print_t = print_t;
        }
        if let Some(script_t) = self.scr_t {
            settings.cadence.script_t = script_t;
        }
        settings.validate()?;
        Ok(settings)
    }

    fn into_options(
        self,
        settings: EmulatorSettings,
        tunings: Vec<LinkTuning>,
        tx_gain: f64,
    ) -> EmulatorOptions {
        let radio = RadioSettings {
            rx_gain: self.rx_gain,
            tx_gain,
            rx_bw: self.rx_bw,
            tx_bw: self.tx_bw,
            rx_timestamps: self.rx_timestamps,
            spp: settings.stream.spp,
        };
        EmulatorOptions {
            device_args: self.args,
            settings,
            tunings,
            radio,
            script: self.script,
            no_prompt: self.no_prompt,
            config_dir: self.config_dir,
        }
    }
}

impl DualCli {
    /// Each radio runs both directions on its own frequency: RF A is the
    /// source radio of the first link, every other radio is RF B.
    pub fn into_options(self) -> anyhow::Result<EmulatorOptions> {
        let settings = self.common.settings(Topology::Dual)?;
        let rfa = settings.links[0].source.radio.clone();
        let freq_of = |radio: &BlockId| if *radio == rfa { self.rfa_freq } else { self.rfb_freq };
        let tunings = settings
            .links
            .iter()
            .map(|link| LinkTuning {
                rx_freq: freq_of(&link.source.radio),
                tx_freq: freq_of(&link.sink.radio),
            })
            .collect();
        Ok(self.common.into_options(settings, tunings, self.tx_gain))
    }
}

impl SingleCli {
    pub fn into_options(self) -> anyhow::Result<EmulatorOptions> {
        let settings = self.common.settings(Topology::Single)?;
        let tuning = LinkTuning {
            rx_freq: self.rx_freq,
            tx_freq: self.tx_freq,
        };
        let tunings = vec![tuning; settings.links.len()];
        Ok(self.common.into_options(settings, tunings, self.tx_gain))
    }
}
