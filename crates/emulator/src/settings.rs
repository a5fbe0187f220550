//! Emulator settings: built-in link layouts and cadences, optionally
//! overridden from a JSON file.

use std::path::Path;
use std::time::Duration;

use airlink_types::BlockId;
use anyhow::{bail, Context};
use channel_control::Cadence;
use log::info;
use rfnoc_host::{Endpoint, LinkSpec};
use serde::{Deserialize, Serialize};

/// Samples per packet requested from the RX radios (kept low for latency).
pub const DEFAULT_SPP: usize = 32;
/// Seconds between setup and the timed stream start.
pub const DEFAULT_SETUP_TIME: f64 = 0.1;

/// Which emulator application the settings are for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Topology {
    /// Two links: RF A -> RF B and RF B -> RF A.
    Dual,
    /// One link from the RX radio to the TX radio.
    Single,
}

/// Channel control file names, relative to the config directory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConfigFiles {
    /// Re-read on every manual update tick
    pub manual: String,
    /// Timeline followed with `--script`
    pub script: String,
}

/// Loop periods in seconds
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CadenceConfig {
    pub update_t: f64,
    pub print_t: f64,
    pub script_t: f64,
}

impl Default for CadenceConfig {
    fn default() -> Self {
        let cadence = Cadence::default();
        Self {
            update_t: cadence.update_t,
            print_t: cadence.print_t,
            script_t: cadence.script_t,
        }
    }
}

impl From<&CadenceConfig> for Cadence {
    fn from(config: &CadenceConfig) -> Self {
        Cadence {
            update_t: config.update_t,
            print_t: config.print_t,
            script_t: config.script_t,
        }
    }
}

/// Streaming parameters
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub spp: usize,
    pub setup_time: f64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            spp: DEFAULT_SPP,
            setup_time: DEFAULT_SETUP_TIME,
        }
    }
}

impl StreamConfig {
    /// `setup_time` as a sleep duration.
    pub fn setup_delay(&self) -> anyhow::Result<Duration> {
        Duration::try_from_secs_f64(self.setup_time).with_context(|| {
            format!("setup_time must be a non-negative number of seconds, got {}", self.setup_time)
        })
    }
}

/// Everything about an emulator run that is not a radio setting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmulatorSettings {
    /// Emulated links, in the order their configs appear in the CSV files
    pub links: Vec<LinkSpec>,
    pub files: ConfigFiles,
    pub cadence: CadenceConfig,
    pub stream: StreamConfig,
}

fn link(name: &str, source: usize, instance: usize, sink: usize) -> LinkSpec {
    LinkSpec {
        name: name.to_string(),
        source: Endpoint {
            radio: BlockId::new(0, "Radio", source),
            chan: 0,
        },
        fir: BlockId::new(0, "FIR", instance),
        shiftright: BlockId::new(0, "Shiftright", instance),
        sink: Endpoint {
            radio: BlockId::new(0, "Radio", sink),
            chan: 0,
        },
    }
}

impl EmulatorSettings {
    pub fn defaults(topology: Topology) -> Self {
        match topology {
            Topology::Dual => Self {
                links: vec![link("RF A to RF B", 0, 0, 1), link("RF B to RF A", 1, 1, 0)],
                files: ConfigFiles {
                    manual: "emu_dual.csv".to_string(),
                    script: "emu_dual_script.csv".to_string(),
                },
                cadence: CadenceConfig::default(),
                stream: StreamConfig::default(),
            },
            Topology::Single => Self {
                links: vec![link("RX to TX", 1, 1, 0)],
                files: ConfigFiles {
                    manual: "chan_singel_manually.csv".to_string(),
                    script: "chan_singel_script.csv".to_string(),
                },
                cadence: CadenceConfig::default(),
                stream: StreamConfig::default(),
            },
        }
    }

    pub fn cadence(&self) -> Cadence {
        Cadence::from(&self.cadence)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.links.is_empty() {
            bail!("at least one link is required");
        }
        let periods = [
            ("update_t", self.cadence.update_t),
            ("print_t", self.cadence.print_t),
            ("script_t", self.cadence.script_t),
        ];
        for (name, value) in periods {
            if !value.is_finite() || value <= 0.0 {
                bail!("{} must be a positive number of seconds, got {}", name, value);
            }
        }
        if self.stream.spp == 0 {
            bail!("spp must be at least 1");
        }
        self.stream.setup_delay()?;
        Ok(())
    }
}

/// Settings file contents. Missing sections keep the built-in defaults.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    links: Option<Vec<LinkSpec>>,
    files: Option<ConfigFiles>,
    cadence: Option<CadenceConfig>,
    stream: Option<StreamConfig>,
}

pub fn parse_settings(json: &str, topology: Topology) -> anyhow::Result<EmulatorSettings> {
    let file: SettingsFile = serde_json::from_str(json)?;
    let mut settings = EmulatorSettings::defaults(topology);
    if let Some(links) = file.links {
        settings.links = links;
    }
    if let Some(files) = file.files {
        settings.files = files;
    }
    if let Some(cadence) = file.cadence {
        settings.cadence = cadence;
    }
    if let Some(stream) = file.stream {
        settings.stream = stream;
    }
    settings.validate()?;
    Ok(settings)
}

/// Load settings from a JSON file on top of the defaults for `topology`.
pub fn load_settings(path: &Path, topology: Topology) -> anyhow::Result<EmulatorSettings> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("could not read settings file '{}'", path.display()))?;
    let settings = parse_settings(&contents, topology)
        .with_context(|| format!("invalid settings file '{}'", path.display()))?;
    info!("Loaded settings from {}", path.display());
    Ok(settings)
}
