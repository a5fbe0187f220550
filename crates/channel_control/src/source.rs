//! Channel configuration sources.
//!
//! Both file formats are a stream of comma-separated fields; a line break
//! also ends a field. A link takes two fields, `<fir>,<shift>`, where the FIR
//! field holds whitespace-separated taps:
//!
//! ```text
//! manual: 100 200 300,3,32767,0,
//! script: 0.0,100 200,3,32767,0,1.5,
//!         50,5,32767,0,eos
//! ```

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use airlink_types::{ChannelConfig, ConfigError, Marker, ScriptRecord};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::warn;

/// End-of-script sentinel.
pub const EOS: &str = "eos";

/// Field-level view over a delimited stream.
struct Tokens<R: Read> {
    reader: csv::Reader<R>,
    record: StringRecord,
    pending: VecDeque<String>,
}

impl<R: Read> Tokens<R> {
    fn new(reader: R) -> Self {
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);
        Self {
            reader,
            record: StringRecord::new(),
            pending: VecDeque::new(),
        }
    }

    fn next_token(&mut self) -> Result<Option<String>, ConfigError> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Ok(Some(token));
            }
            if !self.reader.read_record(&mut self.record).map_err(csv_error)? {
                return Ok(None);
            }
            let mut fields: Vec<&str> = self.record.iter().collect();
            // A trailing comma leaves an empty last field.
            if fields.last() == Some(&"") {
                fields.pop();
            }
            self.pending.extend(fields.into_iter().map(str::to_string));
        }
    }

    fn expect_token(&mut self, field: &str) -> Result<String, ConfigError> {
        self.next_token()?.ok_or_else(|| ConfigError::Parse {
            field: field.to_string(),
            value: String::new(),
            reason: "unexpected end of file".to_string(),
        })
    }
}

fn csv_error(err: csv::Error) -> ConfigError {
    ConfigError::Csv(err.to_string())
}

fn open_config(path: &Path) -> Result<File, ConfigError> {
    File::open(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => ConfigError::Missing {
            path: path.display().to_string(),
        },
        _ => ConfigError::from(err),
    })
}

fn parse_error(field: &str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Parse {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse a whitespace-separated list of 16-bit taps.
pub fn parse_fir(token: &str) -> Result<Vec<i16>, ConfigError> {
    let taps = token
        .split_whitespace()
        .map(|tap| tap.parse::<i16>().map_err(|e| parse_error("fir", token, e)))
        .collect::<Result<Vec<_>, _>>()?;
    if taps.is_empty() {
        return Err(parse_error("fir", token, "at least one coefficient is required"));
    }
    Ok(taps)
}

pub fn parse_shift(token: &str) -> Result<u32, ConfigError> {
    token.parse().map_err(|e| parse_error("shift", token, e))
}

/// Parse a script timestamp or the `eos` sentinel.
pub fn parse_marker(token: &str) -> Result<Marker, ConfigError> {
    if token == EOS {
        return Ok(Marker::EndOfScript);
    }
    let t: f64 = token.parse().map_err(|e| parse_error("timestamp", token, e))?;
    if !t.is_finite() || t < 0.0 {
        return Err(parse_error(
            "timestamp",
            token,
            "must be a non-negative number of seconds",
        ));
    }
    Ok(Marker::At(t))
}

/// Read one `<fir>,<shift>` pair per channel. Nothing is returned unless
/// every pair parses.
fn read_channels<R: Read>(
    tokens: &mut Tokens<R>,
    channels: usize,
) -> Result<Vec<ChannelConfig>, ConfigError> {
    let mut configs = Vec::with_capacity(channels);
    for _ in 0..channels {
        let fir = parse_fir(&tokens.expect_token("fir")?)?;
        let shift = parse_shift(&tokens.expect_token("shift")?)?;
        configs.push(ChannelConfig::new(fir, shift)?);
    }
    Ok(configs)
}

/// Manual mode: a small file the operator edits while the emulator runs.
///
/// The file is reopened and fully re-read on every poll.
#[derive(Debug, Clone)]
pub struct ManualSource {
    path: PathBuf,
    channels: usize,
}

impl ManualSource {
    pub fn new(path: impl Into<PathBuf>, channels: usize) -> Self {
        Self {
            path: path.into(),
            channels,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the current configuration of every channel.
    pub fn poll(&self) -> Result<Vec<ChannelConfig>, ConfigError> {
        let file = open_config(&self.path)?;
        read_channels(&mut Tokens::new(file), self.channels)
    }
}

/// Script mode: a timeline of configurations, consumed one record at a time.
pub struct ScriptSource<R: Read> {
    tokens: Tokens<R>,
    channels: usize,
    start: Marker,
    upcoming: Marker,
}

impl ScriptSource<File> {
    /// Open a script file and read its start timestamp.
    pub fn open(path: impl AsRef<Path>, channels: usize) -> Result<Self, ConfigError> {
        let file = open_config(path.as_ref())?;
        Self::from_reader(file, channels)
    }
}

impl<R: Read> ScriptSource<R> {
    pub fn from_reader(reader: R, channels: usize) -> Result<Self, ConfigError> {
        let mut tokens = Tokens::new(reader);
        let start = parse_marker(&tokens.expect_token("timestamp")?)?;
        Ok(Self {
            tokens,
            channels,
            start,
            upcoming: start,
        })
    }

    /// When the first record applies.
    pub fn start(&self) -> Marker {
        self.start
    }

    /// When the next record applies. [`Marker::EndOfScript`] once the
    /// timeline is over.
    pub fn upcoming(&self) -> Marker {
        self.upcoming
    }

    pub fn is_finished(&self) -> bool {
        self.upcoming.is_end()
    }

    /// Consume the next record.
    ///
    /// A malformed record ends the timeline: the tokens after it cannot be
    /// trusted, so every later call returns [`ConfigError::EndOfScript`].
    pub fn next_record(&mut self) -> Result<ScriptRecord, ConfigError> {
        let timestamp = match self.upcoming {
            Marker::At(t) => t,
            Marker::EndOfScript => return Err(ConfigError::EndOfScript),
        };
        match self.read_record(timestamp) {
            Ok(record) => {
                self.upcoming = record.next;
                Ok(record)
            }
            Err(err) => {
                self.upcoming = Marker::EndOfScript;
                Err(err)
            }
        }
    }

    fn read_record(&mut self, timestamp: f64) -> Result<ScriptRecord, ConfigError> {
        let channels = read_channels(&mut self.tokens, self.channels)?;
        let next = match self.tokens.next_token()? {
            Some(token) => parse_marker(&token)?,
            None => {
                warn!("Script ends without '{}', stopping after this record", EOS);
                Marker::EndOfScript
            }
        };
        Ok(ScriptRecord {
            timestamp,
            channels,
            next,
        })
    }
}
