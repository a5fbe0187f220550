//! The reload loop: keeps the links in step with the manual file or script.

use std::fs::File;
use std::io::{self, Stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use airlink_types::{ChannelConfig, ConfigError};
use log::{error, info, warn};

use crate::applier::{apply, read_back, ChannelHandles};
use crate::source::{ManualSource, ScriptSource};

/// Relative tolerance for comparing accumulated elapsed time.
const TIME_TOLERANCE: f64 = 1e-9;

/// Loop periods, in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cadence {
    /// Manual mode: how often the config file is re-read.
    pub update_t: f64,
    /// Manual mode: how often the device state is echoed.
    pub print_t: f64,
    /// Script mode: tick period.
    pub script_t: f64,
}

impl Default for Cadence {
    fn default() -> Self {
        Self {
            update_t: 1.0,
            print_t: 5.0,
            script_t: 0.2,
        }
    }
}

/// Sleeps between ticks.
pub trait Pacer {
    fn pause(&mut self, period: Duration);
}

/// Sleeps the calling thread.
#[derive(Debug, Default)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&mut self, period: Duration) {
        thread::sleep(period);
    }
}

/// What one tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A configuration was read and every link accepted it.
    Applied,
    /// A configuration was read but at least one link rejected it.
    DeviceFault,
    /// The source could not be read; the previous configuration stays.
    Kept,
    /// Waiting for the next script timestamp.
    Waiting,
    /// The script is over and the configuration is frozen.
    Finished,
}

enum Mode {
    Manual(ManualSource),
    Scripted(ScriptSource<File>),
}

/// Drives a config source into the links on a fixed cadence.
pub struct ReloadLoop<W: Write = Stdout> {
    links: Vec<ChannelHandles>,
    mode: Mode,
    cadence: Cadence,
    elapsed: f64,
    steps: usize,
    current: Vec<ChannelConfig>,
    out: W,
}

impl ReloadLoop<Stdout> {
    /// Re-read `source` every `update_t` seconds.
    pub fn manual(links: Vec<ChannelHandles>, source: ManualSource, cadence: Cadence) -> Self {
        Self::with_mode(links, Mode::Manual(source), cadence)
    }

    /// Follow the timeline in `source`, ticking every `script_t` seconds.
    pub fn scripted(
        links: Vec<ChannelHandles>,
        source: ScriptSource<File>,
        cadence: Cadence,
    ) -> Self {
        Self::with_mode(links, Mode::Scripted(source), cadence)
    }

    fn with_mode(links: Vec<ChannelHandles>, mode: Mode, cadence: Cadence) -> Self {
        let current = vec![ChannelConfig::passthrough(); links.len()];
        Self {
            links,
            mode,
            cadence,
            elapsed: 0.0,
            steps: 0,
            current,
            out: io::stdout(),
        }
    }
}

impl<W: Write> ReloadLoop<W> {
    /// Send the console echo to `out` instead of stdout.
    pub fn with_output<V: Write>(self, out: V) -> ReloadLoop<V> {
        ReloadLoop {
            links: self.links,
            mode: self.mode,
            cadence: self.cadence,
            elapsed: self.elapsed,
            steps: self.steps,
            current: self.current,
            out,
        }
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Number of script records applied so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn is_scripted(&self) -> bool {
        matches!(self.mode, Mode::Scripted(_))
    }

    /// Last configuration read for each link.
    pub fn current(&self) -> &[ChannelConfig] {
        &self.current
    }

    /// Seconds between ticks in the selected mode.
    pub fn period(&self) -> f64 {
        match self.mode {
            Mode::Manual(_) => self.cadence.update_t,
            Mode::Scripted(_) => self.cadence.script_t,
        }
    }

    /// Run until `stop` is raised. The flag is checked before every tick.
    pub fn run(&mut self, stop: &AtomicBool, pacer: &mut impl Pacer) {
        let period = Duration::try_from_secs_f64(self.period()).unwrap_or_default();
        while !stop.load(Ordering::SeqCst) {
            self.poll_source();
            pacer.pause(period);
            self.advance();
        }
        self.echo("\n");
        info!("Reload loop stopped after {:.2}s", self.elapsed);
    }

    /// One iteration without sleeping. Elapsed time advances by one period.
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.poll_source();
        self.advance();
        outcome
    }

    fn poll_source(&mut self) -> TickOutcome {
        match self.mode {
            Mode::Manual(_) => self.tick_manual(),
            Mode::Scripted(_) => self.tick_scripted(),
        }
    }

    /// Account for one slept period: a progress dot, plus the device state
    /// whenever manual mode crosses a print interval.
    fn advance(&mut self) {
        self.elapsed += self.period();
        self.echo(".");
        if !self.is_scripted() && is_multiple_of(self.elapsed, self.cadence.print_t) {
            self.echo("\n");
            self.echo_state();
        }
    }

    fn tick_manual(&mut self) -> TickOutcome {
        let Mode::Manual(source) = &self.mode else {
            return TickOutcome::Kept;
        };
        match source.poll() {
            Ok(configs) => {
                self.current = configs;
                self.apply_current()
            }
            Err(err) => {
                warn!("Keeping previous channel config: {}", err);
                TickOutcome::Kept
            }
        }
    }

    fn tick_scripted(&mut self) -> TickOutcome {
        let Mode::Scripted(source) = &mut self.mode else {
            return TickOutcome::Kept;
        };
        if source.is_finished() {
            return TickOutcome::Finished;
        }
        if !has_reached(self.elapsed, source.upcoming().deadline()) {
            return TickOutcome::Waiting;
        }

        match source.next_record() {
            Ok(record) => {
                self.current = record.channels;
                self.steps += 1;
                let outcome = self.apply_current();
                self.echo(&format!(
                    "\nStep {} at {:.2}s (scheduled {:.2}s)\n",
                    self.steps, self.elapsed, record.timestamp
                ));
                self.echo_state();
                if record.next.is_end() {
                    info!("Script finished after {} steps", self.steps);
                }
                outcome
            }
            Err(ConfigError::EndOfScript) => TickOutcome::Finished,
            Err(err) => {
                warn!("Stopping script at step {}: {}", self.steps + 1, err);
                TickOutcome::Finished
            }
        }
    }

    fn apply_current(&mut self) -> TickOutcome {
        let mut outcome = TickOutcome::Applied;
        for (link, config) in self.links.iter().zip(&self.current) {
            if let Err(err) = apply(link, config) {
                error!("{}: failed to apply {}: {}", link.name, config, err);
                outcome = TickOutcome::DeviceFault;
            }
        }
        outcome
    }

    fn echo_state(&mut self) {
        let mut lines = Vec::with_capacity(self.links.len());
        for link in &self.links {
            match read_back(link) {
                Ok(config) => lines.push(format!("  {}: {}", link.name, config)),
                Err(err) => error!("{}: read back failed: {}", link.name, err),
            }
        }
        self.echo(&format!("[{:8.2}s]\n", self.elapsed));
        for line in lines {
            self.echo(&format!("{}\n", line));
        }
    }

    fn echo(&mut self, text: &str) {
        if let Err(err) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            warn!("Console echo failed: {}", err);
        }
    }
}

/// `elapsed >= deadline`, tolerating float drift from summing tick periods.
fn has_reached(elapsed: f64, deadline: f64) -> bool {
    if !deadline.is_finite() {
        return false;
    }
    elapsed >= deadline - TIME_TOLERANCE * deadline.abs().max(1.0)
}

/// Whether `elapsed` is a whole multiple of `interval`.
fn is_multiple_of(elapsed: f64, interval: f64) -> bool {
    if interval.is_nan() || interval <= 0.0 {
        return false;
    }
    let rem = elapsed % interval;
    let tol = TIME_TOLERANCE * interval;
    rem <= tol || interval - rem <= tol
}
