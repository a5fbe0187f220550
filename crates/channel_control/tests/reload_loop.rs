use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use airlink_types::{BlockId, ChannelConfig};
use blocks::sim::{SimFirFilter, SimRegisterBank};
use blocks::ShiftrightBlockControl;
use channel_control::{
    read_back, Cadence, ChannelHandles, ManualSource, Pacer, ReloadLoop, ScriptSource,
    TickOutcome,
};
use tempfile::TempDir;

struct SimLink {
    handles: ChannelHandles,
    fir: Arc<SimFirFilter>,
    regs: Arc<SimRegisterBank>,
}

fn sim_link(instance: usize) -> SimLink {
    let fir = Arc::new(SimFirFilter::new(BlockId::new(0, "FIR", instance), 41));
    let sr_id = BlockId::new(0, "Shiftright", instance);
    let regs = Arc::new(SimRegisterBank::new(sr_id.clone()));
    let shiftright = Arc::new(ShiftrightBlockControl::new(sr_id, regs.clone()));
    SimLink {
        handles: ChannelHandles::new(format!("link {}", instance), fir.clone(), shiftright),
        fir,
        regs,
    }
}

fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn cadence() -> Cadence {
    Cadence {
        update_t: 1.0,
        print_t: 2.0,
        script_t: 0.25,
    }
}

fn manual_loop(links: &[&SimLink], path: &Path) -> ReloadLoop<Vec<u8>> {
    let handles = links.iter().map(|l| l.handles.clone()).collect::<Vec<_>>();
    let source = ManualSource::new(path, handles.len());
    ReloadLoop::manual(handles, source, cadence()).with_output(Vec::new())
}

fn script_loop(links: &[&SimLink], path: &Path) -> ReloadLoop<Vec<u8>> {
    let handles = links.iter().map(|l| l.handles.clone()).collect::<Vec<_>>();
    let source = ScriptSource::open(path, handles.len()).unwrap();
    ReloadLoop::scripted(handles, source, cadence()).with_output(Vec::new())
}

fn device_state(link: &SimLink) -> ChannelConfig {
    read_back(&link.handles).unwrap()
}

#[test]
fn manual_reload_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "manual.csv", "100 200 300,4,\n");
    let link = sim_link(0);
    let mut reload = manual_loop(&[&link], &path);

    assert_eq!(reload.tick(), TickOutcome::Applied);
    let first = device_state(&link);
    assert_eq!(first, ChannelConfig::new(vec![100, 200, 300], 4).unwrap());

    assert_eq!(reload.tick(), TickOutcome::Applied);
    assert_eq!(device_state(&link), first);
}

#[test]
fn deleted_file_keeps_previous_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "manual.csv", "5 6,2");
    let link = sim_link(0);
    let mut reload = manual_loop(&[&link], &path);

    assert_eq!(reload.tick(), TickOutcome::Applied);
    fs::remove_file(&path).unwrap();

    assert_eq!(reload.tick(), TickOutcome::Kept);
    assert_eq!(reload.tick(), TickOutcome::Kept);
    assert_eq!(device_state(&link), ChannelConfig::new(vec![5, 6], 2).unwrap());
    assert_eq!(reload.current()[0].coefficients(), &[5, 6]);
    assert_eq!(reload.elapsed(), 3.0);
}

#[test]
fn malformed_shift_leaves_device_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "manual.csv", "10 20,1,");
    let link = sim_link(0);
    let mut reload = manual_loop(&[&link], &path);
    assert_eq!(reload.tick(), TickOutcome::Applied);

    fs::write(&path, "7 8,abc,").unwrap();
    assert_eq!(reload.tick(), TickOutcome::Kept);
    assert_eq!(device_state(&link), ChannelConfig::new(vec![10, 20], 1).unwrap());
}

#[test]
fn manual_echo_follows_print_interval() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "manual.csv", "1,0");
    let link = sim_link(0);
    let mut reload = manual_loop(&[&link], &path);

    reload.tick();
    assert_eq!(reload.output().as_slice(), b".");
    reload.tick();
    let echo = String::from_utf8(reload.output().clone()).unwrap();
    assert!(echo.starts_with("..\n[    2.00s]\n"), "{}", echo);
    assert!(echo.contains("link 0: shift=0 coeffs=[1]"), "{}", echo);
}

#[test]
fn device_fault_does_not_stop_the_loop() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "dual.csv", "1 2,1,3 4,2,");
    let a = sim_link(0);
    let b = sim_link(1);
    let mut reload = manual_loop(&[&a, &b], &path);

    a.fir.fault.set(true);
    assert_eq!(reload.tick(), TickOutcome::DeviceFault);
    // The healthy link still got its config.
    assert_eq!(device_state(&b), ChannelConfig::new(vec![3, 4], 2).unwrap());

    a.fir.fault.set(false);
    assert_eq!(reload.tick(), TickOutcome::Applied);
    assert_eq!(device_state(&a), ChannelConfig::new(vec![1, 2], 1).unwrap());
}

#[test]
fn single_record_script_applies_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "script.csv", "0.0,32767,0,eos");
    let link = sim_link(0);
    let mut reload = script_loop(&[&link], &path);

    assert_eq!(reload.tick(), TickOutcome::Applied);
    assert_eq!(device_state(&link), ChannelConfig::passthrough());
    for _ in 0..5 {
        assert_eq!(reload.tick(), TickOutcome::Finished);
    }
    assert_eq!(reload.steps(), 1);
}

#[test]
fn two_step_script_follows_timeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "script.csv", "0.0,100 200,3,1.0,50,5,eos");
    let link = sim_link(0);
    let mut reload = script_loop(&[&link], &path);

    assert_eq!(reload.tick(), TickOutcome::Applied);
    assert_eq!(device_state(&link), ChannelConfig::new(vec![100, 200], 3).unwrap());

    for _ in 0..3 {
        assert_eq!(reload.tick(), TickOutcome::Waiting);
    }
    assert_eq!(reload.steps(), 1);

    // elapsed is now 1.0
    assert_eq!(reload.tick(), TickOutcome::Applied);
    assert_eq!(reload.steps(), 2);
    assert_eq!(device_state(&link), ChannelConfig::new(vec![50], 5).unwrap());

    assert_eq!(reload.tick(), TickOutcome::Finished);
    assert_eq!(device_state(&link), ChannelConfig::new(vec![50], 5).unwrap());
}

#[test]
fn late_start_waits_for_first_timestamp() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "script.csv", "0.5,9,9,eos");
    let link = sim_link(0);
    let mut reload = script_loop(&[&link], &path);

    assert_eq!(reload.tick(), TickOutcome::Waiting);
    assert_eq!(reload.tick(), TickOutcome::Waiting);
    assert_eq!(reload.tick(), TickOutcome::Applied);
    assert_eq!(device_state(&link).shift(), 9);
}

#[test]
fn dual_channel_script_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(
        &dir,
        "emu_dual_script.csv",
        "0.0,\n1 2,1,3 4,2,\n0.25,\n5,5,6,6,\neos\n",
    );
    let a = sim_link(0);
    let b = sim_link(1);
    let mut reload = script_loop(&[&a, &b], &path);

    assert_eq!(reload.tick(), TickOutcome::Applied);
    assert_eq!(device_state(&a), ChannelConfig::new(vec![1, 2], 1).unwrap());
    assert_eq!(device_state(&b), ChannelConfig::new(vec![3, 4], 2).unwrap());

    assert_eq!(reload.tick(), TickOutcome::Applied);
    assert_eq!(a.regs.snapshot(0x00), 5);
    assert_eq!(b.regs.snapshot(0x00), 6);
    assert_eq!(reload.tick(), TickOutcome::Finished);
}

#[test]
fn malformed_script_record_freezes_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "script.csv", "0.0,1,1,0.25,x y,2,0.5,3,3,eos");
    let link = sim_link(0);
    let mut reload = script_loop(&[&link], &path);

    assert_eq!(reload.tick(), TickOutcome::Applied);
    assert_eq!(reload.tick(), TickOutcome::Finished);
    assert_eq!(reload.tick(), TickOutcome::Finished);
    assert_eq!(device_state(&link), ChannelConfig::new(vec![1], 1).unwrap());
}

struct CountingPacer {
    pauses: usize,
    limit: usize,
    stop: Arc<AtomicBool>,
}

impl Pacer for CountingPacer {
    fn pause(&mut self, period: Duration) {
        assert_eq!(period, Duration::from_millis(250));
        self.pauses += 1;
        if self.pauses == self.limit {
            self.stop.store(true, Ordering::SeqCst);
        }
    }
}

#[test]
fn run_stops_when_flag_is_raised() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "script.csv", "0.0,32767,0,eos");
    let link = sim_link(0);
    let mut reload = script_loop(&[&link], &path);

    let stop = Arc::new(AtomicBool::new(false));
    let mut pacer = CountingPacer {
        pauses: 0,
        limit: 4,
        stop: stop.clone(),
    };
    reload.run(&stop, &mut pacer);

    assert_eq!(pacer.pauses, 4);
    assert_eq!(reload.elapsed(), 1.0);
    let echo = String::from_utf8(reload.output().clone()).unwrap();
    assert!(echo.contains("Step 1 at 0.00s"), "{}", echo);
    assert!(echo.ends_with("....\n"), "{}", echo);
}

#[test]
fn run_does_nothing_when_already_stopped() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "manual.csv", "3,3");
    let link = sim_link(0);
    let mut reload = manual_loop(&[&link], &path);

    let stop = Arc::new(AtomicBool::new(true));
    let mut pacer = CountingPacer {
        pauses: 0,
        limit: 1,
        stop: stop.clone(),
    };
    reload.run(&stop, &mut pacer);
    assert_eq!(pacer.pauses, 0);
    assert_eq!(link.regs.snapshot(0x00), 0);
}

/// Raises the stop flag on the second pause.
struct EchoWatcher {
    pauses: usize,
    stop: Arc<AtomicBool>,
}

impl Pacer for EchoWatcher {
    fn pause(&mut self, _period: Duration) {
        self.pauses += 1;
        if self.pauses == 2 {
            self.stop.store(true, Ordering::SeqCst);
        }
    }
}

#[test]
fn manual_run_prints_a_dot_after_every_pause() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "manual.csv", "3,3");
    let link = sim_link(0);
    let mut reload = manual_loop(&[&link], &path);

    let stop = Arc::new(AtomicBool::new(false));
    let mut pacer = EchoWatcher {
        pauses: 0,
        stop: stop.clone(),
    };
    reload.run(&stop, &mut pacer);

    assert_eq!(pacer.pauses, 2);
    assert_eq!(reload.elapsed(), 2.0);
    let echo = String::from_utf8(reload.output().clone()).unwrap();
    assert!(echo.starts_with("..\n[    2.00s]\n  link 0: shift=3 coeffs=[3]\n"), "{}", echo);
    assert!(echo.ends_with("\n\n"), "{}", echo);
}
