// src/engine.rs
use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use log::{debug, error, info, warn};
use crate::config::DashboardConfig;
use crate::signal::sink::readouts;
use crate::signal::{
    DashboardState, ReadingSimulator, ReadingSource, Readings, Readout, RenderFrame, RenderSink,
    TelemetryError,
};
use crate::types::{DashMessage, EngineCommand};

// Upper bound on one idle wait, so a fully cancelled scheduler still polls commands.
const IDLE_WAIT: Duration = Duration::from_millis(100);

// Mixed into the configured seed so substitute draws do not replay the simulator stream.
const CHART_SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Cancellable fixed-interval timer. The first firing is due at the start instant.
#[derive(Clone, Debug)]
pub struct PeriodicTask {
    name: &'static str,
    interval: Duration,
    next_due: Instant,
    cancelled: bool,
}

impl PeriodicTask {
    pub fn new(name: &'static str, interval: Duration, start: Instant) -> Self {
        Self {
            name,
            interval,
            next_due: start,
            cancelled: false,
        }
    }

    pub fn is_due(&self, now: Instant) -> bool {
        !self.cancelled && now >= self.next_due
    }

    /// Consumes the pending firing if due. Missed periods are skipped, not replayed.
    pub fn fire(&mut self, now: Instant) -> bool {
        if !self.is_due(now) {
            return false;
        }
        self.next_due += self.interval;
        if self.next_due <= now {
            debug!("{} timer fell behind, skipping missed periods", self.name);
            self.next_due = now + self.interval;
        }
        true
    }

    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        if self.cancelled {
            None
        } else {
            Some(self.next_due.saturating_duration_since(now))
        }
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    #[cfg(test)]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// The two dashboard timers: reading simulation and the chart pipeline.
#[derive(Clone, Debug)]
pub struct Scheduler {
    readings: PeriodicTask,
    chart: PeriodicTask,
}

impl Scheduler {
    pub fn new(reading_interval: Duration, tick_interval: Duration, start: Instant) -> Self {
        Self {
            readings: PeriodicTask::new("readings", reading_interval, start),
            chart: PeriodicTask::new("chart", tick_interval, start),
        }
    }

    pub fn next_wait(&self, now: Instant) -> Option<Duration> {
        match (
            self.readings.time_until_due(now),
            self.chart.time_until_due(now),
        ) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn cancel_all(&mut self) {
        self.readings.cancel();
        self.chart.cancel();
    }

    #[cfg(test)]
    pub fn is_cancelled(&self) -> bool {
        self.readings.is_cancelled() && self.chart.is_cancelled()
    }
}

/// Sole owner of the chart session. Runs on one thread; ticks and selections never overlap.
pub struct Engine<S: ReadingSource, K: RenderSink> {
    state: DashboardState,
    source: S,
    sink: K,
    scheduler: Scheduler,
    latest: Readings,
}

impl<K: RenderSink> Engine<ReadingSimulator, K> {
    /// Builds the simulator-backed engine described by `config`.
    pub fn from_config(config: &DashboardConfig, sink: K) -> Result<Self, TelemetryError> {
        let registry = config.validate()?;
        let source =
            ReadingSimulator::new(registry.clone(), config.drift_magnitude, config.seed);
        let state = DashboardState::new(
            registry,
            &config.default_channel,
            config.spectral_method,
            config.seed.map(|seed| seed ^ CHART_SEED_MIX),
        )?;
        let scheduler = Scheduler::new(
            config.reading_interval(),
            config.tick_interval(),
            Instant::now(),
        );
        Ok(Self::new(state, source, sink, scheduler))
    }
}

impl<S: ReadingSource, K: RenderSink> Engine<S, K> {
    pub fn new(state: DashboardState, source: S, sink: K, scheduler: Scheduler) -> Self {
        Self {
            state,
            source,
            sink,
            scheduler,
            latest: Readings::new(),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    #[cfg(test)]
    pub fn sink(&self) -> &K {
        &self.sink
    }

    #[cfg(test)]
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Runs whatever is due at `now`. Readings are refreshed before the chart reads them.
    pub fn step(&mut self, now: Instant) {
        if self.scheduler.readings.fire(now) {
            match self.source.next_readings() {
                Ok(Some(readings)) => {
                    self.latest = readings;
                    let lines = readouts(self.state.registry(), &self.latest);
                    if let Err(err) = self.sink.readouts(&lines) {
                        warn!("readout update failed: {err}");
                    }
                }
                Ok(None) => debug!("reading source drained, keeping last snapshot"),
                Err(err) => warn!("reading source failed: {err}"),
            }
        }
        if self.scheduler.chart.fire(now) {
            let frame = self.state.on_tick(&self.latest);
            self.present(&frame);
        }
    }

    /// Applies one command. Returns `false` once the engine has shut down.
    pub fn handle(&mut self, command: EngineCommand) -> bool {
        match command {
            EngineCommand::SelectChannel(id) => {
                match self.state.on_select_channel(&id, &self.latest) {
                    Ok(frame) => self.present(&frame),
                    Err(err) => warn!("ignoring channel selection: {err}"),
                }
                true
            }
            EngineCommand::Shutdown => {
                self.scheduler.cancel_all();
                info!("engine timers cancelled");
                false
            }
        }
    }

    fn present(&mut self, frame: &RenderFrame) {
        if let Err(err) = self.sink.present(frame) {
            warn!("render failed at tick {}: {err}", frame.phase_tick);
        }
    }

    /// Event loop: waits for the next deadline or a command, whichever comes first.
    pub fn run(mut self, commands: Receiver<EngineCommand>) -> K {
        info!("engine running on `{}`", self.state.frame().channel);
        loop {
            let wait = self
                .scheduler
                .next_wait(Instant::now())
                .unwrap_or(IDLE_WAIT);
            match commands.recv_timeout(wait) {
                Ok(command) => {
                    if !self.handle(command) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    self.scheduler.cancel_all();
                    break;
                }
            }
            self.step(Instant::now());
        }
        info!("engine stopped after {} ticks", self.state.phase_tick());
        self.sink
    }
}

/// Forwards frames and readouts to the GUI thread.
pub struct ChannelSink {
    tx: Sender<DashMessage>,
}

impl ChannelSink {
    pub fn new(tx: Sender<DashMessage>) -> Self {
        Self { tx }
    }

    fn send(&self, message: DashMessage) {
        // A closed receiver means the GUI is tearing down; drop silently.
        self.tx.send(message).ok();
    }
}

impl RenderSink for ChannelSink {
    fn present(&mut self, frame: &RenderFrame) -> Result<(), TelemetryError> {
        self.send(DashMessage::Frame(frame.clone()));
        Ok(())
    }

    fn readouts(&mut self, readouts: &[Readout]) -> Result<(), TelemetryError> {
        self.send(DashMessage::Readouts(readouts.to_vec()));
        Ok(())
    }
}

/// Owner-side handle of a running engine thread.
///
/// Dropping the handle shuts the engine down and joins it.
pub struct EngineHandle {
    tx: Sender<EngineCommand>,
    thread: Option<JoinHandle<()>>,
}

impl EngineHandle {
    pub fn select_channel(&self, id: &str) {
        self.tx
            .send(EngineCommand::SelectChannel(id.to_owned()))
            .ok();
    }

    #[cfg(test)]
    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Cancels both timers and waits for the engine thread to exit. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(thread) = self.thread.take() {
            self.tx.send(EngineCommand::Shutdown).ok();
            if thread.join().is_err() {
                error!("engine thread panicked");
            }
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub fn spawn<S, K>(engine: Engine<S, K>) -> io::Result<EngineHandle>
where
    S: ReadingSource + Send + 'static,
    K: RenderSink + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let thread = thread::Builder::new()
        .name("telemetry-engine".into())
        .spawn(move || {
            engine.run(rx);
        })?;
    Ok(EngineHandle {
        tx,
        thread: Some(thread),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{ChannelRegistry, ManualSource, SpectralMethod};

    #[derive(Default)]
    struct CollectSink {
        frames: Vec<RenderFrame>,
        readouts: Vec<Vec<Readout>>,
    }

    impl RenderSink for CollectSink {
        fn present(&mut self, frame: &RenderFrame) -> Result<(), TelemetryError> {
            self.frames.push(frame.clone());
            Ok(())
        }

        fn readouts(&mut self, readouts: &[Readout]) -> Result<(), TelemetryError> {
            self.readouts.push(readouts.to_vec());
            Ok(())
        }
    }

    const SECOND: Duration = Duration::from_secs(1);

    fn manual_engine(values: &[f32], start: Instant) -> Engine<ManualSource, CollectSink> {
        let registry = ChannelRegistry::with_defaults().unwrap();
        let p1 = registry.lookup("sensor-p1").unwrap();
        let snapshots = values.iter().map(|v| Readings::from([(p1, *v)]));
        let source = ManualSource::new(snapshots.collect::<Vec<_>>());
        let state =
            DashboardState::new(registry, "sensor-p1", SpectralMethod::Direct, Some(2)).unwrap();
        Engine::new(
            state,
            source,
            CollectSink::default(),
            Scheduler::new(SECOND, SECOND, start),
        )
    }

    #[test]
    fn seeded_engine_keeps_substitutes_apart_from_simulation() {
        let config = DashboardConfig {
            seed: Some(42),
            ..DashboardConfig::default()
        };
        let mut engine = Engine::from_config(&config, CollectSink::default()).unwrap();
        let p1 = engine.state.registry().lookup("sensor-p1").unwrap();
        let simulated = engine.source.snapshot()[&p1];
        let substitute = engine.state.on_tick(&Readings::new()).latest_raw;
        assert_ne!(simulated, substitute);
    }

    #[test]
    fn periodic_task_fires_once_per_interval() {
        let start = Instant::now();
        let mut task = PeriodicTask::new("t", SECOND, start);
        assert!(task.fire(start));
        assert!(!task.fire(start));
        assert_eq!(task.time_until_due(start), Some(SECOND));
        assert!(!task.fire(start + SECOND / 2));
        assert!(task.fire(start + SECOND));
    }

    #[test]
    fn periodic_task_skips_missed_periods() {
        let start = Instant::now();
        let mut task = PeriodicTask::new("t", SECOND, start);
        let late = start + SECOND * 5 + SECOND / 2;
        assert!(task.fire(late));
        assert!(!task.fire(late));
        assert_eq!(task.time_until_due(late), Some(SECOND));
    }

    #[test]
    fn cancelled_task_never_fires() {
        let start = Instant::now();
        let mut task = PeriodicTask::new("t", SECOND, start);
        task.cancel();
        assert!(!task.fire(start + SECOND * 3));
        assert_eq!(task.time_until_due(start), None);
    }

    #[test]
    fn step_reads_before_charting() {
        let start = Instant::now();
        let mut engine = manual_engine(&[0.75, 0.3], start);
        engine.step(start);
        let sink = engine.sink();
        assert_eq!(sink.readouts.len(), 1);
        assert_eq!(sink.readouts[0][0].text, "P1 0.75 bar");
        assert_eq!(sink.frames.len(), 1);
        assert_eq!(sink.frames[0].latest_raw, 0.75);
        engine.step(start + SECOND / 2);
        assert_eq!(engine.sink().frames.len(), 1);
        engine.step(start + SECOND);
        assert_eq!(engine.sink().frames[1].latest_raw, 0.3);
    }

    #[test]
    fn drained_source_keeps_last_snapshot() {
        let start = Instant::now();
        let mut engine = manual_engine(&[0.6], start);
        engine.step(start);
        engine.step(start + SECOND);
        let frames = &engine.sink().frames;
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].latest_raw, 0.6);
        assert_eq!(engine.sink().readouts.len(), 1);
    }

    #[test]
    fn selection_renders_immediately() {
        let start = Instant::now();
        let mut engine = manual_engine(&[0.75], start);
        engine.step(start);
        assert!(engine.handle(EngineCommand::SelectChannel("sensor-t1".into())));
        let frame = engine.sink().frames.last().unwrap();
        assert_eq!(frame.channel, "sensor-t1");
        assert_eq!(frame.phase_tick, 2);
        // T1 has no reading in the manual snapshot, so a substitute is used.
        assert!((-10.0..=30.0).contains(&frame.latest_raw));
    }

    #[test]
    fn unknown_selection_is_ignored() {
        let start = Instant::now();
        let mut engine = manual_engine(&[0.75], start);
        engine.step(start);
        assert!(engine.handle(EngineCommand::SelectChannel("sensor-zz".into())));
        assert_eq!(engine.sink().frames.len(), 1);
        assert_eq!(engine.state().frame().channel, "sensor-p1");
    }

    #[test]
    fn shutdown_cancels_both_timers() {
        let start = Instant::now();
        let mut engine = manual_engine(&[0.75], start);
        assert!(!engine.handle(EngineCommand::Shutdown));
        assert!(engine.scheduler().is_cancelled());
        engine.step(start + SECOND * 10);
        assert!(engine.sink().frames.is_empty());
    }

    #[test]
    fn spawned_engine_streams_and_joins_on_shutdown() {
        let config = DashboardConfig {
            tick_interval_ms: 5,
            reading_interval_ms: 5,
            seed: Some(4),
            ..DashboardConfig::default()
        };
        let (tx, rx) = mpsc::channel();
        let engine = Engine::from_config(&config, ChannelSink::new(tx)).unwrap();
        let mut handle = spawn(engine).unwrap();
        handle.select_channel("sensor-dp2");
        let mut saw_selection = false;
        let deadline = Instant::now() + Duration::from_secs(5);
        while !saw_selection && Instant::now() < deadline {
            if let Ok(DashMessage::Frame(frame)) = rx.recv_timeout(Duration::from_millis(200)) {
                saw_selection = frame.channel == "sensor-dp2";
            }
        }
        assert!(saw_selection);
        handle.shutdown();
        assert!(!handle.is_running());
        // Engine (and its sender) is gone once joined; the queue drains then disconnects.
        while rx.recv_timeout(Duration::from_secs(1)).is_ok() {}
        assert!(matches!(
            rx.try_recv(),
            Err(mpsc::TryRecvError::Disconnected)
        ));
    }
}
