//! Event loop: feeds messages to the model and executes its commands.
//!
//! The model is only touched from the loop thread. Commands run on worker
//! threads and report back through one channel, so every mutation happens
//! in arrival order.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;
use crossterm::event::{self, Event as TermEvent, KeyEventKind};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::cmd::Cmd;
use super::model::Model;
use super::msg::{DataUpdate, Msg};
use super::terminal::Screen;
use crate::error::{Error, Result};
use crate::payload::SourceKind;
use crate::source::{CancelToken, DataSource, FetchError};

/// How often blocked threads look at the cancel token.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What arrives on the loop's queue.
#[derive(Debug)]
pub enum Event {
    Msg(Msg),
    /// The input layer failed; the loop must stop.
    Fatal(String),
}

/// Sleeps for `total`, returning `false` early if cancelled.
fn sleep_unless_cancelled(total: Duration, cancel: &CancelToken) -> bool {
    let end = Instant::now() + total;
    loop {
        if cancel.is_cancelled() {
            return false;
        }
        let now = Instant::now();
        if now >= end {
            return true;
        }
        thread::sleep((end - now).min(POLL_INTERVAL));
    }
}

/// Sources with a worker still inside `DataSource::fetch`.
type InFlight = Arc<Mutex<BTreeSet<SourceKind>>>;

/// Removes its source from the in-flight set when the worker finishes,
/// including by panic.
struct FetchSlot {
    in_flight: InFlight,
    kind: SourceKind,
}

impl Drop for FetchSlot {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.kind);
    }
}

pub struct Runtime {
    sources: BTreeMap<SourceKind, Arc<dyn DataSource>>,
    in_flight: InFlight,
    cancel: CancelToken,
    tx: Sender<Event>,
    rx: Receiver<Event>,
}

impl Runtime {
    pub fn new(sources: Vec<Arc<dyn DataSource>>, cancel: CancelToken) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            sources: sources.into_iter().map(|s| (s.kind(), s)).collect(),
            in_flight: InFlight::default(),
            cancel,
            tx,
            rx,
        }
    }

    /// A handle for pushing events from other threads.
    pub fn sender(&self) -> Sender<Event> {
        self.tx.clone()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Spawns the thread translating terminal input into messages.
    pub fn spawn_input(&self) -> thread::JoinHandle<()> {
        let tx = self.sender();
        let cancel = self.cancel.clone();
        thread::spawn(move || {
            while !cancel.is_cancelled() {
                let ready = match event::poll(POLL_INTERVAL) {
                    Ok(ready) => ready,
                    Err(e) => {
                        let _ = tx.send(Event::Fatal(format!("input poll: {e}")));
                        break;
                    }
                };
                if !ready {
                    continue;
                }
                let msg = match event::read() {
                    Ok(TermEvent::Key(key)) if key.kind != KeyEventKind::Release => Msg::Key(key),
                    Ok(TermEvent::Resize(w, h)) => Msg::Resize {
                        width: usize::from(w),
                        height: usize::from(h),
                    },
                    Ok(_) => continue,
                    Err(e) => {
                        let _ = tx.send(Event::Fatal(format!("input read: {e}")));
                        break;
                    }
                };
                if tx.send(Event::Msg(msg)).is_err() {
                    break;
                }
            }
            debug!("input thread stopped");
        })
    }

    /// Runs until the model quits, the token is cancelled, or the screen fails.
    pub fn run(&self, model: &mut Model, screen: &mut dyn Screen) -> Result<()> {
        info!(sources = self.sources.len(), "dashboard started");
        let (width, height) = screen.size()?;
        let cmd = model.update(Msg::Resize { width, height });
        self.execute(cmd);
        self.execute(model.init());

        let mut dirty = true;
        let result = loop {
            if model.is_quitting() || self.cancel.is_cancelled() {
                break Ok(());
            }
            if dirty {
                if let Err(e) = screen.draw(&model.view()) {
                    break Err(e);
                }
                dirty = false;
            }
            match self.rx.recv_timeout(POLL_INTERVAL) {
                Ok(Event::Msg(msg)) => {
                    let cmd = model.update(msg);
                    self.execute(cmd);
                    dirty = true;
                }
                Ok(Event::Fatal(reason)) => break Err(Error::Fatal(reason)),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    break Err(Error::Fatal("event queue closed".into()));
                }
            }
        };
        self.cancel.cancel();
        match &result {
            Ok(()) => info!("dashboard stopped"),
            Err(e) => warn!(error = %e, "dashboard stopped on error"),
        }
        result
    }

    /// Starts every leaf of `cmd`. Results arrive later as events.
    pub fn execute(&self, cmd: Cmd) {
        for leaf in cmd.flatten() {
            match leaf {
                Cmd::None | Cmd::Batch(_) => {}
                Cmd::Quit => self.cancel.cancel(),
                Cmd::Msg(msg) => {
                    let _ = self.tx.send(Event::Msg(msg));
                }
                Cmd::Tick(delay) => self.schedule_tick(delay),
                Cmd::Fetch { source, deadline } => self.fetch(source, deadline),
            }
        }
    }

    fn schedule_tick(&self, delay: Duration) {
        let tx = self.sender();
        let cancel = self.cancel.clone();
        thread::spawn(move || {
            if sleep_unless_cancelled(delay, &cancel) {
                let _ = tx.send(Event::Msg(Msg::Tick(Utc::now())));
            }
        });
    }

    /// Fetches on a worker; a supervisor enforces the deadline.
    ///
    /// A timed-out worker keeps running until the source returns; until then
    /// further fetches of that source are skipped.
    fn fetch(&self, kind: SourceKind, deadline: Duration) {
        let tx = self.sender();
        let cancel = self.cancel.clone();
        let Some(source) = self.sources.get(&kind).cloned() else {
            warn!(source = %kind, "no data source registered");
            let _ = tx.send(Event::Msg(Msg::DataUpdate(DataUpdate::failed(
                kind.as_str(),
                FetchError::NotFound,
                Utc::now(),
            ))));
            return;
        };
        if !self.in_flight.lock().insert(kind) {
            debug!(source = %kind, "previous fetch still running, skipping");
            return;
        }
        let slot = FetchSlot {
            in_flight: Arc::clone(&self.in_flight),
            kind,
        };

        thread::spawn(move || {
            let (done_tx, done_rx) = mpsc::channel();
            let worker_cancel = cancel.clone();
            thread::spawn(move || {
                let _slot = slot;
                let _ = done_tx.send(source.fetch(&worker_cancel));
            });

            let update = match done_rx.recv_timeout(deadline) {
                Ok(Ok(payload)) => DataUpdate::ok(payload, Utc::now()),
                Ok(Err(FetchError::Cancelled)) => return,
                Ok(Err(e)) => DataUpdate::failed(kind.as_str(), e, Utc::now()),
                Err(RecvTimeoutError::Timeout) => {
                    warn!(source = %kind, ?deadline, "fetch timed out");
                    DataUpdate::failed(kind.as_str(), FetchError::Timeout, Utc::now())
                }
                Err(RecvTimeoutError::Disconnected) => DataUpdate::failed(
                    kind.as_str(),
                    FetchError::Io("fetch worker died".into()),
                    Utc::now(),
                ),
            };
            if cancel.is_cancelled() {
                debug!(source = %kind, "dropping fetch result after shutdown");
                return;
            }
            let _ = tx.send(Event::Msg(Msg::DataUpdate(update)));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{ClusterSummary, Payload};
    use crate::widgets::Placeholder;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    const WAIT: Duration = Duration::from_secs(2);

    struct StaticSource;

    impl DataSource for StaticSource {
        fn kind(&self) -> SourceKind {
            SourceKind::K8s
        }
        fn fetch(&self, cancel: &CancelToken) -> std::result::Result<Payload, FetchError> {
            cancel.check()?;
            Ok(Payload::K8s(ClusterSummary::default()))
        }
    }

    struct SlowSource;

    impl DataSource for SlowSource {
        fn kind(&self) -> SourceKind {
            SourceKind::System
        }
        fn fetch(&self, _cancel: &CancelToken) -> std::result::Result<Payload, FetchError> {
            thread::sleep(Duration::from_millis(500));
            Ok(Payload::System(Default::default()))
        }
    }

    /// Blocks in `fetch` until the gate opens, counting calls.
    #[derive(Default)]
    struct GatedSource {
        open: Arc<AtomicBool>,
        starts: Arc<AtomicUsize>,
    }

    impl DataSource for GatedSource {
        fn kind(&self) -> SourceKind {
            SourceKind::Tailscale
        }
        fn fetch(&self, _cancel: &CancelToken) -> std::result::Result<Payload, FetchError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            while !self.open.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(5));
            }
            Ok(Payload::Tailscale(Default::default()))
        }
    }

    fn wait_for(cond: impl Fn() -> bool) {
        let end = Instant::now() + WAIT;
        while !cond() {
            assert!(Instant::now() < end, "condition not reached");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[derive(Default)]
    struct FakeScreen {
        frames: Vec<String>,
    }

    impl Screen for FakeScreen {
        fn size(&self) -> Result<(usize, usize)> {
            Ok((40, 12))
        }
        fn draw(&mut self, frame: &str) -> Result<()> {
            self.frames.push(frame.to_string());
            Ok(())
        }
    }

    fn runtime() -> Runtime {
        Runtime::new(
            vec![Arc::new(StaticSource), Arc::new(SlowSource)],
            CancelToken::new(),
        )
    }

    fn next_update(rt: &Runtime) -> DataUpdate {
        match rt.rx.recv_timeout(WAIT) {
            Ok(Event::Msg(Msg::DataUpdate(u))) => u,
            other => panic!("expected a data update, got {other:?}"),
        }
    }

    #[test]
    fn fetch_delivers_update() {
        let rt = runtime();
        rt.execute(Cmd::Fetch {
            source: SourceKind::K8s,
            deadline: WAIT,
        });
        let update = next_update(&rt);
        assert_eq!(update.source, "k8s");
        assert!(update.payload().is_some());
    }

    #[test]
    fn slow_fetch_times_out() {
        let rt = runtime();
        rt.execute(Cmd::Fetch {
            source: SourceKind::System,
            deadline: Duration::from_millis(20),
        });
        let update = next_update(&rt);
        assert_eq!(update.source, "sysmetrics");
        assert_eq!(update.err, Some(FetchError::Timeout));
        assert!(update.data.is_none());
    }

    #[test]
    fn stalled_source_gets_one_worker() {
        let source = GatedSource::default();
        let (open, starts) = (source.open.clone(), source.starts.clone());
        let rt = Runtime::new(vec![Arc::new(source)], CancelToken::new());
        let fetch = || Cmd::Fetch {
            source: SourceKind::Tailscale,
            deadline: Duration::from_millis(20),
        };

        rt.execute(fetch());
        assert_eq!(next_update(&rt).err, Some(FetchError::Timeout));
        wait_for(|| starts.load(Ordering::SeqCst) == 1);

        // Two more ticks while the worker hangs.
        rt.execute(Cmd::batch([fetch(), fetch()]));
        assert!(rt.rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(starts.load(Ordering::SeqCst), 1);

        open.store(true, Ordering::SeqCst);
        wait_for(|| rt.in_flight.lock().is_empty());
        rt.execute(Cmd::Fetch {
            source: SourceKind::Tailscale,
            deadline: WAIT,
        });
        assert!(next_update(&rt).payload().is_some());
        assert_eq!(starts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unknown_source_fails() {
        let rt = runtime();
        rt.execute(Cmd::Fetch {
            source: SourceKind::Billing,
            deadline: WAIT,
        });
        assert_eq!(next_update(&rt).err, Some(FetchError::NotFound));
    }

    #[test]
    fn cancelled_fetch_is_dropped() {
        let rt = runtime();
        rt.cancel_token().cancel();
        rt.execute(Cmd::Fetch {
            source: SourceKind::K8s,
            deadline: WAIT,
        });
        assert!(rt.rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn batch_messages_and_ticks_arrive() {
        let rt = runtime();
        rt.execute(Cmd::batch([
            Cmd::Msg(Msg::FocusWidget("cpu".into())),
            Cmd::Tick(Duration::from_millis(10)),
        ]));
        assert!(matches!(
            rt.rx.recv_timeout(WAIT),
            Ok(Event::Msg(Msg::FocusWidget(id))) if id == "cpu"
        ));
        assert!(matches!(rt.rx.recv_timeout(WAIT), Ok(Event::Msg(Msg::Tick(_)))));
    }

    #[test]
    fn run_draws_until_quit() {
        let rt = runtime();
        let mut model = Model::new(vec![Box::new(Placeholder::new("cpu", "CPU"))]);
        let mut screen = FakeScreen::default();
        rt.sender()
            .send(Event::Msg(Msg::Key(KeyEvent::new(
                KeyCode::Char('q'),
                KeyModifiers::NONE,
            ))))
            .unwrap();
        rt.run(&mut model, &mut screen).unwrap();
        assert!(model.is_quitting());
        assert!(rt.cancel_token().is_cancelled());
        let first = &screen.frames[0];
        assert_eq!(first.split('\n').count(), 12);
    }

    #[test]
    fn fatal_input_stops_loop() {
        let rt = runtime();
        let mut model = Model::new(Vec::new());
        rt.sender().send(Event::Fatal("tty gone".into())).unwrap();
        let err = rt.run(&mut model, &mut FakeScreen::default()).unwrap_err();
        assert!(matches!(err, Error::Fatal(_)));
    }
}
