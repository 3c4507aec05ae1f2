//! Fixed-cadence driver that owns the active transition session.
//!
//! The runner ticks the session on its own thread every 50 ms:
//! drain the energy tap, advance the session, push the resulting
//! frame into the deck actuator, publish the snapshot for observers.
//! Only one session may be in flight at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver};
use crossmix_analysis::EnergySample;
use ringbuf::traits::{Consumer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use thiserror::Error;
use tracing::debug;

use crate::session::TransitionSession;
use crate::smart::SmartConfig;
use crate::types::{ControlSnapshot, DeckId, Strategy};

/// Cadence of the control loop
pub const TICK_INTERVAL: Duration = Duration::from_millis(50);

/// Snapshots buffered for observers before old ones are dropped
const SNAPSHOT_BUFFER: usize = 64;

/// The surface a running transition writes to. Implementations take
/// these writes even when ordinary user writes are being ignored.
pub trait DeckActuator: Send {
    /// Claim the crossfader/EQ/volume surface for the session
    fn begin_session_control(&mut self);
    /// Release the surface, keeping the last written values
    fn end_session_control(&mut self);
    fn set_crossfader(&mut self, position: f32);
    fn set_eq(&mut self, deck: DeckId, hi: f32, mid: f32, lo: f32);
    fn set_volume(&mut self, deck: DeckId, volume: f32);
}

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("a transition session is already active")]
    SessionActive,
}

/// SPSC channel carrying band-energy samples from the audio side into
/// the control loop
pub fn energy_channel(capacity: usize) -> (HeapProd<EnergySample>, HeapCons<EnergySample>) {
    HeapRb::new(capacity).split()
}

pub struct TransitionRunner {
    active: Arc<AtomicBool>,
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl TransitionRunner {
    pub fn new() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(false)),
            stop: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Start a session and drive it to completion on a background
    /// thread. Returns the snapshot stream for observers.
    pub fn start<A>(
        &mut self,
        mut actuator: A,
        strategy: Strategy,
        bpm: u32,
        start_crossfader: f32,
        mut energy: HeapCons<EnergySample>,
        config: SmartConfig,
    ) -> Result<Receiver<ControlSnapshot>, TransitionError>
    where
        A: DeckActuator + 'static,
    {
        if self.active.swap(true, Ordering::AcqRel) {
            return Err(TransitionError::SessionActive);
        }
        self.stop.store(false, Ordering::Release);

        // Reap a previously finished thread before reusing the slot
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }

        let (tx, rx) = bounded(SNAPSHOT_BUFFER);
        let active = Arc::clone(&self.active);
        let stop = Arc::clone(&self.stop);

        let handle = thread::spawn(move || {
            actuator.begin_session_control();
            let started = Instant::now();
            let mut session =
                TransitionSession::start_with_config(strategy, bpm, start_crossfader, 0.0, config);

            loop {
                if stop.load(Ordering::Acquire) {
                    debug!(%strategy, "transition cancelled");
                    break;
                }

                while let Some(sample) = energy.try_pop() {
                    session.push_energy(sample);
                }

                let snap = session.tick(started.elapsed().as_secs_f64());
                actuator.set_crossfader(snap.crossfader);
                actuator.set_eq(DeckId::A, snap.eq_a.hi, snap.eq_a.mid, snap.eq_a.lo);
                actuator.set_eq(DeckId::B, snap.eq_b.hi, snap.eq_b.mid, snap.eq_b.lo);
                actuator.set_volume(DeckId::A, snap.vol_a);
                actuator.set_volume(DeckId::B, snap.vol_b);

                // Observers may be slow or gone; never block the loop
                let _ = tx.try_send(snap);

                if session.is_done() {
                    break;
                }
                thread::sleep(TICK_INTERVAL);
            }

            actuator.end_session_control();
            active.store(false, Ordering::Release);
        });
        self.handle = Some(handle);
        Ok(rx)
    }

    /// Cancel the active session, if any, and wait for the control
    /// loop to release the surface
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Default for TransitionRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TransitionRunner {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ringbuf::traits::Producer;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Log {
        begun: bool,
        ended: bool,
        crossfader_writes: Vec<f32>,
    }

    #[derive(Clone)]
    struct RecordingActuator(Arc<Mutex<Log>>);

    impl DeckActuator for RecordingActuator {
        fn begin_session_control(&mut self) {
            self.0.lock().unwrap().begun = true;
        }
        fn end_session_control(&mut self) {
            self.0.lock().unwrap().ended = true;
        }
        fn set_crossfader(&mut self, position: f32) {
            self.0.lock().unwrap().crossfader_writes.push(position);
        }
        fn set_eq(&mut self, _deck: DeckId, _hi: f32, _mid: f32, _lo: f32) {}
        fn set_volume(&mut self, _deck: DeckId, _volume: f32) {}
    }

    #[test]
    fn runner_claims_surface_and_streams_snapshots() {
        let log = Arc::new(Mutex::new(Log::default()));
        let mut runner = TransitionRunner::new();
        let (_prod, cons) = energy_channel(256);

        let rx = runner
            .start(
                RecordingActuator(Arc::clone(&log)),
                Strategy::Party,
                128,
                0.0,
                cons,
                SmartConfig::default(),
            )
            .unwrap();

        let snap = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(snap.crossfader >= 0.0);
        assert!(runner.is_active());

        runner.stop();
        let log = log.lock().unwrap();
        assert!(log.begun);
        assert!(log.ended);
        assert!(!log.crossfader_writes.is_empty());
    }

    #[test]
    fn second_session_is_rejected_while_active() {
        let log = Arc::new(Mutex::new(Log::default()));
        let mut runner = TransitionRunner::new();

        let (_p1, c1) = energy_channel(64);
        runner
            .start(
                RecordingActuator(Arc::clone(&log)),
                Strategy::Smart,
                128,
                0.0,
                c1,
                SmartConfig::default(),
            )
            .unwrap();

        let (_p2, c2) = energy_channel(64);
        let second = runner.start(
            RecordingActuator(Arc::clone(&log)),
            Strategy::Smooth,
            128,
            0.0,
            c2,
            SmartConfig::default(),
        );
        assert!(matches!(second, Err(TransitionError::SessionActive)));

        runner.stop();
        assert!(!runner.is_active());
    }

    #[test]
    fn energy_samples_reach_the_session() {
        let log = Arc::new(Mutex::new(Log::default()));
        let mut runner = TransitionRunner::new();
        let (mut prod, cons) = energy_channel(256);

        for i in 0..100 {
            let _ = prod.try_push(EnergySample {
                timestamp: i as f64 * 0.05,
                total: 70.0,
                bass: 50.0,
                mid: 60.0,
                hi: 40.0,
            });
        }

        let rx = runner
            .start(
                RecordingActuator(Arc::clone(&log)),
                Strategy::Smart,
                128,
                0.0,
                cons,
                SmartConfig::default(),
            )
            .unwrap();
        let snap = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(!snap.status.is_empty());
        runner.stop();
    }
}
