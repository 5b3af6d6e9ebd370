//! Reference line provider lifecycle and background worker.
//!
//! # Threads
//!
//! ```text
//! caller threads                         marga-reference-line
//! ───────────────                        ────────────────────
//! update_vehicle_state ─┐                loop every cycle_period:
//! update_routing ───────┼─► RouteContext   routing ready? else skip
//!                       │   (one mutex)    generate → publish
//! get_reference_lines ◄─┴── SnapshotCell ◄─┘
//! ```
//!
//! In synchronous mode there is no worker; `get_reference_lines` runs a
//! cycle on the calling thread and returns what it published.
//!
//! # Lock order
//!
//! lifecycle → cycle → context. The cycle lock is held for a whole
//! generation cycle including publication, so at most one cycle is in
//! flight and nothing is published once `stop` has returned.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;

use crate::config::MargaConfig;
use crate::core::VehicleState;
use crate::error::{Error, Result};
use crate::map::{RouteMap, RoutingResult};

use super::generator::{ReferenceLineGenerator, RouteContext};
use super::snapshot::{ReferenceLines, SnapshotCell};

/// Name of the background generation thread.
pub const WORKER_THREAD_NAME: &str = "marga-reference-line";

/// Provider lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderState {
    /// Created, no route map installed
    Uninitialized,
    /// Route map installed, not running
    Initialized,
    /// Running (worker active in background mode)
    Running,
    /// Stopped; `init` makes it usable again
    Stopped,
}

struct Shared<M> {
    config: MargaConfig,
    context: Mutex<RouteContext<M>>,
    /// Cycle lock. `None` while no cycle may publish.
    generator: Mutex<Option<ReferenceLineGenerator>>,
    snapshot: SnapshotCell,
}

impl<M: RouteMap> Shared<M> {
    /// Run one cycle and publish its result.
    fn generate_and_publish(&self) -> Result<ReferenceLines> {
        let cycle = self.generator.lock();
        // Only `stop` takes the generator away from an initialized provider
        let Some(generator) = cycle.as_ref() else {
            return Err(Error::InvalidState {
                state: ProviderState::Stopped,
                operation: "generate reference lines",
            });
        };
        if !self.context.lock().has_routing() {
            return Err(Error::RoutingNotReady);
        }

        let entries = generator.generate(&self.context)?;
        Ok(self.snapshot.publish(entries))
    }

    fn run_generation_loop(&self, shutdown: Receiver<()>) {
        let period = self.config.provider.cycle_period();
        log::info!("Reference line worker started (period {:?})", period);

        let mut cycles = 0u64;
        loop {
            let started = Instant::now();
            match self.generate_and_publish() {
                Ok(lines) => {
                    cycles += 1;
                    log::debug!("Cycle {}: published {} reference lines", cycles, lines.len());
                }
                Err(Error::RoutingNotReady) => log::warn!("Routing is not ready, skipping cycle"),
                Err(e) => log::error!("Reference line generation failed: {}", e),
            }

            let remaining = period.saturating_sub(started.elapsed());
            match shutdown.recv_timeout(remaining) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        log::info!("Reference line worker stopped after {} published cycles", cycles);
    }
}

struct Worker {
    shutdown_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl Worker {
    fn join(self) {
        // A full channel means shutdown was already requested
        let _ = self.shutdown_tx.try_send(());
        if self.handle.join().is_err() {
            log::error!("Reference line worker panicked");
        }
    }
}

struct Lifecycle {
    state: ProviderState,
    worker: Option<Worker>,
}

/// Produces smoothed reference lines from routing and vehicle state.
///
/// All methods take `&self`; wrap the provider in an `Arc` to share it
/// between update producers and consumers.
pub struct ReferenceLineProvider<M: RouteMap + 'static> {
    shared: Arc<Shared<M>>,
    lifecycle: Mutex<Lifecycle>,
}

impl<M: RouteMap + 'static> ReferenceLineProvider<M> {
    /// Create an uninitialized provider.
    pub fn new(config: MargaConfig) -> Self {
        let context = RouteContext::new(config.lane_change.clone());
        Self {
            shared: Arc::new(Shared {
                config,
                context: Mutex::new(context),
                generator: Mutex::new(None),
                snapshot: SnapshotCell::new(),
            }),
            lifecycle: Mutex::new(Lifecycle {
                state: ProviderState::Uninitialized,
                worker: None,
            }),
        }
    }

    /// Install a route map and build the smoothing pipeline.
    ///
    /// Valid from `Uninitialized` or `Stopped`. Clears lane-change history,
    /// the routing-ready flag and any previously published snapshot.
    pub fn init(&self, route_map: M) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        match lifecycle.state {
            ProviderState::Uninitialized | ProviderState::Stopped => {}
            state => {
                return Err(Error::InvalidState {
                    state,
                    operation: "init",
                });
            }
        }

        let generator = ReferenceLineGenerator::from_config(&self.shared.config);
        let smoother = generator.pipeline().smoother().name();
        let smoothing = generator.pipeline().is_enabled();

        *self.shared.generator.lock() = Some(generator);
        self.shared.context.lock().install(route_map);
        self.shared.snapshot.reset();
        lifecycle.state = ProviderState::Initialized;

        log::info!(
            "Reference line provider initialized (smoother: {}, smoothing enabled: {})",
            smoother,
            smoothing
        );
        Ok(())
    }

    /// Start the provider, spawning the worker in background mode.
    pub fn start(&self) -> Result<()> {
        let mut lifecycle = self.lifecycle.lock();
        match lifecycle.state {
            ProviderState::Initialized => {}
            ProviderState::Uninitialized => return Err(Error::NotInitialized),
            state => {
                return Err(Error::InvalidState {
                    state,
                    operation: "start",
                });
            }
        }

        if self.shared.config.provider.enable_background_thread {
            let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
            let shared = Arc::clone(&self.shared);
            let handle = thread::Builder::new()
                .name(WORKER_THREAD_NAME.to_string())
                .spawn(move || shared.run_generation_loop(shutdown_rx))?;
            lifecycle.worker = Some(Worker {
                shutdown_tx,
                handle,
            });
        }

        lifecycle.state = ProviderState::Running;
        log::info!(
            "Reference line provider started ({} mode)",
            if lifecycle.worker.is_some() {
                "background"
            } else {
                "synchronous"
            }
        );
        Ok(())
    }

    /// Stop the provider and join the worker.
    ///
    /// No-op unless running. Once this returns no cycle is in flight and
    /// nothing more is published until the next `init`.
    pub fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.state != ProviderState::Running {
            return;
        }

        if let Some(worker) = lifecycle.worker.take() {
            worker.join();
        }
        // Waits for an in-flight synchronous cycle
        *self.shared.generator.lock() = None;
        self.shared.snapshot.close();
        lifecycle.state = ProviderState::Stopped;

        log::info!("Reference line provider stopped");
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ProviderState {
        self.lifecycle.lock().state
    }

    /// Replace the stored vehicle state.
    ///
    /// Accepted in every lifecycle state; the latest value wins.
    pub fn update_vehicle_state(&self, state: VehicleState) {
        self.shared.context.lock().update_vehicle_state(state);
    }

    /// Forward a routing result to the route map.
    pub fn update_routing(&self, routing: &RoutingResult) -> Result<()> {
        self.shared.context.lock().update_routing(routing)
    }

    /// Current reference lines.
    ///
    /// In background mode this blocks until the worker has published the
    /// first snapshot, also when called between `init` and `start`. In
    /// synchronous mode a cycle runs on the calling thread.
    pub fn get_reference_lines(&self) -> Result<ReferenceLines> {
        self.fetch(None)
    }

    /// Like [`get_reference_lines`](Self::get_reference_lines), waiting at
    /// most `timeout` for the first background snapshot.
    pub fn get_reference_lines_timeout(&self, timeout: Duration) -> Result<ReferenceLines> {
        self.fetch(Some(timeout))
    }

    fn fetch(&self, timeout: Option<Duration>) -> Result<ReferenceLines> {
        let state = self.lifecycle.lock().state;
        match state {
            ProviderState::Uninitialized => Err(Error::NotInitialized),
            ProviderState::Stopped => self.shared.snapshot.latest().ok_or(Error::InvalidState {
                state,
                operation: "get reference lines",
            }),
            ProviderState::Initialized | ProviderState::Running => {
                if !self.shared.config.provider.enable_background_thread {
                    return self.shared.generate_and_publish();
                }

                let lines = match timeout {
                    Some(timeout) => self.shared.snapshot.wait_timeout(timeout),
                    None => self.shared.snapshot.wait(),
                };
                match lines {
                    Some(lines) => Ok(lines),
                    None if self.shared.snapshot.is_closed() => Err(Error::InvalidState {
                        state: ProviderState::Stopped,
                        operation: "get reference lines",
                    }),
                    None => Err(Error::Timeout(timeout.unwrap_or_default())),
                }
            }
        }
    }

    /// Most recent published snapshot without waiting or generating.
    pub fn latest(&self) -> Option<ReferenceLines> {
        self.shared.snapshot.latest()
    }

    /// Number of snapshots published so far.
    pub fn snapshot_sequence(&self) -> u64 {
        self.shared.snapshot.sequence()
    }

    /// Number of segments with lane-change history.
    pub fn tracked_segment_count(&self) -> usize {
        self.shared.context.lock().tracker().len()
    }

    /// Provider configuration.
    pub fn config(&self) -> &MargaConfig {
        &self.shared.config
    }
}

impl<M: RouteMap + 'static> Drop for ReferenceLineProvider<M> {
    fn drop(&mut self) {
        if let Some(worker) = self.lifecycle.get_mut().worker.take() {
            worker.join();
        }
    }
}
