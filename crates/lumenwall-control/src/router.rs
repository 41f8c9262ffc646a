//! Router: receiver and transmitter threads around one shared store
//!
//! ```text
//! generators --eHuB/UDP--> Receiver --apply--> DmxStateStore --snapshot--> Transmitter --Art-Net/UDP--> controllers
//! ```
//!
//! The two loops never talk to each other directly. Startup is synchronous:
//! if the eHuB socket cannot be bound, [`Router::start`] fails before any
//! thread is spawned.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use lumenwall_core::{DmxStateStore, EntityLookupTable, PatchTable, RouterConfig};

use crate::receiver::{Receiver, ReceiverStats};
use crate::transmitter::{Transmitter, TransmitterStats};
use crate::{error::ControlError, Result};

/// Entry point for running the router
pub struct Router;

impl Router {
    /// Bind the eHuB socket and start both loops
    pub fn start(
        config: &RouterConfig,
        lookup: EntityLookupTable,
        patch: PatchTable,
    ) -> Result<RouterHandle> {
        let store = Arc::new(DmxStateStore::new(lookup));
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut receiver = Receiver::bind(&config.listen_addr(), Arc::clone(&store), config.order)?;
        let local_addr = receiver.local_addr()?;

        if !patch.is_empty() {
            tracing::info!("Patch map loaded ({} rules)", patch.rule_count());
        }
        let mut transmitter = Transmitter::new(Arc::clone(&store), patch, config);

        let rx = {
            let shutdown = Arc::clone(&shutdown);
            thread::Builder::new()
                .name("lumenwall-rx".into())
                .spawn(move || {
                    // a dead receiver takes the router down with it
                    let _stop = StopOnExit(Arc::clone(&shutdown));
                    receiver.run(&shutdown).map(|_| receiver.stats())
                })?
        };

        let tx = {
            let tx_shutdown = Arc::clone(&shutdown);
            let spawned = thread::Builder::new()
                .name("lumenwall-tx".into())
                .spawn(move || {
                    let _stop = StopOnExit(Arc::clone(&tx_shutdown));
                    transmitter.run(&tx_shutdown);
                    transmitter.stats()
                });
            match spawned {
                Ok(handle) => handle,
                Err(e) => {
                    shutdown.store(true, Ordering::Relaxed);
                    let _ = rx.join();
                    return Err(e.into());
                }
            }
        };

        tracing::info!(
            "Router running @ {:.1} fps, order={}, monitor={}",
            config.fps,
            config.order,
            if config.monitor.enabled { "ON" } else { "OFF" }
        );

        Ok(RouterHandle {
            shutdown,
            store,
            local_addr,
            rx,
            tx,
        })
    }
}

/// Raises the shutdown flag when a loop thread ends, including by panic
struct StopOnExit(Arc<AtomicBool>);

impl Drop for StopOnExit {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Final counters of a stopped router
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterReport {
    pub receiver: ReceiverStats,
    pub transmitter: TransmitterStats,
}

/// Handle to a running router
#[derive(Debug)]
pub struct RouterHandle {
    shutdown: Arc<AtomicBool>,
    store: Arc<DmxStateStore>,
    local_addr: SocketAddr,
    rx: JoinHandle<Result<ReceiverStats>>,
    tx: JoinHandle<TransmitterStats>,
}

impl RouterHandle {
    /// Address the eHuB socket is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// The shared DMX state
    pub fn store(&self) -> &Arc<DmxStateStore> {
        &self.store
    }

    /// Ask both loops to stop
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Whether shutdown has been requested or either loop has ended
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    /// Wait for both loops to finish.
    ///
    /// Returns the receiver's fatal socket error if that is what stopped it.
    pub fn join(self) -> Result<RouterReport> {
        let receiver = self.rx.join();
        // the transmitter must not outlive the receiver, even a panicked one
        self.shutdown.store(true, Ordering::Relaxed);
        let transmitter = self
            .tx
            .join()
            .map_err(|_| ControlError::ThreadPanicked("transmitter"))?;
        let receiver = receiver.map_err(|_| ControlError::ThreadPanicked("receiver"))??;

        Ok(RouterReport {
            receiver,
            transmitter,
        })
    }
}
