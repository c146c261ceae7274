//! Distributing gateway configuration updates.
//!
//! The [`NetworksWatcher`] holds the current [`MeshNetworks`] value of some
//! configuration source and hands out receivers that see each replacement.
//! A [`NetworkManager`](super::manager::NetworkManager) subscribes through
//! [`watch`](super::manager::NetworkManager::watch).

use super::spec::MeshNetworks;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

//------------ NetworksWatcher -----------------------------------------------

/// The source of the current gateway configuration.
#[derive(Debug)]
pub struct NetworksWatcher {
    tx: watch::Sender<Arc<MeshNetworks>>,
}

impl NetworksWatcher {
    /// Creates a watcher with an initial configuration.
    pub fn new(networks: MeshNetworks) -> Self {
        NetworksWatcher {
            tx: watch::Sender::new(Arc::new(networks)),
        }
    }

    /// Returns the current configuration.
    pub fn networks(&self) -> Arc<MeshNetworks> {
        self.tx.borrow().clone()
    }

    /// Replaces the configuration.
    ///
    /// Subscribers are only woken up if the new value differs from the
    /// current one.
    pub fn set_networks(&self, networks: MeshNetworks) {
        let networks = Arc::new(networks);
        let changed = self.tx.send_if_modified(|current| {
            if **current == *networks {
                false
            } else {
                *current = networks.clone();
                true
            }
        });
        debug!(changed, "mesh networks updated");
    }

    /// Returns a receiver for the configuration.
    pub fn subscribe(&self) -> watch::Receiver<Arc<MeshNetworks>> {
        self.tx.subscribe()
    }
}

impl Default for NetworksWatcher {
    fn default() -> Self {
        Self::new(MeshNetworks::new())
    }
}

//============ Testing =======================================================
