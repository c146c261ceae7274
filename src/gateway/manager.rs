//! Keeping the gateway table up to date.
//!
//! The [`NetworkManager`] ties everything together. It holds the current
//! [`MeshNetworks`], the [`HostCache`] with one entry per referenced host
//! name, and the published [`GatewayTable`]. The first two live together
//! behind a single mutex and are only ever changed together with a rebuild
//! of the table, which is then published through an [`ArcSwap`] so that
//! readers never wait for the lock.
//!
//! Every host in the cache has its own refresh task. The task sleeps until
//! the deadline of the host, resolves it without holding the lock, and
//! hands the answer back to the manager. Tasks only keep a weak reference
//! to the manager and are aborted when their host is evicted, when the
//! manager is shut down, or when it is dropped.
//!
//! Whenever the set of gateways in a rebuilt table differs from the
//! published one, the [`GatewayListener`] is told about it once the lock
//! has been released. Each such change gets a version number and the
//! listener is never called for a version older than one it has already
//! been called for.
//!
//! A refresh task sleeping until the deadline of its host is woken up when
//! an answer fed in through
//! [`on_resolution_complete`](NetworkManager::on_resolution_complete)
//! moves that deadline.

use super::cache::{HostCache, HostEntry, HostState};
use super::conf::GatewayConf;
use super::notify::GatewayListener;
use super::pool::Pool;
use super::resolve::{HostAnswer, ResolveHost};
use super::spec::{GatewayAddr, MeshNetworks, NetworkGateway};
use super::table::GatewayTable;
use crate::base::Dname;
use crate::net::client::dgram;
use arc_swap::ArcSwap;
use futures_util::future::join_all;
use parking_lot::{Mutex, MutexGuard};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, timeout, Instant};
use tracing::{debug, trace, warn};

/// How long shutdown waits for tasks to finish.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

//------------ NetworkManager ------------------------------------------------

/// The manager of the cross-network gateways.
///
/// Creating a manager does not need a Tokio runtime but applying a
/// configuration does, since it spawns the refresh tasks.
///
/// # Example
///
/// ```no_run
/// use gateway_resolv::gateway::{
///     GatewayConf, MeshNetworks, Network, NetworkManager,
/// };
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<()>();
/// let manager = NetworkManager::new(GatewayConf::system()?, tx);
/// manager.apply_config(MeshNetworks::new().with_network(
///     "nw0",
///     Network::default().with_gateway("gw.example.com", 15443),
/// ));
/// while rx.recv().await.is_some() {
///     for gateway in manager.all_gateways() {
///         println!("{gateway}");
///     }
/// }
/// # Ok(())
/// # }
/// ```
pub struct NetworkManager {
    inner: Arc<Inner>,
}

/// # Creation
///
impl NetworkManager {
    /// Creates a manager resolving through the configured servers.
    pub fn new(
        conf: GatewayConf,
        listener: impl GatewayListener + 'static,
    ) -> Self {
        let config = conf.dgram_config();
        let pool = Pool::new(
            conf.servers()
                .iter()
                .map(|server| {
                    dgram::Connection::new(*server, Some(config.clone()))
                })
                .collect(),
        );
        Self::with_resolver(conf, pool, listener)
    }

    /// Creates a manager with a custom resolver.
    ///
    /// Only the cache settings of `conf` are used.
    pub fn with_resolver(
        conf: GatewayConf,
        resolver: impl ResolveHost + 'static,
        listener: impl GatewayListener + 'static,
    ) -> Self {
        NetworkManager {
            inner: Arc::new(Inner {
                resolver: Arc::new(resolver),
                listener: Box::new(listener),
                table: ArcSwap::from_pointee(GatewayTable::new()),
                announced: AtomicU64::new(0),
                state: Mutex::new(State {
                    networks: Arc::new(MeshNetworks::new()),
                    cache: HostCache::new(
                        conf.min_ttl(),
                        conf.failure_backoff(),
                    ),
                    version: 0,
                    refresh: HashMap::new(),
                    watcher: None,
                    shut_down: false,
                }),
            }),
        }
    }
}

/// # Updates
///
impl NetworkManager {
    /// Replaces the gateway configuration.
    ///
    /// Hosts referenced for the first time are resolved right away, hosts
    /// no longer referenced are forgotten. The table is rebuilt before the
    /// method returns, so gateways with literal addresses are available
    /// immediately.
    ///
    /// An empty value means that no networks are configured.
    pub fn apply_config(&self, networks: impl Into<Arc<MeshNetworks>>) {
        self.inner.apply(networks.into())
    }

    /// Records the answer of a resolution of `host`.
    ///
    /// This is what the refresh tasks do after resolving a host. Calling it
    /// directly allows feeding in answers from elsewhere. The next refresh
    /// of the host is rescheduled according to the answer. Returns `false`
    /// if the host is not in the cache, in which case the answer is
    /// dropped.
    pub fn on_resolution_complete(
        &self,
        host: &Dname,
        answer: HostAnswer,
    ) -> bool {
        let state = self.inner.state.lock();
        let generation = match state.cache.get(host) {
            Some(entry) => entry.generation(),
            None => {
                debug!(host = %host, "dropping answer for unknown host");
                return false;
            }
        };
        let wake =
            state.refresh.get(host).map(|refresh| refresh.wake.clone());
        if !self.inner.update(state, host, generation, answer) {
            return false;
        }
        if let Some(wake) = wake {
            wake.notify_one();
        }
        true
    }

    /// Follows a source of gateway configuration.
    ///
    /// The current value of `rx` is applied immediately, every later value
    /// when it arrives. A previously watched source is dropped.
    pub fn watch(&self, mut rx: watch::Receiver<Arc<MeshNetworks>>) {
        let current = rx.borrow_and_update().clone();
        self.inner.apply(current);

        let inner = Arc::downgrade(&self.inner);
        let task = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let networks = rx.borrow_and_update().clone();
                match inner.upgrade() {
                    Some(inner) => inner.apply(networks),
                    None => return,
                }
            }
            debug!("mesh networks source closed");
        });

        let mut state = self.inner.state.lock();
        if state.shut_down {
            task.abort();
        } else if let Some(old) = state.watcher.replace(task) {
            old.abort();
        }
    }

    /// Stops all background activity.
    ///
    /// Refresh tasks and the configuration watcher are aborted and given a
    /// short grace period to wind down. The last published table stays
    /// available and configuration can still be applied, but hosts are not
    /// resolved anymore.
    pub async fn shutdown(&self) {
        let tasks = {
            let mut state = self.inner.state.lock();
            state.shut_down = true;
            let mut tasks: Vec<_> = state
                .refresh
                .drain()
                .map(|(_, refresh)| refresh.task)
                .collect();
            tasks.extend(state.watcher.take());
            tasks
        };
        for task in &tasks {
            task.abort();
        }
        if timeout(SHUTDOWN_GRACE, join_all(tasks)).await.is_err() {
            warn!("background tasks did not stop in time");
        }
        debug!("network manager shut down");
    }
}

/// # Queries
///
/// None of these methods wait for resolutions in progress.
impl NetworkManager {
    /// Returns all gateways sorted by network, address, and port.
    pub fn all_gateways(&self) -> Vec<NetworkGateway> {
        self.inner.table.load().all().to_vec()
    }

    /// Returns the gateways of one network.
    pub fn gateways_for_network(&self, network: &str) -> Vec<NetworkGateway> {
        self.inner.table.load().for_network(network).to_vec()
    }

    /// Returns the gateways grouped by network.
    pub fn gateways_by_network(&self) -> BTreeMap<String, Vec<NetworkGateway>> {
        self.inner.table.load().by_network()
    }

    /// Returns the currently published table.
    pub fn snapshot(&self) -> Arc<GatewayTable> {
        self.inner.table.load_full()
    }

    /// Returns whether at least one network is configured.
    ///
    /// This does not depend on whether any gateway could be resolved.
    pub fn is_multi_network_enabled(&self) -> bool {
        self.inner.table.load().is_multi_network()
    }

    /// Returns the current configuration.
    pub fn networks(&self) -> Arc<MeshNetworks> {
        self.inner.state.lock().networks.clone()
    }

    /// Returns the resolution state of a host.
    ///
    /// Returns `None` if the host isn’t referenced by the configuration.
    pub fn host_state(&self, host: &Dname) -> Option<HostState> {
        self.inner.state.lock().cache.get(host).map(HostEntry::state)
    }

    /// Returns a copy of the cache entry of a host.
    pub fn host_entry(&self, host: &Dname) -> Option<HostEntry> {
        self.inner.state.lock().cache.get(host).cloned()
    }
}

impl fmt::Debug for NetworkManager {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("NetworkManager")
            .field("gateways", &self.inner.table.load().len())
            .finish_non_exhaustive()
    }
}

//------------ Inner ---------------------------------------------------------

struct Inner {
    /// The resolver for host names.
    resolver: Arc<dyn ResolveHost>,

    /// Who to tell about table changes.
    listener: Box<dyn GatewayListener>,

    /// The published table.
    table: ArcSwap<GatewayTable>,

    /// The newest table version the listener was called for.
    announced: AtomicU64,

    /// Everything else.
    state: Mutex<State>,
}

struct State {
    /// The current configuration.
    networks: Arc<MeshNetworks>,

    /// The referenced hosts.
    cache: HostCache,

    /// The version of the published gateway set.
    version: u64,

    /// The refresh task of each host.
    refresh: HashMap<Dname, Refresh>,

    /// The task following a configuration source.
    watcher: Option<JoinHandle<()>>,

    /// Whether shutdown has been called.
    shut_down: bool,
}

/// The refresh task of a host.
struct Refresh {
    task: JoinHandle<()>,

    /// Wakes the task up when the deadline moved.
    wake: Arc<Notify>,
}

/// What a refresh task should do next.
enum Step {
    Resolve(Arc<dyn ResolveHost>),
    Wait(Instant),
    Stop,
}

impl Inner {
    fn apply(self: &Arc<Self>, networks: Arc<MeshNetworks>) {
        for (network, spec) in networks.specs() {
            if spec.addr() == GatewayAddr::Invalid {
                warn!(
                    network,
                    address = spec.address(),
                    "ignoring malformed gateway address"
                );
            }
        }
        let hosts = networks.hostnames();

        let mut state = self.state.lock();
        let changes = state.cache.reconcile(&hosts, Instant::now());
        for host in changes.evicted {
            if let Some(refresh) = state.refresh.remove(&host) {
                refresh.task.abort();
            }
            debug!(host = %host, "host evicted");
        }
        for (host, generation) in changes.added {
            debug!(host = %host, generation, "host added");
            if state.shut_down {
                continue;
            }
            let wake = Arc::new(Notify::new());
            let task = tokio::spawn(refresh(
                Arc::downgrade(self),
                host.clone(),
                generation,
                wake.clone(),
            ));
            state.refresh.insert(host, Refresh { task, wake });
        }
        state.networks = networks;
        let version = self.publish(&mut state);
        drop(state);
        self.announce(version);
    }

    fn begin(&self, host: &Dname, generation: u64) -> Step {
        let mut state = self.state.lock();
        let deadline = match state.cache.deadline(host, generation) {
            Some(deadline) => deadline,
            None => return Step::Stop,
        };
        if deadline > Instant::now() {
            return Step::Wait(deadline);
        }
        state.cache.begin(host, generation);
        trace!(host = %host, "resolving");
        Step::Resolve(self.resolver.clone())
    }

    /// Applies an answer and releases the lock.
    fn update(
        &self,
        mut state: MutexGuard<State>,
        host: &Dname,
        generation: u64,
        answer: HostAnswer,
    ) -> bool {
        if !state.cache.complete(host, generation, answer, Instant::now()) {
            return false;
        }
        let version = self.publish(&mut state);
        drop(state);
        self.announce(version);
        true
    }

    /// Rebuilds the table and publishes it if anything changed.
    ///
    /// Returns the new version if the set of gateways changed.
    fn publish(&self, state: &mut State) -> Option<u64> {
        let table = GatewayTable::build(&state.networks, &state.cache);
        let current = self.table.load();
        let changed = !current.same_gateways(&table);
        let flipped = current.is_multi_network() != table.is_multi_network();
        drop(current);
        if !changed && !flipped {
            return None;
        }
        let len = table.len();
        self.table.store(Arc::new(table));
        if !changed {
            return None;
        }
        state.version += 1;
        debug!(
            gateways = len,
            version = state.version,
            "gateway table changed"
        );
        Some(state.version)
    }

    /// Calls the listener for a published change.
    ///
    /// Must be called without holding the lock. If a newer version has
    /// been announced in the meantime, the listener has already been told.
    fn announce(&self, version: Option<u64>) {
        let version = match version {
            Some(version) => version,
            None => return,
        };
        if self.announced.fetch_max(version, Ordering::AcqRel) < version {
            self.listener.gateways_changed();
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        for (_, refresh) in state.refresh.drain() {
            refresh.task.abort();
        }
        if let Some(task) = state.watcher.take() {
            task.abort();
        }
    }
}

/// Keeps resolving a host until its entry goes away.
async fn refresh(
    inner: Weak<Inner>,
    host: Dname,
    generation: u64,
    wake: Arc<Notify>,
) {
    loop {
        let step = match inner.upgrade() {
            Some(inner) => inner.begin(&host, generation),
            None => return,
        };
        match step {
            Step::Wait(deadline) => {
                tokio::select! {
                    _ = sleep_until(deadline) => {}
                    _ = wake.notified() => {}
                }
            }
            Step::Resolve(resolver) => {
                let answer = resolver.resolve_host(&host).await;
                let inner = match inner.upgrade() {
                    Some(inner) => inner,
                    None => return,
                };
                let state = inner.state.lock();
                if !inner.update(state, &host, generation, answer) {
                    return;
                }
            }
            Step::Stop => return,
        }
    }
}

//============ Testing =======================================================
