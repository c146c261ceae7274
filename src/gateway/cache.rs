//! The host name resolution cache.
//!
//! The cache keeps one [`HostEntry`] for every host name referenced by the
//! current gateway configuration. An entry remembers the addresses last
//! learned for the host and when the host is due for the next resolution.
//! The cache itself does no I/O and keeps no timers; it only records the
//! deadline. Driving resolution is the job of the
//! [`NetworkManager`](super::manager::NetworkManager).
//!
//! Each entry moves through the states of [`HostState`]:
//!
//! ```text
//!               +-----------------------------+
//!               v                             |
//! Unresolved -> Resolving -> Resolved / EmptyAnswer / Failed
//! ```
//!
//! Any state ends when the entry is evicted because no gateway spec
//! references the host anymore.
//!
//! Every entry is tagged with a generation number that is never reused. A
//! resolution started for one generation can only complete that very
//! generation, so the answer of a resolution still in flight when the host
//! was evicted, or evicted and added again, is dropped.

use super::resolve::{HostAnswer, Lookup};
use crate::base::Dname;
use std::cmp;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

//------------ HostState -----------------------------------------------------

/// The resolution state of a host name.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum HostState {
    /// The host has been added but no resolution has started yet.
    Unresolved,

    /// A resolution is in progress.
    Resolving,

    /// The last resolution produced addresses.
    Resolved,

    /// All upstreams failed during the last resolution.
    Failed,

    /// The last resolution said that the host has no addresses.
    EmptyAnswer,
}

impl fmt::Display for HostState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            HostState::Unresolved => "unresolved",
            HostState::Resolving => "resolving",
            HostState::Resolved => "resolved",
            HostState::Failed => "failed",
            HostState::EmptyAnswer => "empty answer",
        })
    }
}

//------------ HostEntry -----------------------------------------------------

/// The cached information about a single host name.
#[derive(Clone, Debug)]
pub struct HostEntry {
    /// The generation of this entry.
    generation: u64,

    /// The current state.
    state: HostState,

    /// The IPv4 addresses last learned.
    v4: Vec<IpAddr>,

    /// The IPv6 addresses last learned.
    v6: Vec<IpAddr>,

    /// The TTL of the last definitive answer.
    ttl: Option<Duration>,

    /// When the host should be resolved again.
    next_refresh: Instant,

    /// Whether the last resolution failed for both families.
    last_resolution_failed: bool,
}

impl HostEntry {
    fn new(generation: u64, now: Instant) -> Self {
        HostEntry {
            generation,
            state: HostState::Unresolved,
            v4: Vec::new(),
            v6: Vec::new(),
            ttl: None,
            next_refresh: now,
            last_resolution_failed: false,
        }
    }

    /// Returns the generation of the entry.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the current state.
    pub fn state(&self) -> HostState {
        self.state
    }

    /// Returns an iterator over all addresses, IPv4 first.
    pub fn addrs(&self) -> impl Iterator<Item = IpAddr> + '_ {
        self.v4.iter().chain(self.v6.iter()).copied()
    }

    /// Returns whether the entry has no addresses.
    pub fn is_empty(&self) -> bool {
        self.v4.is_empty() && self.v6.is_empty()
    }

    /// Returns the TTL of the last definitive answer, if there was one.
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Returns when the host is due for resolution.
    pub fn next_refresh(&self) -> Instant {
        self.next_refresh
    }

    /// Returns whether the last resolution failed for both families.
    pub fn last_resolution_failed(&self) -> bool {
        self.last_resolution_failed
    }
}

//------------ Reconciled ----------------------------------------------------

/// The changes made to the cache by [`HostCache::reconcile`].
#[derive(Clone, Debug, Default)]
pub struct Reconciled {
    /// The hosts added and the generation of their new entry.
    pub added: Vec<(Dname, u64)>,

    /// The hosts removed.
    pub evicted: Vec<Dname>,
}

//------------ HostCache -----------------------------------------------------

/// The cache of all referenced host names.
#[derive(Clone, Debug)]
pub struct HostCache {
    /// The entries by host name.
    entries: HashMap<Dname, HostEntry>,

    /// The generation of the next new entry.
    next_generation: u64,

    /// The lower bound for the TTL of definitive answers.
    min_ttl: Duration,

    /// The time until a failed resolution is retried.
    failure_backoff: Duration,
}

impl HostCache {
    /// Creates a new, empty cache.
    pub fn new(min_ttl: Duration, failure_backoff: Duration) -> Self {
        HostCache {
            entries: HashMap::new(),
            next_generation: 0,
            min_ttl,
            failure_backoff,
        }
    }

    /// Returns the entry for a host.
    pub fn get(&self, host: &Dname) -> Option<&HostEntry> {
        self.entries.get(host)
    }

    /// Returns the number of hosts in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the addresses of a host.
    ///
    /// Unknown hosts have no addresses.
    pub fn addrs<'a>(
        &'a self,
        host: &Dname,
    ) -> impl Iterator<Item = IpAddr> + 'a {
        self.entries.get(host).into_iter().flat_map(HostEntry::addrs)
    }

    /// Makes the cache contain exactly the hosts in `wanted`.
    ///
    /// New hosts get an entry that is due for resolution immediately. Hosts
    /// no longer wanted are dropped together with everything known about
    /// them.
    pub fn reconcile(
        &mut self,
        wanted: &BTreeSet<Dname>,
        now: Instant,
    ) -> Reconciled {
        let mut res = Reconciled::default();
        self.entries.retain(|host, _| {
            let keep = wanted.contains(host);
            if !keep {
                res.evicted.push(host.clone());
            }
            keep
        });
        for host in wanted {
            if self.entries.contains_key(host) {
                continue;
            }
            let generation = self.next_generation;
            self.next_generation += 1;
            self.entries
                .insert(host.clone(), HostEntry::new(generation, now));
            res.added.push((host.clone(), generation));
        }
        res
    }

    /// Returns the deadline of an entry if it still has the generation.
    pub fn deadline(&self, host: &Dname, generation: u64) -> Option<Instant> {
        self.current(host, generation).map(HostEntry::next_refresh)
    }

    /// Marks the start of a resolution.
    ///
    /// Returns `false` if there is no entry of this generation anymore.
    pub fn begin(&mut self, host: &Dname, generation: u64) -> bool {
        match self.current_mut(host, generation) {
            Some(entry) => {
                entry.state = HostState::Resolving;
                true
            }
            None => false,
        }
    }

    /// Records the answer of a resolution.
    ///
    /// For each address family, found addresses replace the cached ones,
    /// an empty answer clears them, and a failure keeps them. The next
    /// refresh is due after the TTL of the answer but no earlier than the
    /// minimum TTL. If any family failed, it is due after the failure
    /// backoff at the latest.
    ///
    /// Returns `false` and leaves the cache alone if there is no entry of
    /// this generation anymore.
    pub fn complete(
        &mut self,
        host: &Dname,
        generation: u64,
        answer: HostAnswer,
        now: Instant,
    ) -> bool {
        let min_ttl = self.min_ttl;
        let failure_backoff = self.failure_backoff;
        let entry = match self.current_mut(host, generation) {
            Some(entry) => entry,
            None => {
                debug!(host = %host, generation, "discarding late answer");
                return false;
            }
        };

        let failed = answer.is_failed();
        let partial = answer.is_partial_failure();
        let ttl = answer.ttl().map(|ttl| ttl.into_duration());
        update_family(&mut entry.v4, answer.v4);
        update_family(&mut entry.v6, answer.v6);

        let delay = if failed {
            failure_backoff
        } else {
            let delay = cmp::max(ttl.unwrap_or_default(), min_ttl);
            if partial {
                cmp::min(delay, failure_backoff)
            } else {
                delay
            }
        };
        if ttl.is_some() {
            entry.ttl = ttl;
        }
        entry.next_refresh = now + delay;
        entry.last_resolution_failed = failed;
        entry.state = if failed {
            HostState::Failed
        } else if entry.is_empty() {
            HostState::EmptyAnswer
        } else {
            HostState::Resolved
        };
        debug!(
            host = %host,
            state = %entry.state,
            addrs = entry.v4.len() + entry.v6.len(),
            "next refresh in {delay:?}"
        );
        true
    }

    /// Returns the entry for a host if it has the given generation.
    fn current(&self, host: &Dname, generation: u64) -> Option<&HostEntry> {
        self.entries
            .get(host)
            .filter(|entry| entry.generation == generation)
    }

    /// Returns the entry for a host if it has the given generation.
    fn current_mut(
        &mut self,
        host: &Dname,
        generation: u64,
    ) -> Option<&mut HostEntry> {
        self.entries
            .get_mut(host)
            .filter(|entry| entry.generation == generation)
    }
}

/// Applies the lookup of one family to the cached addresses.
fn update_family(addrs: &mut Vec<IpAddr>, lookup: Lookup) {
    match lookup {
        Lookup::Found { addrs: found, .. } => *addrs = found,
        Lookup::Empty { .. } => addrs.clear(),
        Lookup::Failed => {}
    }
}

//============ Testing =======================================================
