//! Resolving gateways against fake upstream servers on the loopback.

mod common;

use common::init_logging;
use gateway_resolv::base::{Class, Dname, Message, MessageBuilder, Rcode};
use gateway_resolv::base::{Record, Rtype, Ttl};
use gateway_resolv::gateway::{
    GatewayConf, HostState, MeshNetworks, Network, NetworkManager,
    NetworksWatcher,
};
use parking_lot::Mutex;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};

const GATEWAY_HOST: &str = "gw.nw0.test";

//------------ FakeServer ----------------------------------------------------

/// How a fake server answers.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Mode {
    /// Answer with the current addresses.
    Answer,

    /// Answer NOERROR without any records.
    Empty,

    /// Answer SERVFAIL.
    ServFail,
}

#[derive(Debug)]
struct ServerState {
    mode: Mode,
    v4: Ipv4Addr,
    v6: Ipv6Addr,
    seen: Vec<Rtype>,
}

/// A UDP DNS server answering from shared state.
///
/// All answers have a TTL of zero so the configured minimum TTL decides how
/// often the manager comes back.
#[derive(Clone, Debug)]
struct FakeServer {
    addr: SocketAddr,
    state: Arc<Mutex<ServerState>>,
}

impl FakeServer {
    async fn start(mode: Mode) -> Self {
        let sock = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let server = FakeServer {
            addr: sock.local_addr().unwrap(),
            state: Arc::new(Mutex::new(ServerState {
                mode,
                v4: Ipv4Addr::new(10, 0, 0, 1),
                v6: Ipv6Addr::from_str("fd00::1").unwrap(),
                seen: Vec::new(),
            })),
        };
        tokio::spawn(server.clone().run(sock));
        server
    }

    async fn run(self, sock: UdpSocket) {
        let mut buf = vec![0; 2000];
        loop {
            let (len, peer) = match sock.recv_from(&mut buf).await {
                Ok(some) => some,
                Err(_) => return,
            };
            let query = match Message::from_slice(&buf[..len]) {
                Ok(query) => query,
                Err(_) => continue,
            };
            let response = self.respond(&query);
            let _ = sock.send_to(&response, peer).await;
        }
    }

    fn respond(&self, query: &Message) -> Vec<u8> {
        let mut state = self.state.lock();
        let question = query.first_question().unwrap().clone();
        state.seen.push(question.qtype());

        let rcode = match state.mode {
            _ if !question.qtype().is_address() => Rcode::REFUSED,
            Mode::ServFail => Rcode::SERVFAIL,
            Mode::Answer | Mode::Empty => Rcode::NOERROR,
        };
        let mut answer =
            MessageBuilder::new_vec().start_answer(query, rcode).unwrap();
        if rcode == Rcode::NOERROR && state.mode == Mode::Answer {
            let addr = if question.qtype() == Rtype::A {
                IpAddr::V4(state.v4)
            } else {
                IpAddr::V6(state.v6)
            };
            answer
                .push(Record::new(
                    question.qname().clone(),
                    Class::IN,
                    Ttl::ZERO,
                    addr,
                ))
                .unwrap();
        }
        answer.finish()
    }

    fn set_mode(&self, mode: Mode) {
        self.state.lock().mode = mode;
    }

    fn set_v4(&self, addr: Ipv4Addr) {
        self.state.lock().v4 = addr;
    }

    fn seen(&self) -> Vec<Rtype> {
        self.state.lock().seen.clone()
    }
}

//------------ Helpers -------------------------------------------------------

fn conf(servers: Vec<SocketAddr>) -> GatewayConf {
    let mut conf = GatewayConf::with_servers(servers);
    conf.set_min_ttl(Duration::from_millis(50));
    conf.set_failure_backoff(Duration::from_millis(20));
    conf.set_query_timeout(Duration::from_millis(200));
    conf.set_udp_attempts(1);
    conf
}

fn one_network() -> MeshNetworks {
    MeshNetworks::new().with_network(
        "nw0",
        Network::default().with_gateway(GATEWAY_HOST, 15443),
    )
}

fn two_networks() -> MeshNetworks {
    one_network().with_network(
        "nw1",
        Network::default().with_gateway("10.1.0.1", 80),
    )
}

fn gateway_addrs(manager: &NetworkManager) -> Vec<IpAddr> {
    manager.all_gateways().iter().map(|gw| gw.addr()).collect()
}

/// Returns how many notifications have arrived since the last call.
fn notifications(rx: &mut mpsc::UnboundedReceiver<()>) -> usize {
    let mut count = 0;
    while rx.try_recv().is_ok() {
        count += 1;
    }
    count
}

/// Waits until `cond` becomes true, panicking after ten seconds.
async fn wait_for(what: &str, mut cond: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(10);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        sleep(Duration::from_millis(10)).await;
    }
}

//------------ Tests ---------------------------------------------------------

#[tokio::test]
async fn gateways_follow_dns() {
    init_logging();
    let failing = FakeServer::start(Mode::ServFail).await;
    let server = FakeServer::start(Mode::Answer).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let manager =
        NetworkManager::new(conf(vec![failing.addr, server.addr]), tx);

    manager.apply_config(one_network());
    assert!(manager.is_multi_network_enabled());
    let initial: Vec<IpAddr> = vec![
        Ipv4Addr::new(10, 0, 0, 1).into(),
        Ipv6Addr::from_str("fd00::1").unwrap().into(),
    ];
    wait_for("initial gateways", || gateway_addrs(&manager) == initial).await;
    assert!(manager
        .all_gateways()
        .iter()
        .all(|gw| gw.network() == "nw0" && gw.port() == 15443));
    assert!(notifications(&mut rx) >= 1);

    // A failing upstream keeps the gateways we have.
    server.set_mode(Mode::ServFail);
    let host = Dname::from_str(GATEWAY_HOST).unwrap();
    wait_for("failure", || {
        manager.host_state(&host) == Some(HostState::Failed)
    })
    .await;
    assert_eq!(gateway_addrs(&manager), initial);
    assert_eq!(notifications(&mut rx), 0);

    // Recovery with a new address.
    server.set_v4(Ipv4Addr::new(10, 0, 0, 2));
    server.set_mode(Mode::Answer);
    wait_for("new address", || {
        gateway_addrs(&manager).contains(&Ipv4Addr::new(10, 0, 0, 2).into())
    })
    .await;
    assert_eq!(gateway_addrs(&manager).len(), 2);
    assert!(notifications(&mut rx) >= 1);

    // An empty answer removes the gateways but not multi-network mode.
    server.set_mode(Mode::Empty);
    wait_for("empty answer", || {
        manager.host_state(&host) == Some(HostState::EmptyAnswer)
    })
    .await;
    assert!(manager.all_gateways().is_empty());
    assert!(manager.is_multi_network_enabled());

    server.set_mode(Mode::Answer);
    wait_for("gateways back", || gateway_addrs(&manager).len() == 2).await;
    notifications(&mut rx);

    // Dropping the configuration drops the gateways.
    manager.apply_config(MeshNetworks::new());
    assert!(manager.all_gateways().is_empty());
    assert!(!manager.is_multi_network_enabled());
    assert_eq!(manager.host_state(&host), None);
    assert_eq!(notifications(&mut rx), 1);

    manager.shutdown().await;

    // Only ever A and AAAA, and always the first server first.
    for seen in [failing.seen(), server.seen()] {
        assert!(seen.iter().all(|rtype| rtype.is_address()));
    }
    assert!(failing.seen().len() >= server.seen().len());
}

#[tokio::test]
async fn configuration_from_watcher() {
    init_logging();
    let server = FakeServer::start(Mode::Answer).await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let manager = NetworkManager::new(conf(vec![server.addr]), tx);
    let watcher = NetworksWatcher::default();
    manager.watch(watcher.subscribe());
    assert!(!manager.is_multi_network_enabled());

    watcher.set_networks(two_networks());
    wait_for("both networks", || {
        manager.gateways_by_network().values().map(Vec::len).eq([2, 1])
    })
    .await;
    assert_eq!(manager.gateways_for_network("nw1").len(), 1);
    assert_eq!(manager.snapshot().len(), 3);
    assert!(notifications(&mut rx) >= 1);

    watcher.set_networks(MeshNetworks::new());
    wait_for("no networks", || !manager.is_multi_network_enabled()).await;
    assert!(manager.all_gateways().is_empty());
    manager.shutdown().await;
}

#[test]
fn no_servers_fail_soft() {
    init_logging();
    tokio_test::block_on(async {
        let manager = NetworkManager::new(GatewayConf::new(), || {});
        manager.apply_config(two_networks());
        let host = Dname::from_str(GATEWAY_HOST).unwrap();
        wait_for("failure", || {
            manager.host_state(&host) == Some(HostState::Failed)
        })
        .await;
        assert_eq!(
            gateway_addrs(&manager),
            [IpAddr::from(Ipv4Addr::new(10, 1, 0, 1))]
        );
        assert!(manager.is_multi_network_enabled());
        manager.shutdown().await;
    });
}
