//! A pool of upstream resolvers tried in order.
//!
//! The pool asks its upstreams one after another, always starting with the
//! first one, and stops at the first response that settles the question.
//! A response settles the question if it carries the requested addresses or
//! if it says that there are none: NXDOMAIN, or NOERROR without records of
//! the requested type. Everything else, be it a transport error, a timeout,
//! or a response with any other rcode, only means that this particular
//! upstream couldn’t help and the next one is asked.
//!
//! Only A and AAAA questions are ever sent. Some public resolvers refuse
//! ANY queries, so the two families are looked up separately, concurrently,
//! and merged into a single [`HostAnswer`].

use crate::base::{Dname, Message, Question, Rcode, Rtype, Ttl};
use super::resolve::{HostAnswer, Lookup, ResolveFuture, ResolveHost};
use crate::net::client::error::Error;
use crate::net::client::request::SendQuery;
use futures_util::future::join;
use tracing::{debug, trace, warn};

//------------ Pool ----------------------------------------------------------

/// An ordered list of upstream resolvers.
///
/// The pool itself holds no state besides its upstreams and can be shared
/// freely between tasks.
#[derive(Clone, Debug)]
pub struct Pool<C> {
    /// The upstreams in order of preference.
    upstreams: Vec<C>,
}

impl<C> Pool<C> {
    /// Creates a new pool from a list of upstreams.
    pub fn new(upstreams: Vec<C>) -> Self {
        Pool { upstreams }
    }

    /// Returns the upstreams of the pool.
    pub fn upstreams(&self) -> &[C] {
        &self.upstreams
    }

    /// Returns whether the pool has no upstreams.
    pub fn is_empty(&self) -> bool {
        self.upstreams.is_empty()
    }
}

impl<C: SendQuery> Pool<C> {
    /// Looks up records of type `rtype` for `qname`.
    ///
    /// `rtype` should be one of [`Rtype::A`] or [`Rtype::AAAA`].
    pub async fn query(&self, qname: &Dname, rtype: Rtype) -> Lookup {
        if self.upstreams.is_empty() {
            warn!(host = %qname, %rtype, "{}", Error::NoTransportAvailable);
            return Lookup::Failed;
        }
        let question = Question::new_in(qname.clone(), rtype);
        for (index, upstream) in self.upstreams.iter().enumerate() {
            match upstream.send_query(&question).await {
                Ok(answer) => match classify(&answer, rtype) {
                    Some(lookup) => {
                        trace!(
                            host = %qname, %rtype, server = ?upstream,
                            "{lookup}"
                        );
                        return lookup;
                    }
                    None => {
                        debug!(
                            host = %qname, %rtype, server = ?upstream,
                            rcode = %answer.header().rcode(),
                            "upstream {index} gave no answer, trying next"
                        );
                    }
                },
                Err(err) => {
                    debug!(
                        host = %qname, %rtype, server = ?upstream,
                        "upstream {index} failed: {err}"
                    );
                }
            }
        }
        warn!(host = %qname, %rtype, "all upstream resolvers failed");
        Lookup::Failed
    }

    /// Looks up both the IPv4 and IPv6 addresses of `qname`.
    pub async fn lookup_host(&self, qname: &Dname) -> HostAnswer {
        let (v4, v6) =
            join(self.query(qname, Rtype::A), self.query(qname, Rtype::AAAA))
                .await;
        HostAnswer::new(v4, v6)
    }
}

impl<C: SendQuery> ResolveHost for Pool<C> {
    fn resolve_host<'a>(&'a self, host: &'a Dname) -> ResolveFuture<'a> {
        Box::pin(self.lookup_host(host))
    }
}

/// Decides what a response means for a query of type `rtype`.
///
/// Returns `None` if the response doesn’t settle the question and the next
/// upstream should be asked.
fn classify(answer: &Message, rtype: Rtype) -> Option<Lookup> {
    let rcode = answer.header().rcode();
    if !rcode.is_definitive() {
        return None;
    }
    if rcode == Rcode::NXDOMAIN {
        return Some(Lookup::Empty {
            ttl: answer.negative_ttl().unwrap_or(Ttl::ZERO),
        });
    }
    let (addrs, ttl) = answer.answer_addrs(rtype);
    match ttl {
        Some(ttl) => Some(Lookup::Found { addrs, ttl }),
        // A truncated response may simply have lost its records.
        None if answer.header().tc() => None,
        None => Some(Lookup::Empty {
            ttl: answer.negative_ttl().unwrap_or(Ttl::ZERO),
        }),
    }
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::base::{Class, MessageBuilder, Record};
    use crate::net::client::request::{build_query, QueryResult};
    use crate::rdata::{RecordData, Soa};
    use parking_lot::Mutex;
    use std::net::IpAddr;
    use std::str::FromStr;
    use std::sync::Arc;

    /// What a mock upstream does with a query.
    #[derive(Clone, Debug)]
    enum Behavior {
        Fail,
        Rcode(Rcode),
        Truncated,
        Answer(Vec<IpAddr>, u32),
        NoDataWithSoa(u32, u32),
    }

    type Seen = Arc<Mutex<Vec<Rtype>>>;

    #[derive(Debug)]
    struct MockUpstream {
        behavior: Behavior,
        queries: Seen,
    }

    impl MockUpstream {
        fn new(behavior: Behavior) -> (Self, Seen) {
            let queries = Seen::default();
            let upstream = MockUpstream {
                behavior,
                queries: queries.clone(),
            };
            (upstream, queries)
        }

        fn respond(&self, question: &Question) -> Result<Message, Error> {
            let query = build_query(question)?;
            let rcode = match self.behavior {
                Behavior::Fail => return Err(Error::UdpTimeoutNoResponse),
                Behavior::Rcode(rcode) => rcode,
                _ => Rcode::NOERROR,
            };
            let mut answer =
                MessageBuilder::new_vec().start_answer(&query, rcode)?;
            match self.behavior {
                Behavior::Answer(ref addrs, ttl) => {
                    for addr in addrs {
                        let data = RecordData::from(*addr);
                        if data.rtype() == question.qtype() {
                            answer.push(Record::new(
                                question.qname().clone(),
                                Class::IN,
                                Ttl::from_secs(ttl),
                                data,
                            ))?;
                        }
                    }
                }
                Behavior::Truncated => answer.header_mut().set_tc(true),
                Behavior::NoDataWithSoa(ttl, minimum) => {
                    let mut authority = answer.authority();
                    authority.push(Record::new(
                        Dname::from_str("example").unwrap(),
                        Class::IN,
                        Ttl::from_secs(ttl),
                        Soa::new(
                            Dname::from_str("ns.example").unwrap(),
                            Dname::from_str("admin.example").unwrap(),
                            1,
                            Ttl::from_secs(3600),
                            Ttl::from_secs(600),
                            Ttl::from_secs(86400),
                            Ttl::from_secs(minimum),
                        ),
                    ))?;
                    return Ok(authority.into_message());
                }
                _ => {}
            }
            Ok(answer.into_message())
        }
    }

    impl SendQuery for MockUpstream {
        fn send_query<'a>(
            &'a self,
            question: &'a Question,
        ) -> QueryResult<'a> {
            self.queries.lock().push(question.qtype());
            let res = self.respond(question);
            Box::pin(async move { res })
        }
    }

    fn host() -> Dname {
        Dname::from_str("gw.example").unwrap()
    }

    fn addrs() -> Vec<IpAddr> {
        vec![IpAddr::from([10, 0, 0, 1]), "fd00::1".parse().unwrap()]
    }

    #[tokio::test]
    async fn falls_back_on_failure() {
        let (first, first_count) = MockUpstream::new(Behavior::Fail);
        let (second, second_count) =
            MockUpstream::new(Behavior::Rcode(Rcode::SERVFAIL));
        let (third, _) = MockUpstream::new(Behavior::Answer(addrs(), 60));
        let pool = Pool::new(vec![first, second, third]);

        let answer = pool.lookup_host(&host()).await;
        assert_eq!(
            answer,
            HostAnswer::new(
                Lookup::Found {
                    addrs: vec![IpAddr::from([10, 0, 0, 1])],
                    ttl: Ttl::from_secs(60)
                },
                Lookup::Found {
                    addrs: vec!["fd00::1".parse().unwrap()],
                    ttl: Ttl::from_secs(60)
                },
            )
        );
        assert_eq!(first_count.lock().len(), 2);
        assert_eq!(second_count.lock().len(), 2);
    }

    #[tokio::test]
    async fn empty_answer_is_authoritative() {
        for behavior in [
            Behavior::Rcode(Rcode::NXDOMAIN),
            Behavior::Answer(Vec::new(), 60),
        ] {
            let (first, _) = MockUpstream::new(behavior);
            let (second, second_count) =
                MockUpstream::new(Behavior::Answer(addrs(), 60));
            let pool = Pool::new(vec![first, second]);
            assert_eq!(
                pool.lookup_host(&host()).await,
                HostAnswer::empty(Ttl::ZERO)
            );
            assert!(second_count.lock().is_empty());
        }
    }

    #[tokio::test]
    async fn negative_ttl_from_soa() {
        let (upstream, _) = MockUpstream::new(Behavior::NoDataWithSoa(900, 120));
        let pool = Pool::new(vec![upstream]);
        assert_eq!(
            pool.query(&host(), Rtype::A).await,
            Lookup::Empty {
                ttl: Ttl::from_secs(120)
            }
        );
    }

    #[tokio::test]
    async fn exhaustion_fails() {
        let (first, _) = MockUpstream::new(Behavior::Rcode(Rcode::REFUSED));
        let (second, _) = MockUpstream::new(Behavior::Truncated);
        let pool = Pool::new(vec![first, second]);
        assert!(pool.lookup_host(&host()).await.is_failed());

        let pool: Pool<MockUpstream> = Pool::new(Vec::new());
        assert!(pool.is_empty());
        assert_eq!(pool.query(&host(), Rtype::A).await, Lookup::Failed);
    }

    #[tokio::test]
    async fn never_sends_any() {
        let (upstream, seen) =
            MockUpstream::new(Behavior::Answer(addrs(), 60));
        let pool = Pool::new(vec![upstream]);
        pool.lookup_host(&host()).await;
        let mut seen = seen.lock().clone();
        seen.sort();
        assert_eq!(seen, [Rtype::A, Rtype::AAAA]);
    }
}
