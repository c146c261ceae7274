//! Traits for request/response transports

use std::boxed::Box;
use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::base::{Message, MessageBuilder, Question};
use crate::net::client::error::Error;

/// The result of the future returned by [`SendQuery::send_query`].
pub type QueryResult<'a> =
    Pin<Box<dyn Future<Output = Result<Message, Error>> + Send + 'a>>;

/// Trait for sending a single question to one upstream server.
///
/// Implementations build the query message themselves, so that they can
/// pick a fresh message ID for every attempt, and return the first response
/// that matches it. The response is returned whatever its rcode; judging
/// the content is left to the caller.
pub trait SendQuery: Debug + Send + Sync {
    /// Sends a query for `question` and waits for the response.
    ///
    /// This function is intended to be cancel safe.
    fn send_query<'a>(&'a self, question: &'a Question) -> QueryResult<'a>;
}

impl<T: SendQuery + ?Sized> SendQuery for Arc<T> {
    fn send_query<'a>(&'a self, question: &'a Question) -> QueryResult<'a> {
        (**self).send_query(question)
    }
}

impl<T: SendQuery + ?Sized> SendQuery for Box<T> {
    fn send_query<'a>(&'a self, question: &'a Question) -> QueryResult<'a> {
        (**self).send_query(question)
    }
}

/// Builds a recursive query for `question`.
///
/// The query has a random ID and the RD bit set.
pub fn build_query(question: &Question) -> Result<Message, Error> {
    let mut msg = MessageBuilder::new_vec().question();
    msg.header_mut().set_random_id();
    msg.header_mut().set_rd(true);
    msg.push(question.clone())?;
    Ok(msg.into_message())
}

//============ Testing =======================================================

#[cfg(test)]
mod test {
    use super::*;
    use crate::base::{Dname, Rtype};
    use std::str::FromStr;

    #[test]
    fn query_has_one_question_and_rd() {
        let question = Question::new_in(
            Dname::from_str("gw.example").unwrap(),
            Rtype::AAAA,
        );
        let query = build_query(&question).unwrap();
        assert!(query.header().rd());
        assert!(!query.header().qr());
        assert_eq!(query.header_counts().qdcount(), 1);
        assert_eq!(query.first_question(), Some(&question));
        assert_eq!(query.header_counts().ancount(), 0);
    }
}
