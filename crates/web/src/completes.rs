//! Immediate or eventual responses.
//!
//! A route function returns [`Completes::Ready`] when it has the response at hand. When the
//! response is produced later, for example by a spawned task, it returns the [`Completes`] half of
//! [`Completes::deferred`] and moves the [`Completer`] to whoever will finish the work.
//!
//! ```
//! use http::StatusCode;
//! use stepwise_http::protocol::Response;
//! use stepwise_web::completes::Completes;
//!
//! # async fn run() {
//! let (completes, completer) = Completes::deferred();
//! tokio::spawn(async move {
//!     completer.with(Response::of(StatusCode::ACCEPTED));
//! });
//! assert_eq!(completes.outcome().await.unwrap().status(), StatusCode::ACCEPTED);
//! # }
//! ```

use stepwise_http::protocol::Response;
use tokio::sync::oneshot;
use tracing::debug;

#[derive(Debug)]
pub enum Completes {
    Ready(Response),
    Deferred(Deferred),
}

impl Completes {
    pub fn with(response: Response) -> Self {
        Completes::Ready(response)
    }

    /// A pending outcome and the single completer able to fulfil it.
    pub fn deferred() -> (Self, Completer) {
        let (sender, receiver) = oneshot::channel();
        (Completes::Deferred(Deferred { receiver }), Completer { sender })
    }

    /// The response, or `None` if the completer was dropped without one.
    pub async fn outcome(self) -> Option<Response> {
        match self {
            Completes::Ready(response) => Some(response),
            Completes::Deferred(deferred) => deferred.receiver.await.ok(),
        }
    }
}

impl From<Response> for Completes {
    fn from(response: Response) -> Self {
        Completes::Ready(response)
    }
}

#[derive(Debug)]
pub struct Deferred {
    receiver: oneshot::Receiver<Response>,
}

#[derive(Debug)]
pub struct Completer {
    sender: oneshot::Sender<Response>,
}

impl Completer {
    /// Delivers the response; returns false if nobody waits for it any more.
    pub fn with(self, response: Response) -> bool {
        match self.sender.send(response) {
            Ok(()) => true,
            Err(response) => {
                debug!(status = %response.status(), "requester is gone, response discarded");
                false
            }
        }
    }

    /// Returns true once the waiting side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    #[tokio::test]
    async fn ready() {
        let completes = Completes::from(Response::of(StatusCode::OK));
        assert_eq!(completes.outcome().await.unwrap().status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn deferred_completes_later() {
        let (completes, completer) = Completes::deferred();

        let task = tokio::spawn(async move {
            tokio::task::yield_now().await;
            completer.with(Response::with_body(StatusCode::CREATED, "done"))
        });

        let response = completes.outcome().await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(task.await.unwrap());
    }

    #[tokio::test]
    async fn dropped_completer_yields_nothing() {
        let (completes, completer) = Completes::deferred();
        drop(completer);
        assert!(completes.outcome().await.is_none());
    }

    #[test]
    fn response_without_requester_is_discarded() {
        let (completes, completer) = Completes::deferred();
        drop(completes);
        assert!(completer.is_closed());
        assert!(!completer.with(Response::of(StatusCode::OK)));
    }
}
