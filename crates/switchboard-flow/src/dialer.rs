//! Outbound-call trigger abstraction.

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

/// Errors reported by an outbound-call collaborator.
#[derive(Debug, Error)]
pub enum DialError {
    /// The telephony API rejected the request.
    #[error("telephony api error: {0}")]
    Api(String),

    /// The telephony API could not be reached.
    #[error("telephony transport error: {0}")]
    Transport(String),
}

/// An outbound-call collaborator.
///
/// `place_call` starts dialing and returns the new call-leg id immediately;
/// progress (`ringing`, `answered`, `busy`, ...) arrives later through
/// dial-status callbacks fed to
/// [`FlowEngine::handle_dial_status`](crate::FlowEngine::handle_dial_status).
pub trait Dialer: Send + Sync {
    /// Places a call to `to_number` on behalf of a session.
    fn place_call<'a>(
        &'a self,
        to_number: &'a str,
        session_id: &'a str,
        caller_name: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, DialError>> + Send + 'a>>;
}
