//! Single-shot retry policies layered on a bare "send once" operation
//!
//! [`TimeoutRetry`] repeats an attempt once after a transient failure; the
//! caller decides which request the repeat sends.
//! [`DeviceChallengeLayer`] reissues one POST with a PKeyAuth response when
//! the server answers 401 with a device challenge. Each wraps a closure, so
//! they compose in either order and are tested on their own.

use std::thread;
use std::time::Duration;

use oidcflow_domain::constants::pkeyauth;
use tracing::{debug, warn};

use crate::challenge::{is_pkeyauth_challenge, ChallengeResponder};
use crate::error::{AuthError, AuthResult};
use crate::transport_ports::{HttpResponse, PostRequest, TransportError};

/// A budget that can be spent exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OneShot {
    available: bool,
}

impl Default for OneShot {
    fn default() -> Self {
        Self { available: true }
    }
}

impl OneShot {
    /// Spend the budget. Returns `false` if it was already spent.
    pub fn take(&mut self) -> bool {
        std::mem::replace(&mut self.available, false)
    }

    pub fn is_spent(&self) -> bool {
        !self.available
    }
}

/// Failure that may succeed if the identical request is sent again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransientFailure {
    Timeout(String),
    ServerStatus { status: u16, body: String },
}

impl TransientFailure {
    /// Terminal error once no retry is left.
    pub fn into_error(self, extended_lifetime: bool) -> AuthError {
        let (status, message) = match self {
            Self::Timeout(message) => (None, message),
            Self::ServerStatus { status, body } => (Some(status), body),
        };
        if extended_lifetime {
            AuthError::ServerRetryable { status, message }
        } else {
            AuthError::ServerError { status, body: message }
        }
    }
}

/// Outcome of one failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    Transient(TransientFailure),
    Fatal(AuthError),
}

impl From<AuthError> for AttemptError {
    fn from(err: AuthError) -> Self {
        Self::Fatal(err)
    }
}

impl From<TransportError> for AttemptError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(message) => Self::Transient(TransientFailure::Timeout(message)),
            TransportError::Io(message) => Self::Fatal(AuthError::Network(message)),
        }
    }
}

/// Retry a whole attempt once after a transient failure.
///
/// The budget lives as long as the policy, so an engine that owns one gets
/// at most one retry over all of its calls.
#[derive(Debug, Clone)]
pub struct TimeoutRetry {
    budget: OneShot,
    delay: Duration,
}

impl TimeoutRetry {
    pub fn new(delay: Duration) -> Self {
        Self { budget: OneShot::default(), delay }
    }

    pub fn is_spent(&self) -> bool {
        self.budget.is_spent()
    }

    /// Run `attempt` (called with the 1-based attempt number) until it
    /// succeeds, fails fatally, or fails transiently with no budget left.
    ///
    /// # Errors
    /// The fatal error, or the last transient failure converted per
    /// `extended_lifetime`.
    pub fn run<T, F>(&mut self, extended_lifetime: bool, mut attempt: F) -> AuthResult<T>
    where
        F: FnMut(u32) -> Result<T, AttemptError>,
    {
        let mut number = 1;
        loop {
            match attempt(number) {
                Ok(value) => return Ok(value),
                Err(AttemptError::Fatal(err)) => return Err(err),
                Err(AttemptError::Transient(failure)) => {
                    if !self.budget.take() {
                        warn!(attempt = number, "transient failure after retry; giving up");
                        return Err(failure.into_error(extended_lifetime));
                    }
                    warn!(
                        attempt = number,
                        delay_ms = u64::try_from(self.delay.as_millis()).unwrap_or(u64::MAX),
                        "transient failure; retrying once"
                    );
                    if !self.delay.is_zero() {
                        thread::sleep(self.delay);
                    }
                    number += 1;
                }
            }
        }
    }
}

/// Answer one PKeyAuth device challenge by reissuing the POST.
#[derive(Debug, Clone, Copy)]
pub struct DeviceChallengeLayer<'a> {
    responder: &'a ChallengeResponder,
}

impl<'a> DeviceChallengeLayer<'a> {
    pub fn new(responder: &'a ChallengeResponder) -> Self {
        Self { responder }
    }

    /// Send `request` through `send_once` (second argument: whether this is
    /// the challenge-response POST). A 401 carrying a PKeyAuth challenge is
    /// answered once; the second response is returned as-is.
    ///
    /// # Errors
    /// Errors from `send_once`, or [`AuthError::DeviceCertificateRequestInvalid`]
    /// when the challenge cannot be answered.
    pub fn send<F>(&self, request: &PostRequest, mut send_once: F) -> Result<HttpResponse, AttemptError>
    where
        F: FnMut(&PostRequest, bool) -> Result<HttpResponse, AttemptError>,
    {
        let response = send_once(request, false)?;
        if response.status != 401 {
            return Ok(response);
        }

        let challenge = match response.header(pkeyauth::CHALLENGE_REQUEST_HEADER) {
            Some(header) if header.trim().is_empty() => {
                warn!("401 carries a blank challenge header");
                return Ok(response);
            }
            Some(header) if is_pkeyauth_challenge(header) => header.to_string(),
            Some(_) => {
                debug!("401 challenge is not PKeyAuth");
                return Ok(response);
            }
            None => {
                debug!("401 without a challenge header");
                return Ok(response);
            }
        };

        let answer = self.responder.respond(&challenge, &request.url)?;
        let mut answered = request.clone();
        answered
            .headers
            .insert(pkeyauth::CHALLENGE_RESPONSE_HEADER.to_string(), answer.authorization);
        send_once(&answered, true)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use uuid::Uuid;

    use super::*;

    fn request() -> PostRequest {
        PostRequest {
            url: "https://login.example.com/connect/token".into(),
            headers: BTreeMap::new(),
            body: "grant_type=refresh_token".into(),
            content_type: "application/x-www-form-urlencoded".into(),
            correlation_id: Uuid::new_v4(),
        }
    }

    fn timeout() -> AttemptError {
        AttemptError::Transient(TransientFailure::Timeout("read timed out".into()))
    }

    #[test]
    fn one_shot_is_spent_once() {
        let mut shot = OneShot::default();
        assert!(shot.take());
        assert!(!shot.take());
        assert!(shot.is_spent());
    }

    #[test]
    fn single_timeout_then_success() {
        let mut policy = TimeoutRetry::new(Duration::ZERO);
        let mut calls = Vec::new();
        let result = policy.run(false, |n| {
            calls.push(n);
            if n == 1 { Err(timeout()) } else { Ok("ok") }
        });
        assert_eq!(result, Ok("ok"));
        assert_eq!(calls, [1, 2]);
    }

    #[test]
    fn two_timeouts_fail_after_one_retry() {
        let mut policy = TimeoutRetry::new(Duration::ZERO);
        let mut calls = 0;
        let result: AuthResult<()> = policy.run(false, |_| {
            calls += 1;
            Err(timeout())
        });
        assert_eq!(calls, 2);
        assert!(matches!(result, Err(AuthError::ServerError { status: None, .. })));
    }

    #[test]
    fn extended_lifetime_surfaces_retryable() {
        let mut policy = TimeoutRetry::new(Duration::ZERO);
        let result: AuthResult<()> = policy.run(true, |_| {
            Err(AttemptError::Transient(TransientFailure::ServerStatus { status: 503, body: "busy".into() }))
        });
        assert_eq!(
            result,
            Err(AuthError::ServerRetryable { status: Some(503), message: "busy".into() })
        );
    }

    #[test]
    fn budget_is_shared_across_runs() {
        let mut policy = TimeoutRetry::new(Duration::ZERO);
        let _ = policy.run(false, |n| if n == 1 { Err(timeout()) } else { Ok(()) });
        assert!(policy.is_spent());

        let mut calls = 0;
        let result: AuthResult<()> = policy.run(false, |_| {
            calls += 1;
            Err(timeout())
        });
        assert_eq!(calls, 1);
        assert!(result.is_err());
    }

    #[test]
    fn fatal_errors_are_not_retried() {
        let mut policy = TimeoutRetry::new(Duration::ZERO);
        let mut calls = 0;
        let result: AuthResult<()> = policy.run(false, |_| {
            calls += 1;
            Err(TransportError::Io("connection reset".into()).into())
        });
        assert_eq!(calls, 1);
        assert_eq!(result, Err(AuthError::Network("connection reset".into())));
        assert!(!policy.is_spent());
    }

    #[test]
    fn challenge_is_answered_once_and_second_response_wins() {
        let responder = ChallengeResponder::default();
        let layer = DeviceChallengeLayer::new(&responder);
        let challenge = HttpResponse::new(401, "{}").with_header(
            "WWW-Authenticate",
            r#"PKeyAuth nonce="n", Context="ctx", Version="1.0""#,
        );
        let mut seen = Vec::new();

        let response = layer
            .send(&request(), |req, nested| {
                seen.push((nested, req.header("Authorization").map(str::to_string)));
                Ok(if nested { HttpResponse::new(200, "second") } else { challenge.clone() })
            })
            .unwrap();

        assert_eq!(response.body, "second");
        assert_eq!(
            seen,
            [
                (false, None),
                (true, Some(r#"PKeyAuth Context="ctx",Version="1.0""#.to_string())),
            ]
        );
    }

    #[test]
    fn repeated_challenge_is_not_answered_again() {
        let responder = ChallengeResponder::default();
        let layer = DeviceChallengeLayer::new(&responder);
        let challenge = HttpResponse::new(401, "{}").with_header(
            "WWW-Authenticate",
            r#"PKeyAuth nonce="n", Context="ctx", Version="1.0""#,
        );
        let mut calls = 0;
        let response = layer
            .send(&request(), |_, _| {
                calls += 1;
                Ok(challenge.clone())
            })
            .unwrap();
        assert_eq!(calls, 2);
        assert_eq!(response.status, 401);
    }

    #[test]
    fn blank_or_foreign_challenge_falls_through() {
        let responder = ChallengeResponder::default();
        let layer = DeviceChallengeLayer::new(&responder);
        for header in ["  ", "Bearer realm=\"x\""] {
            let mut calls = 0;
            let response = layer
                .send(&request(), |_, _| {
                    calls += 1;
                    Ok(HttpResponse::new(401, "{}").with_header("WWW-Authenticate", header))
                })
                .unwrap();
            assert_eq!(calls, 1);
            assert_eq!(response.status, 401);
        }
    }

    #[test]
    fn malformed_challenge_is_fatal() {
        let responder = ChallengeResponder::default();
        let layer = DeviceChallengeLayer::new(&responder);
        let result = layer.send(&request(), |_, _| {
            Ok(HttpResponse::new(401, "{}").with_header("WWW-Authenticate", "PKeyAuth Context=\"c\""))
        });
        assert!(matches!(
            result,
            Err(AttemptError::Fatal(AuthError::DeviceCertificateRequestInvalid(_)))
        ));
    }
}
