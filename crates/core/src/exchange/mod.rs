//! Token exchange orchestration
//!
//! The engine composes two independent single-shot policies around a bare
//! POST: [`policies::TimeoutRetry`] and [`policies::DeviceChallengeLayer`].

mod events;

pub mod engine;
pub mod policies;
pub mod state;

pub use engine::{ExchangeSettings, TokenExchangeEngine};
pub use policies::{AttemptError, DeviceChallengeLayer, OneShot, TimeoutRetry, TransientFailure};
pub use state::EngineState;
