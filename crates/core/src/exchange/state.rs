//! Engine lifecycle states

use oidcflow_domain::impl_protocol_value_conversions;

/// Where a [`super::TokenExchangeEngine`] is in its exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    #[default]
    Idle,
    AwaitingRedirect,
    ExchangingCode,
    ExchangingRefresh,
    AwaitingDeviceChallenge,
    SettledSuccess,
    SettledError,
}

impl_protocol_value_conversions!(EngineState {
    Idle => "idle",
    AwaitingRedirect => "awaiting_redirect",
    ExchangingCode => "exchanging_code",
    ExchangingRefresh => "exchanging_refresh",
    AwaitingDeviceChallenge => "awaiting_device_challenge",
    SettledSuccess => "settled_success",
    SettledError => "settled_error",
});

impl EngineState {
    pub fn is_settled(self) -> bool {
        matches!(self, Self::SettledSuccess | Self::SettledError)
    }
}
