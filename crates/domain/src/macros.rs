//! Macro for implementing Display and FromStr for protocol value enums
//!
//! Several protocol values travel as short lowercase strings (identifier
//! kinds, engine states in telemetry). This macro gives each such enum a
//! single mapping used in both directions, with case-insensitive parsing.
//!
//! # Example
//!
//! ```rust
//! use oidcflow_domain::impl_protocol_value_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Prompt {
//!     Login,
//!     Consent,
//! }
//!
//! impl_protocol_value_conversions!(Prompt {
//!     Login => "login",
//!     Consent => "consent",
//! });
//!
//! assert_eq!(Prompt::Consent.to_string(), "consent");
//! assert_eq!("LOGIN".parse::<Prompt>(), Ok(Prompt::Login));
//! ```

/// Implements Display and FromStr traits for protocol value enums
///
/// This macro generates:
/// - Display trait: converts enum variants to their wire strings
/// - FromStr trait: parses case-insensitive strings to enum variants
#[macro_export]
macro_rules! impl_protocol_value_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum GrantKind {
        AuthorizationCode,
        RefreshToken,
    }

    impl_protocol_value_conversions!(GrantKind {
        AuthorizationCode => "authorization_code",
        RefreshToken => "refresh_token",
    });

    #[test]
    fn test_display_conversion() {
        assert_eq!(GrantKind::AuthorizationCode.to_string(), "authorization_code");
        assert_eq!(GrantKind::RefreshToken.to_string(), "refresh_token");
    }

    #[test]
    fn test_fromstr_mixed_case() {
        assert_eq!(GrantKind::from_str("Refresh_Token").unwrap(), GrantKind::RefreshToken);
        assert_eq!(
            GrantKind::from_str("AUTHORIZATION_CODE").unwrap(),
            GrantKind::AuthorizationCode
        );
    }

    #[test]
    fn test_fromstr_invalid() {
        let result = GrantKind::from_str("implicit");
        assert!(result.unwrap_err().contains("Invalid GrantKind: implicit"));
        assert!(GrantKind::from_str("").is_err());
    }
}
