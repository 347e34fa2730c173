//! Macro for implementing Display and FromStr for state enums
//!
//! Session states and failure kinds are logged and occasionally parsed back
//! from configuration or diagnostics, so they share one string mapping.
//!
//! # Example
//!
//! ```rust
//! use dealroom_domain::impl_domain_status_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Phase {
//!     Idle,
//!     Refreshing,
//! }
//!
//! impl_domain_status_conversions!(Phase {
//!     Idle => "idle",
//!     Refreshing => "refreshing",
//! });
//!
//! assert_eq!(Phase::Refreshing.to_string(), "refreshing");
//! ```

/// Implements Display and FromStr traits for state enums
///
/// This macro generates:
/// - Display trait: converts enum variants to lowercase strings
/// - FromStr trait: parses case-insensitive strings to enum variants
#[macro_export]
macro_rules! impl_domain_status_conversions {
    ($enum_name:ident { $($variant:ident => $str:expr),+ $(,)? }) => {
        impl std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $str),)+
                }
            }
        }

        impl std::str::FromStr for $enum_name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => Ok(Self::$variant),)+
                    _ => Err(format!("Invalid {}: {}", stringify!($enum_name), s)),
                }
            }
        }
    };
}
