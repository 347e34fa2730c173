//! Infrastructure implementations of the session ports
//!
//! - [`CookieCredentialStore`]: in-memory cookie jar holding session markers
//! - [`HttpSessionRefresher`]: identity-provider refresh and sign-out calls
//! - [`ConfiguredDomainResolver`]: cookie domain from config or the API host

mod cookie_store;
mod domain_resolver;
mod refresher;

pub use cookie_store::CookieCredentialStore;
pub use domain_resolver::ConfiguredDomainResolver;
pub use refresher::HttpSessionRefresher;
