//! Session marker conventions and cookie domain variants
//!
//! Markers are recognised by naming convention rather than by a fixed name,
//! because the identity provider may vary the exact key (it embeds a project
//! reference and may split large values into numbered chunks).

use std::fmt;
use std::sync::Arc;

use crate::session_ports::CookieDomainResolver;

/// Predicate deciding whether a stored credential name is a session marker.
pub trait MarkerPredicate: Send + Sync {
    fn is_session_marker(&self, name: &str) -> bool;
}

impl<F> MarkerPredicate for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn is_session_marker(&self, name: &str) -> bool {
        self(name)
    }
}

/// Prefix + suffix naming convention.
///
/// `sb-` / `-auth-token` matches `sb-abcd-auth-token` as well as its chunks
/// `sb-abcd-auth-token.0`, `sb-abcd-auth-token.1`, ...
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerConvention {
    prefix: String,
    suffix: String,
}

impl MarkerConvention {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), suffix: suffix.into() }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn matches(&self, name: &str) -> bool {
        let stem = strip_chunk_index(name);
        stem.len() >= self.prefix.len() + self.suffix.len()
            && stem.starts_with(&self.prefix)
            && stem.ends_with(&self.suffix)
    }
}

impl MarkerPredicate for MarkerConvention {
    fn is_session_marker(&self, name: &str) -> bool {
        self.matches(name)
    }
}

fn strip_chunk_index(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, index)) if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) => {
            stem
        }
        _ => name,
    }
}

/// Domain a credential is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CookieScope {
    /// `Domain=` attribute value, lowercase and without its leading dot,
    /// e.g. `dealroom.app` or `localhost`
    Domain(String),
    /// Host-only credential, sent back to exactly the host that set it
    Host(String),
    /// Every host-only credential, whichever host set it. Addresses host-only
    /// markers during teardown and is never sent on a request.
    Unscoped,
}

impl CookieScope {
    /// Domain scope from a `Domain=` attribute. `.dealroom.app` and
    /// `dealroom.app` are the same scope. Empty values yield `None`.
    pub fn domain(domain: &str) -> Option<Self> {
        let domain = normalize_domain(domain);
        (!domain.is_empty()).then_some(Self::Domain(domain))
    }

    /// Host-only scope for `host`
    pub fn host(host: &str) -> Self {
        Self::Host(host.trim().to_ascii_lowercase())
    }

    /// Scope of a cookie received from `origin` with an optional `Domain=`
    /// attribute. Without a usable attribute the cookie is host-only.
    pub fn from_attribute(domain: Option<&str>, origin: &str) -> Self {
        domain.and_then(Self::domain).unwrap_or_else(|| Self::host(origin))
    }

    /// Canonical form used for storage and comparison.
    #[must_use]
    pub fn normalized(self) -> Self {
        match self {
            Self::Domain(domain) => Self::Domain(normalize_domain(&domain)),
            Self::Host(host) => Self::host(&host),
            Self::Unscoped => Self::Unscoped,
        }
    }

    /// Whether clearing `self` removes a credential stored under `stored`.
    pub fn covers(&self, stored: &CookieScope) -> bool {
        match (self, stored) {
            (Self::Unscoped, Self::Host(_) | Self::Unscoped) => true,
            (Self::Domain(a), Self::Domain(b)) => normalize_domain(a) == normalize_domain(b),
            (Self::Host(a), Self::Host(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
            _ => false,
        }
    }

    /// Whether a credential with this scope is sent to `host`.
    pub fn applies_to(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        match self {
            Self::Unscoped => false,
            Self::Host(origin) => origin.trim().eq_ignore_ascii_case(&host),
            Self::Domain(domain) => {
                let domain = normalize_domain(domain);
                host == domain
                    || host.strip_suffix(domain.as_str()).is_some_and(|rest| rest.ends_with('.'))
            }
        }
    }
}

fn normalize_domain(domain: &str) -> String {
    domain.trim().trim_start_matches('.').to_ascii_lowercase()
}

impl fmt::Display for CookieScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(domain) => f.write_str(domain),
            Self::Host(host) => write!(f, "{host} (host-only)"),
            Self::Unscoped => f.write_str("<host-only>"),
        }
    }
}

/// Every domain variant a session marker may have been written under.
///
/// Cross-subdomain deployments mean the authority that set a marker can differ
/// from the one observing it, so teardown targets all of them: the currently
/// resolved domain, the production domain, the local-dev domain and finally
/// host-only markers of every host.
#[derive(Clone, Default)]
pub struct CookieDomains {
    resolver: Option<Arc<dyn CookieDomainResolver>>,
    production: Option<String>,
    local_dev: Option<String>,
}

impl CookieDomains {
    pub fn new(resolver: Arc<dyn CookieDomainResolver>) -> Self {
        Self { resolver: Some(resolver), production: None, local_dev: None }
    }

    pub fn with_production(mut self, domain: Option<String>) -> Self {
        self.production = domain;
        self
    }

    pub fn with_local_dev(mut self, domain: Option<String>) -> Self {
        self.local_dev = domain;
        self
    }

    /// Deduplicated scopes, ending with [`CookieScope::Unscoped`].
    pub fn variants(&self) -> Vec<CookieScope> {
        let resolved = self.resolver.as_ref().and_then(|r| r.resolve_cookie_domain());

        let mut scopes = Vec::with_capacity(4);
        let candidates = [resolved.as_deref(), self.production.as_deref(), self.local_dev.as_deref()];
        for scope in candidates.into_iter().flatten().filter_map(CookieScope::domain) {
            if !scopes.contains(&scope) {
                scopes.push(scope);
            }
        }
        scopes.push(CookieScope::Unscoped);
        scopes
    }
}

impl fmt::Debug for CookieDomains {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieDomains")
            .field("resolver", &self.resolver.is_some())
            .field("production", &self.production)
            .field("local_dev", &self.local_dev)
            .finish()
    }
}
