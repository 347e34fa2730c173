//! Cookie-jar credential store

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use dealroom_core::{CookieScope, CredentialHeader, CredentialStore, MarkerConvention, MarkerPredicate};
use dealroom_domain::SessionConfig;
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, COOKIE, SET_COOKIE};
use tracing::{debug, trace};

type CookieKey = (CookieScope, String);

/// Cookie jar keyed by `(scope, name)`.
///
/// Session markers are recognised through a [`MarkerPredicate`]; every other
/// cookie is carried along on requests but never counted or cleared. Scopes
/// are stored in their normalized form, so `Domain=.dealroom.app` and
/// `Domain=dealroom.app` address the same cookie.
pub struct CookieCredentialStore {
    jar: RwLock<BTreeMap<CookieKey, String>>,
    markers: Arc<dyn MarkerPredicate>,
}

impl CookieCredentialStore {
    pub fn new(markers: impl MarkerPredicate + 'static) -> Self {
        Self { jar: RwLock::new(BTreeMap::new()), markers: Arc::new(markers) }
    }

    /// Store using the configured marker prefix and suffix.
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(MarkerConvention::new(&config.marker_prefix, &config.marker_suffix))
    }

    pub fn insert(&self, scope: CookieScope, name: impl Into<String>, value: impl Into<String>) {
        self.jar.write().insert((scope.normalized(), name.into()), value.into());
    }

    pub fn remove(&self, scope: &CookieScope, name: &str) -> Option<String> {
        self.jar.write().remove(&key(scope, name))
    }

    pub fn get(&self, scope: &CookieScope, name: &str) -> Option<String> {
        self.jar.read().get(&key(scope, name)).cloned()
    }

    pub fn len(&self) -> usize {
        self.jar.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jar.read().is_empty()
    }

    /// Apply one `Set-Cookie` header value received from `origin`.
    ///
    /// The `Domain` attribute selects the scope; without it the cookie is
    /// host-only for `origin`. `Max-Age` of zero or less deletes the cookie.
    /// Malformed values are ignored.
    pub fn absorb_set_cookie(&self, origin: &str, header: &str) {
        let Some(cookie) = SetCookie::parse(header, origin) else {
            debug!("ignoring malformed Set-Cookie header");
            return;
        };

        let key = (cookie.scope, cookie.name);
        let mut jar = self.jar.write();
        if cookie.expired {
            trace!(name = %key.1, scope = %key.0, "cookie removed");
            jar.remove(&key);
        } else {
            trace!(name = %key.1, scope = %key.0, "cookie stored");
            jar.insert(key, cookie.value);
        }
    }

    /// Apply every `Set-Cookie` header of a response from `origin`.
    pub fn absorb_response(&self, origin: &str, headers: &HeaderMap) {
        for value in headers.get_all(SET_COOKIE) {
            match value.to_str() {
                Ok(header) => self.absorb_set_cookie(origin, header),
                Err(_) => debug!("ignoring non-ASCII Set-Cookie header"),
            }
        }
    }
}

impl CredentialStore for CookieCredentialStore {
    fn has_session(&self) -> bool {
        self.jar.read().keys().any(|(_, name)| self.markers.is_session_marker(name))
    }

    fn clear(&self, scopes: &[CookieScope]) -> usize {
        let mut jar = self.jar.write();
        let before = jar.len();
        jar.retain(|(scope, name), _| {
            !(scopes.iter().any(|target| target.covers(scope))
                && self.markers.is_session_marker(name))
        });
        before - jar.len()
    }

    fn credential_header(&self, host: &str) -> Option<CredentialHeader> {
        let jar = self.jar.read();
        let value = jar
            .iter()
            .filter(|((scope, _), _)| scope.applies_to(host))
            .map(|((_, name), value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");

        if value.is_empty() {
            None
        } else {
            Some(CredentialHeader { name: COOKIE.as_str().to_string(), value })
        }
    }
}

fn key(scope: &CookieScope, name: &str) -> CookieKey {
    (scope.clone().normalized(), name.to_string())
}

impl fmt::Debug for CookieCredentialStore {
    // Cookie values are credentials and never printed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let jar = self.jar.read();
        f.debug_struct("CookieCredentialStore")
            .field("cookies", &jar.keys().map(|(scope, name)| format!("{scope}/{name}")).collect::<Vec<_>>())
            .finish()
    }
}

struct SetCookie {
    name: String,
    value: String,
    scope: CookieScope,
    expired: bool,
}

impl SetCookie {
    fn parse(header: &str, origin: &str) -> Option<Self> {
        let mut parts = header.split(';');
        let (name, value) = parts.next()?.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let mut domain = None;
        let mut expired = false;
        for attribute in parts {
            let (key, val) = attribute.split_once('=').unwrap_or((attribute, ""));
            let (key, val) = (key.trim(), val.trim());
            if key.eq_ignore_ascii_case("domain") {
                domain = Some(val);
            } else if key.eq_ignore_ascii_case("max-age") {
                expired = val.parse::<i64>().map(|age| age <= 0).unwrap_or(false);
            }
        }

        Some(Self {
            name: name.to_string(),
            value: value.trim().trim_matches('"').to_string(),
            scope: CookieScope::from_attribute(domain, origin),
            expired,
        })
    }
}
