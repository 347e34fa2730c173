//! Cookie domain resolution

use std::net::IpAddr;

use dealroom_core::CookieDomainResolver;
use dealroom_domain::{ClientConfig, Result};

/// Resolves the session cookie domain from configuration, falling back to the
/// parent domain of the API host (`api.dealroom.app` → `.dealroom.app`).
///
/// IP addresses, `localhost` and single-label hosts resolve to `None`
/// (host-only cookies).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfiguredDomainResolver {
    configured: Option<String>,
    api_host: Option<String>,
}

impl ConfiguredDomainResolver {
    pub fn new(configured: Option<String>, api_host: Option<String>) -> Self {
        Self { configured, api_host }
    }

    /// # Errors
    /// Returns `DealroomError::Config` if the API base URL is invalid.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let api_host = config.api_base_url()?.host_str().map(str::to_string);
        Ok(Self::new(config.session.cookie_domain.clone(), api_host))
    }
}

impl CookieDomainResolver for ConfiguredDomainResolver {
    fn resolve_cookie_domain(&self) -> Option<String> {
        if let Some(domain) = self.configured.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            return Some(domain.to_ascii_lowercase());
        }
        self.api_host.as_deref().and_then(parent_domain)
    }
}

fn parent_domain(host: &str) -> Option<String> {
    let host = host.trim_start_matches('[').trim_end_matches(']').to_ascii_lowercase();
    if host == "localhost" || host.ends_with(".localhost") || host.parse::<IpAddr>().is_ok() {
        return None;
    }

    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    match labels.as_slice() {
        [.., second_level, top_level] => Some(format!(".{second_level}.{top_level}")),
        _ => None,
    }
}
