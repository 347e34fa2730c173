//! Session refresh example
//!
//! Demonstrates fetching a portal resource with transparent session refresh.
//!
//! Run with:
//! ```bash
//! DEALROOM_API_BASE_URL=https://api.dealroom.app \
//! DEALROOM_SESSION_COOKIE='sb-abcd-auth-token=...' \
//! cargo run --example session_refresh -- /deals
//! ```

use dealroom_core::CookieScope;
use dealroom_infra::observability::init_tracing_from_config;
use dealroom_infra::{config, ApiClient};
use serde_json::Value;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load()?;
    init_tracing_from_config(&config);

    let client = ApiClient::builder().config(config).build()?;

    if let (Ok(cookie), Some(host)) =
        (std::env::var("DEALROOM_SESSION_COOKIE"), client.base_url().host_str())
    {
        if let Some((name, value)) = cookie.split_once('=') {
            client.cookies().insert(CookieScope::host(host), name.trim(), value.trim());
        }
    }

    let path = std::env::args().nth(1).unwrap_or_else(|| "/".to_string());
    println!("GET {}", client.url(&path)?);

    match client.get::<Value>(&path).await {
        Ok(body) => println!("{}", serde_json::to_string_pretty(&body)?),
        Err(err) if err.requires_sign_in() => println!("Session ended, please sign in again: {err}"),
        Err(err) => println!("Request failed: {err}"),
    }

    let stats = client.session_stats();
    println!(
        "refresh cycles: {}, refresh calls: {}, last outcome: {:?}",
        stats.cycles_completed, stats.refresh_calls, stats.last_outcome
    );

    Ok(())
}
