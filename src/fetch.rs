use std::thread;
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;

use crate::error::Result;

/// Build an HTTP agent whose requests give up after `timeout`
pub fn http_agent(timeout: Duration) -> ureq::Agent {
    ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build()
        .into()
}

/// Desktop browser user agents, rotated per request
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
];

/// Pick a user agent at random
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Browser-like request headers
pub fn browser_headers() -> Vec<(&'static str, &'static str)> {
    vec![
        ("User-Agent", random_user_agent()),
        (
            "Accept",
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
        ("Accept-Language", "en-US,en;q=0.5"),
        ("Upgrade-Insecure-Requests", "1"),
    ]
}

/// GET a page and return its HTML
pub fn fetch_html(agent: &ureq::Agent, url: &str) -> Result<String> {
    let mut request = agent.get(url);
    for (key, value) in browser_headers() {
        request = request.header(key, value);
    }

    let response = request.call()?;
    let html = response.into_body().read_to_string()?;
    Ok(html)
}

/// Retry budget for stores that tolerate transient failures
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub retries: u32,
    /// Delay before the first retry, doubled each time
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const NONE: RetryPolicy = RetryPolicy {
        retries: 0,
        backoff: Duration::ZERO,
    };

    /// Delay before retry number `attempt` (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        self.backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Run `op` until it succeeds, the retry budget is spent, or the next
/// attempt would start after `deadline`
pub fn with_retry<T>(
    policy: RetryPolicy,
    deadline: Instant,
    mut op: impl FnMut() -> Result<T>,
) -> Result<T> {
    let mut attempt = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.retries => {
                attempt += 1;
                let wait = policy.delay(attempt);
                if Instant::now() + wait >= deadline {
                    tracing::debug!(attempt, error = %e, "no time left to retry");
                    return Err(e);
                }
                tracing::debug!(attempt, ?wait, error = %e, "request failed, retrying");
                thread::sleep(wait);
            }
            Err(e) => return Err(e),
        }
    }
}

/// `fetch_html` under a retry policy, bounded by `deadline`
pub fn fetch_with_retry(
    agent: &ureq::Agent,
    url: &str,
    policy: RetryPolicy,
    deadline: Instant,
) -> Result<String> {
    with_retry(policy, deadline, || fetch_html(agent, url))
}
