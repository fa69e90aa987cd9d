use std::ops::RangeInclusive;
use std::time::Duration;

use log::warn;

use crate::remote::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::session::MAX_SESSION_TTL;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub remote_timeout: Duration,
    pub local_delay_ms: Option<RangeInclusive<u64>>,
    pub session_ttl: Duration,
    pub session_prune_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            openai_api_key: None,
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            openai_model: DEFAULT_MODEL.to_string(),
            remote_timeout: Duration::from_secs(15),
            local_delay_ms: Some(1000..=3000),
            session_ttl: Duration::from_secs(24 * 60 * 60),
            session_prune_interval: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unparseable values keep their default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(port) = parsed(&lookup, "PORT") {
            config.port = port;
        }
        config.openai_api_key = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty());
        if let Some(url) = lookup("OPENAI_BASE_URL").filter(|u| !u.trim().is_empty()) {
            config.openai_base_url = url;
        }
        if let Some(model) = lookup("OPENAI_MODEL").filter(|m| !m.trim().is_empty()) {
            config.openai_model = model;
        }
        match parsed::<u64, _>(&lookup, "REMOTE_TIMEOUT_SECS") {
            Some(0) => warn!("Ignoring REMOTE_TIMEOUT_SECS=0, remote calls need a nonzero wait"),
            Some(secs) => config.remote_timeout = Duration::from_secs(secs),
            None => {}
        }
        if let Some(raw) = lookup("LOCAL_DELAY_MS") {
            match parse_delay(&raw) {
                Some(delay) => config.local_delay_ms = delay,
                None => warn!("Ignoring malformed LOCAL_DELAY_MS={:?}", raw),
            }
        }
        if let Some(hours) = parsed::<u64, _>(&lookup, "SESSION_TTL_HOURS") {
            match hours
                .checked_mul(60 * 60)
                .map(Duration::from_secs)
                .filter(|ttl| !ttl.is_zero() && *ttl <= MAX_SESSION_TTL)
            {
                Some(ttl) => config.session_ttl = ttl,
                None => warn!(
                    "Ignoring SESSION_TTL_HOURS={}, must be between 1 and {}",
                    hours,
                    MAX_SESSION_TTL.as_secs() / 3600
                ),
            }
        }
        if let Some(secs) = parsed::<u64, _>(&lookup, "SESSION_PRUNE_INTERVAL_SECS") {
            if secs > 0 {
                config.session_prune_interval = Duration::from_secs(secs);
            }
        }

        config
    }

    /// The remote credential, only if it looks like a real key.
    pub fn remote_credential(&self) -> Option<&str> {
        self.openai_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| key.starts_with("sk-"))
    }
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring malformed {}={:?}", key, raw);
            None
        }
    }
}

/// `"0"` disables the delay, `"N"` is a fixed delay and `"A-B"` a range.
fn parse_delay(raw: &str) -> Option<Option<RangeInclusive<u64>>> {
    let raw = raw.trim();
    let (lo, hi) = match raw.split_once('-') {
        Some((lo, hi)) => (lo.trim().parse().ok()?, hi.trim().parse().ok()?),
        None => {
            let fixed: u64 = raw.parse().ok()?;
            (fixed, fixed)
        }
    };
    if hi == 0 {
        Some(None)
    } else if lo <= hi {
        Some(Some(lo..=hi))
    } else {
        None
    }
}
