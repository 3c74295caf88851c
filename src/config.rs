use anyhow::{Result, anyhow};
use std::env;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_PAYLOAD_BYTES: usize = 2048;
const DEFAULT_MAX_SESSIONS: usize = 512;
const DEFAULT_SESSION_TTL_SECONDS: usize = 1800;
const DEFAULT_MAX_INPUT_CHARS: usize = 256;
const DEFAULT_STATIC_DELAY_MS: u64 = 120;
const DEFAULT_UNKNOWN_DELAY_MS: u64 = 250;
const DEFAULT_LOADING_MIN_MS: u64 = 800;
const DEFAULT_LOADING_MAX_MS: u64 = 1500;
const DEFAULT_DEMO_START_DELAY_MS: u64 = 2500;
const DEFAULT_TYPING_MIN_MS: u64 = 40;
const DEFAULT_TYPING_MAX_MS: u64 = 110;

/// Simulated latencies used by a console instance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsoleTiming {
    pub static_delay: Duration,
    pub unknown_delay: Duration,
    pub loading_min: Duration,
    pub loading_max: Duration,
}

impl Default for ConsoleTiming {
    fn default() -> Self {
        Self {
            static_delay: Duration::from_millis(DEFAULT_STATIC_DELAY_MS),
            unknown_delay: Duration::from_millis(DEFAULT_UNKNOWN_DELAY_MS),
            loading_min: Duration::from_millis(DEFAULT_LOADING_MIN_MS),
            loading_max: Duration::from_millis(DEFAULT_LOADING_MAX_MS),
        }
    }
}

impl ConsoleTiming {
    /// No simulated latency at all.
    pub fn instant() -> Self {
        Self {
            static_delay: Duration::ZERO,
            unknown_delay: Duration::ZERO,
            loading_min: Duration::ZERO,
            loading_max: Duration::ZERO,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DemoSettings {
    pub enabled: bool,
    pub start_delay: Duration,
    pub typing_min: Duration,
    pub typing_max: Duration,
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            start_delay: Duration::from_millis(DEFAULT_DEMO_START_DELAY_MS),
            typing_min: Duration::from_millis(DEFAULT_TYPING_MIN_MS),
            typing_max: Duration::from_millis(DEFAULT_TYPING_MAX_MS),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub max_payload_bytes: usize,
    pub max_sessions: usize,
    pub session_ttl: Duration,
    pub max_input_chars: usize,
    pub timing: ConsoleTiming,
    pub demo: DemoSettings,
    pub allowed_origins: Vec<String>,
    pub allow_all_origins: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        let port = parse_port("PORT", DEFAULT_PORT)?;
        let max_payload_bytes = parse_positive("MAX_PAYLOAD_BYTES", DEFAULT_MAX_PAYLOAD_BYTES)?;
        let max_sessions = parse_positive("CONSOLE_MAX_SESSIONS", DEFAULT_MAX_SESSIONS)?;
        let session_ttl_seconds =
            parse_positive("CONSOLE_SESSION_TTL_SECONDS", DEFAULT_SESSION_TTL_SECONDS)?;
        let max_input_chars = parse_positive("CONSOLE_MAX_INPUT_CHARS", DEFAULT_MAX_INPUT_CHARS)?;

        let timing = ConsoleTiming {
            static_delay: parse_millis("CONSOLE_STATIC_DELAY_MS", DEFAULT_STATIC_DELAY_MS)?,
            unknown_delay: parse_millis("CONSOLE_UNKNOWN_DELAY_MS", DEFAULT_UNKNOWN_DELAY_MS)?,
            loading_min: parse_millis("CONSOLE_LOADING_MIN_MS", DEFAULT_LOADING_MIN_MS)?,
            loading_max: parse_millis("CONSOLE_LOADING_MAX_MS", DEFAULT_LOADING_MAX_MS)?,
        };
        validate_range("CONSOLE_LOADING", timing.loading_min, timing.loading_max)?;

        let demo = DemoSettings {
            enabled: env::var("DEMO_ENABLED")
                .map(|value| !value.trim().eq_ignore_ascii_case("false"))
                .unwrap_or(true),
            start_delay: parse_millis("DEMO_START_DELAY_MS", DEFAULT_DEMO_START_DELAY_MS)?,
            typing_min: parse_millis("DEMO_TYPING_MIN_MS", DEFAULT_TYPING_MIN_MS)?,
            typing_max: parse_millis("DEMO_TYPING_MAX_MS", DEFAULT_TYPING_MAX_MS)?,
        };
        validate_range("DEMO_TYPING", demo.typing_min, demo.typing_max)?;

        let allowed_origins = parse_list(&env::var("CORS_ALLOW_ORIGIN").unwrap_or_default());
        let allow_all_origins = env::var("ALLOW_ALL_ORIGINS")
            .unwrap_or_default()
            .eq_ignore_ascii_case("true");
        let allow_all_origins = allow_all_origins && allowed_origins.iter().any(|origin| origin == "*");

        if !allow_all_origins && allowed_origins.is_empty() {
            return Err(anyhow!(
                "CORS_ALLOW_ORIGIN must include at least one allowed origin (or set ALLOW_ALL_ORIGINS=true with \"*\")"
            ));
        }

        Ok(Self {
            port,
            max_payload_bytes,
            max_sessions,
            session_ttl: Duration::from_secs(session_ttl_seconds as u64),
            max_input_chars,
            timing,
            demo,
            allowed_origins,
            allow_all_origins,
        })
    }
}

fn parse_port(name: &str, fallback: u16) -> Result<u16> {
    match env::var(name) {
        Ok(value) => {
            let parsed = value.trim().parse::<u16>().unwrap_or(0);
            if parsed == 0 {
                Err(anyhow!("{name} must be greater than zero"))
            } else {
                Ok(parsed)
            }
        }
        Err(_) => Ok(fallback),
    }
}

fn parse_positive(name: &str, fallback: usize) -> Result<usize> {
    match env::var(name) {
        Ok(value) => {
            let parsed = value.trim().parse::<usize>().unwrap_or(0);
            if parsed == 0 {
                Err(anyhow!("{name} must be greater than zero"))
            } else {
                Ok(parsed)
            }
        }
        Err(_) => Ok(fallback),
    }
}

// Zero is a valid delay, so only unparsable values are rejected here.
fn parse_millis(name: &str, fallback: u64) -> Result<Duration> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| anyhow!("{name} must be a whole number of milliseconds")),
        Err(_) => Ok(Duration::from_millis(fallback)),
    }
}

fn validate_range(prefix: &str, min: Duration, max: Duration) -> Result<()> {
    if min > max {
        return Err(anyhow!(
            "{prefix}_MIN_MS must not exceed {prefix}_MAX_MS ({} > {})",
            min.as_millis(),
            max.as_millis()
        ));
    }
    Ok(())
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(|item| item.to_string())
        .collect()
}
