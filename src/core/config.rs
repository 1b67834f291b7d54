//! # Client configuration.
//!
//! [`ClientConfig`] holds every setting of a [`Client`](crate::Client). It is read
//! once by [`ClientBuilder::build`](crate::ClientBuilder::build) and never
//! reloaded; the event builder, dispatcher and senders each keep the parts they
//! need.
//!
//! ## Sentinel values
//! - `dsn = None` → events are built but never sent (`NotSent(NoDsn)`)
//! - `senders = 0` → treated as 1
//! - `sender_queue_capacity = 0` → treated as 1
//! - `delivery_deadline = 0s` → no overall deadline per event
//!
//! ## Environment
//! [`ClientConfig::from_env`] starts from [`Default`] and overlays:
//!
//! | Variable                    | Field             |
//! |-----------------------------|-------------------|
//! | `FAULTCAST_DSN`             | `dsn`             |
//! | `FAULTCAST_ENVIRONMENT`     | `environment`     |
//! | `FAULTCAST_RELEASE`         | `release`         |
//! | `FAULTCAST_SERVER_NAME`     | `server_name`     |
//! | `FAULTCAST_MAX_BREADCRUMBS` | `max_breadcrumbs` |
//! | `FAULTCAST_SAMPLE_RATE`     | `sample_rate`     |
//!
//! Empty values are ignored.

use std::str::FromStr;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::policies::{RetryPolicy, SaturationPolicy};

/// Configuration of a faultcast client.
///
/// All fields are public; prefer the helper accessors over sprinkling sentinel
/// checks through the code.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Ingestion DSN, `https://<public>[:<secret>]@<host>[:port][/path]/<project_id>`.
    pub dsn: Option<String>,
    pub environment: Option<String>,
    pub release: Option<String>,
    pub server_name: Option<String>,

    /// Maximum breadcrumbs kept per scope and per event.
    pub max_breadcrumbs: usize,

    /// Module prefixes whose frames are marked `in_app`.
    pub in_app_module_allow_list: Vec<String>,

    /// Waits between delivery attempts.
    pub retry: RetryPolicy,

    /// Attach source lines to frames (needs a source lookup on the builder).
    pub enable_source_code_context: bool,

    /// Tags added to every event; context and capture tags override them.
    pub tags: Map<String, Value>,

    /// Attach the dependency snapshot (`modules`) to events.
    pub report_dependencies: bool,

    /// Number of sender actors in the pool.
    pub senders: usize,

    /// Bounded queue length of each sender.
    pub sender_queue_capacity: usize,

    /// What dispatch does when every sender queue is full.
    pub saturation: SaturationPolicy,

    /// Timeout of a single HTTP attempt.
    pub request_timeout: Duration,

    /// Overall budget per event across all attempts (`0s` = none).
    pub delivery_deadline: Duration,

    /// Fraction of events sent, `0.0..=1.0`.
    pub sample_rate: f64,

    /// Capacity of the notice bus ring buffer (min 1).
    pub bus_capacity: usize,
}

impl ClientConfig {
    /// Environment variable names read by [`from_env`](Self::from_env).
    pub const ENV_DSN: &'static str = "FAULTCAST_DSN";
    pub const ENV_ENVIRONMENT: &'static str = "FAULTCAST_ENVIRONMENT";
    pub const ENV_RELEASE: &'static str = "FAULTCAST_RELEASE";
    pub const ENV_SERVER_NAME: &'static str = "FAULTCAST_SERVER_NAME";
    pub const ENV_MAX_BREADCRUMBS: &'static str = "FAULTCAST_MAX_BREADCRUMBS";
    pub const ENV_SAMPLE_RATE: &'static str = "FAULTCAST_SAMPLE_RATE";

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup` (same keys as [`from_env`](Self::from_env)).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut cfg = Self::default();

        if let Some(v) = get(Self::ENV_DSN) {
            cfg.dsn = Some(v);
        }
        if let Some(v) = get(Self::ENV_ENVIRONMENT) {
            cfg.environment = Some(v);
        }
        if let Some(v) = get(Self::ENV_RELEASE) {
            cfg.release = Some(v);
        }
        if let Some(v) = get(Self::ENV_SERVER_NAME) {
            cfg.server_name = Some(v);
        }
        if let Some(v) = get(Self::ENV_MAX_BREADCRUMBS) {
            cfg.max_breadcrumbs = parse(Self::ENV_MAX_BREADCRUMBS, &v)?;
        }
        if let Some(v) = get(Self::ENV_SAMPLE_RATE) {
            cfg.sample_rate = parse(Self::ENV_SAMPLE_RATE, &v)?;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks value ranges that the type system does not.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.sample_rate) {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }
        Ok(())
    }

    /// Sender pool size, at least 1.
    #[inline]
    pub fn concurrency(&self) -> usize {
        self.senders.max(1)
    }

    /// Per-sender queue length, at least 1.
    #[inline]
    pub fn queue_capacity(&self) -> usize {
        self.sender_queue_capacity.max(1)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Overall per-event budget as an `Option`.
    #[inline]
    pub fn deadline(&self) -> Option<Duration> {
        if self.delivery_deadline == Duration::ZERO {
            None
        } else {
            Some(self.delivery_deadline)
        }
    }
}

impl Default for ClientConfig {
    /// - no DSN (nothing is sent)
    /// - `max_breadcrumbs = 100`
    /// - `retry = 1s, 2s, 4s, 8s`
    /// - `senders = 4`, `sender_queue_capacity = 32`, fail-fast saturation
    /// - `request_timeout = 30s`, no delivery deadline
    /// - `sample_rate = 1.0`, `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            dsn: None,
            environment: None,
            release: None,
            server_name: None,
            max_breadcrumbs: 100,
            in_app_module_allow_list: Vec::new(),
            retry: RetryPolicy::default(),
            enable_source_code_context: false,
            tags: Map::new(),
            report_dependencies: true,
            senders: 4,
            sender_queue_capacity: 32,
            saturation: SaturationPolicy::default(),
            request_timeout: Duration::from_secs(30),
            delivery_deadline: Duration::ZERO,
            sample_rate: 1.0,
            bus_capacity: 1024,
        }
    }
}

fn parse<T: FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}
