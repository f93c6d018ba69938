//! Monthly usage quotas
//!
//! Counters reset lazily: whenever limits are read in a different calendar
//! month (UTC) than the last reset.

use crate::config::LimitSettings;
use crate::error::{Error, QuotaKind, Result};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Per-user quota state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageLimits {
    pub user_id: String,
    pub searches_this_month: u32,
    pub max_searches: u32,
    pub exports_this_month: u32,
    pub max_exports: u32,
    pub last_reset: DateTime<Utc>,
}

impl UsageLimits {
    /// Fresh limits for a user seen for the first time
    pub fn new(user_id: impl Into<String>, defaults: &LimitSettings, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            searches_this_month: 0,
            max_searches: defaults.max_searches,
            exports_this_month: 0,
            max_exports: defaults.max_exports,
            last_reset: now,
        }
    }

    /// Whether `now` falls in a different month than the last reset
    pub fn needs_reset(&self, now: DateTime<Utc>) -> bool {
        self.last_reset.month() != now.month() || self.last_reset.year() != now.year()
    }

    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.searches_this_month = 0;
        self.exports_this_month = 0;
        self.last_reset = now;
    }

    /// Fail with a quota error when the search allowance is used up
    pub fn ensure_search(&self) -> Result<()> {
        if self.searches_this_month >= self.max_searches {
            return Err(Error::QuotaExceeded {
                kind: QuotaKind::Search,
                limit: self.max_searches,
            });
        }
        Ok(())
    }

    /// Fail with a quota error when the export allowance is used up
    pub fn ensure_export(&self) -> Result<()> {
        if self.exports_this_month >= self.max_exports {
            return Err(Error::QuotaExceeded {
                kind: QuotaKind::Export,
                limit: self.max_exports,
            });
        }
        Ok(())
    }
}

/// Storage for usage counters
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Current limits, created on first use and reset on a new month
    async fn get_limits(&self, user_id: &str) -> Result<UsageLimits>;

    async fn increment_searches(&self, user_id: &str) -> Result<UsageLimits>;

    async fn increment_exports(&self, user_id: &str) -> Result<UsageLimits>;

    /// Err(QuotaExceeded) when no searches remain this month
    async fn check_search(&self, user_id: &str) -> Result<UsageLimits> {
        let limits = self.get_limits(user_id).await?;
        limits.ensure_search()?;
        Ok(limits)
    }

    /// Err(QuotaExceeded) when no exports remain this month
    async fn check_export(&self, user_id: &str) -> Result<UsageLimits> {
        let limits = self.get_limits(user_id).await?;
        limits.ensure_export()?;
        Ok(limits)
    }

    /// Check and increment the search counter as one atomic step
    async fn try_consume_search(&self, user_id: &str) -> Result<UsageLimits>;

    /// Check and increment the export counter as one atomic step
    async fn try_consume_export(&self, user_id: &str) -> Result<UsageLimits>;

    /// Give back a consumed search whose request failed afterwards
    async fn release_search(&self, user_id: &str) -> Result<UsageLimits>;

    /// Give back a consumed export whose request failed afterwards
    async fn release_export(&self, user_id: &str) -> Result<UsageLimits>;
}

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// In-process usage store
pub struct MemoryUsageStore {
    defaults: LimitSettings,
    limits: RwLock<HashMap<String, UsageLimits>>,
    clock: Clock,
}

impl MemoryUsageStore {
    pub fn new(defaults: LimitSettings) -> Self {
        Self {
            defaults,
            limits: RwLock::new(HashMap::new()),
            clock: Arc::new(Utc::now),
        }
    }

    /// Replace the time source
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    /// Store limits verbatim
    pub fn put(&self, limits: UsageLimits) -> Result<()> {
        self.limits
            .write()
            .map_err(|_| poisoned())?
            .insert(limits.user_id.clone(), limits);
        Ok(())
    }

    /// Apply `f` to the user's current limits under one write lock
    fn update<F>(&self, user_id: &str, f: F) -> Result<UsageLimits>
    where
        F: FnOnce(&mut UsageLimits) -> Result<()>,
    {
        let now = (self.clock)();
        let mut map = self.limits.write().map_err(|_| poisoned())?;
        let limits = map
            .entry(user_id.to_string())
            .or_insert_with(|| UsageLimits::new(user_id, &self.defaults, now));
        if limits.needs_reset(now) {
            limits.reset(now);
        }
        f(limits)?;
        Ok(limits.clone())
    }
}

impl Default for MemoryUsageStore {
    fn default() -> Self {
        Self::new(LimitSettings::default())
    }
}

fn poisoned() -> Error {
    Error::Internal(anyhow::anyhow!("usage store lock poisoned"))
}

#[async_trait]
impl UsageStore for MemoryUsageStore {
    async fn get_limits(&self, user_id: &str) -> Result<UsageLimits> {
        self.update(user_id, |_| Ok(()))
    }

    async fn increment_searches(&self, user_id: &str) -> Result<UsageLimits> {
        self.update(user_id, |l| {
            l.searches_this_month += 1;
            Ok(())
        })
    }

    async fn increment_exports(&self, user_id: &str) -> Result<UsageLimits> {
        self.update(user_id, |l| {
            l.exports_this_month += 1;
            Ok(())
        })
    }

    async fn try_consume_search(&self, user_id: &str) -> Result<UsageLimits> {
        self.update(user_id, |l| {
            l.ensure_search()?;
            l.searches_this_month += 1;
            Ok(())
        })
    }

    async fn try_consume_export(&self, user_id: &str) -> Result<UsageLimits> {
        self.update(user_id, |l| {
            l.ensure_export()?;
            l.exports_this_month += 1;
            Ok(())
        })
    }

    async fn release_search(&self, user_id: &str) -> Result<UsageLimits> {
        self.update(user_id, |l| {
            l.searches_this_month = l.searches_this_month.saturating_sub(1);
            Ok(())
        })
    }

    async fn release_export(&self, user_id: &str) -> Result<UsageLimits> {
        self.update(user_id, |l| {
            l.exports_this_month = l.exports_this_month.saturating_sub(1);
            Ok(())
        })
    }
}
