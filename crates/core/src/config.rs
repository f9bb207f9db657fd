//! Runtime configuration shared by the trail runner and WC-root resolver.

/// Policy and tuning knobs threaded through `wcdb-trail` and `wcdb-engine`.
///
/// Constructed via [`WcdbConfig::builder`], mirroring the teacher's
/// `DatabaseConfig` builder pattern.
#[derive(Debug, Clone)]
pub struct WcdbConfig {
    /// Upgrade an out-of-date (but not too old) WC format automatically
    /// when opening it (§4.8 step 4).
    pub auto_upgrade: bool,

    /// Fail to open a WC whose work queue is non-empty, rather than
    /// silently resuming with pending work items (§4.8 step 4, §7
    /// `CleanupRequired`).
    pub enforce_empty_work_queue: bool,

    /// Upper bound on retries the trail runner performs on a deadlock
    /// before giving up (§4.1, §9 open-question resolution #8). The
    /// original has no such bound; this is a deliberate rewrite addition
    /// for test determinism and to avoid unbounded retry loops.
    pub max_trail_retries: u32,
}

impl Default for WcdbConfig {
    fn default() -> Self {
        WcdbConfig {
            auto_upgrade: true,
            enforce_empty_work_queue: false,
            max_trail_retries: 64,
        }
    }
}

impl WcdbConfig {
    pub fn builder() -> WcdbConfigBuilder {
        WcdbConfigBuilder::default()
    }
}

/// Builder for [`WcdbConfig`].
#[derive(Debug, Default)]
pub struct WcdbConfigBuilder {
    config: OptionalConfig,
}

#[derive(Debug, Default)]
struct OptionalConfig {
    auto_upgrade: Option<bool>,
    enforce_empty_work_queue: Option<bool>,
    max_trail_retries: Option<u32>,
}

impl WcdbConfigBuilder {
    pub fn auto_upgrade(mut self, value: bool) -> Self {
        self.config.auto_upgrade = Some(value);
        self
    }

    pub fn enforce_empty_work_queue(mut self, value: bool) -> Self {
        self.config.enforce_empty_work_queue = Some(value);
        self
    }

    pub fn max_trail_retries(mut self, value: u32) -> Self {
        self.config.max_trail_retries = Some(value);
        self
    }

    pub fn build(self) -> WcdbConfig {
        let default = WcdbConfig::default();
        WcdbConfig {
            auto_upgrade: self.config.auto_upgrade.unwrap_or(default.auto_upgrade),
            enforce_empty_work_queue: self
                .config
                .enforce_empty_work_queue
                .unwrap_or(default.enforce_empty_work_queue),
            max_trail_retries: self
                .config
                .max_trail_retries
                .unwrap_or(default.max_trail_retries),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_only_set_fields() {
        let cfg = WcdbConfig::builder().auto_upgrade(false).build();
        assert!(!cfg.auto_upgrade);
        assert!(!cfg.enforce_empty_work_queue);
        assert_eq!(cfg.max_trail_retries, 64);
    }
}
