//! Background ticket garbage collection.
//!
//! Single-use semantics never depend on the collector (that is `consume`'s job);
//! it only bounds memory held by abandoned tickets. A missed tick delays cleanup.

use std::{
    sync::Arc,
    time::{Duration, SystemTime},
};
use tokio::{
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, info};

use super::{TicketClass, TicketStore};

const DEFAULT_GC_PERIOD: Duration = Duration::from_secs(5 * 60);
const DEFAULT_LOGIN_TTL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_GRANTING_TTL: Duration = Duration::from_secs(8 * 60 * 60);

/// Lifetime of each ticket class. Service tickets live one collector period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TicketTtl {
    service: Duration,
    login: Duration,
    granting: Duration,
}

impl TicketTtl {
    #[must_use]
    pub fn new() -> Self {
        Self {
            service: DEFAULT_GC_PERIOD,
            login: DEFAULT_LOGIN_TTL,
            granting: DEFAULT_GRANTING_TTL,
        }
    }

    #[must_use]
    pub fn with_service_seconds(mut self, seconds: u64) -> Self {
        self.service = Duration::from_secs(seconds.max(1));
        self
    }

    #[must_use]
    pub fn with_login_seconds(mut self, seconds: u64) -> Self {
        self.login = Duration::from_secs(seconds.max(1));
        self
    }

    #[must_use]
    pub fn with_granting_seconds(mut self, seconds: u64) -> Self {
        self.granting = Duration::from_secs(seconds.max(1));
        self
    }

    #[must_use]
    pub const fn of(&self, class: TicketClass) -> Duration {
        match class {
            TicketClass::Service => self.service,
            TicketClass::Login => self.login,
            TicketClass::Granting => self.granting,
        }
    }

    /// The collector runs once per service-ticket lifetime.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.service
    }
}

impl Default for TicketTtl {
    fn default() -> Self {
        Self::new()
    }
}

/// Sweep every class whose TTL has elapsed relative to `now`; returns the number removed.
pub fn collect(store: &dyn TicketStore, ttl: &TicketTtl, now: SystemTime) -> usize {
    TicketClass::ALL
        .into_iter()
        .map(|class| {
            let Some(cutoff) = now.checked_sub(ttl.of(class)) else {
                return 0;
            };
            let removed = store.sweep(cutoff, class);
            if removed > 0 {
                debug!(class = %class, removed, "expired tickets swept");
            }
            removed
        })
        .sum()
}

/// Run `task` every `period`, starting one period from now.
///
/// The task is synchronous and must not block; it runs on the tokio runtime
/// and lives until the runtime shuts down.
pub fn spawn_periodic<F>(period: Duration, mut task: F) -> JoinHandle<()>
where
    F: FnMut() + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a tokio interval completes immediately.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            task();
        }
    })
}

/// Start the ticket collector for `store`.
pub fn spawn_collector(store: Arc<dyn TicketStore>, ttl: TicketTtl) -> JoinHandle<()> {
    info!(
        period_seconds = ttl.period().as_secs(),
        "starting ticket collector"
    );
    spawn_periodic(ttl.period(), move || {
        let removed = collect(store.as_ref(), &ttl, SystemTime::now());
        if removed > 0 {
            info!("{removed} tickets cleaned");
        }
    })
}
