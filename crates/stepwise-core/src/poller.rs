//! Visibility-gated periodic refresh.
//!
//! A [`Poller`] keeps at most one timer task. Hiding the view stops the
//! timer; showing it again refreshes immediately and restarts the timer,
//! but only between [`Poller::start`] and [`Poller::stop`].

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::{
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

use crate::error::Result;

/// Period used when none is configured.
pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_secs(5);

/// Something the poller refreshes.
#[async_trait]
pub trait Refresh: Send + Sync {
    async fn refresh(&self) -> Result<()>;
}

pub struct Poller {
    source: Arc<dyn Refresh>,
    period: Duration,
    visible: bool,
    started: bool,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    pub fn new(source: Arc<dyn Refresh>) -> Self {
        Self {
            source,
            period: DEFAULT_POLL_PERIOD,
            visible: true,
            started: false,
            handle: None,
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Whether polling was requested, whether or not the view is visible.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Starts polling. While hidden the timer waits for the view to show.
    /// The first refresh is one period away.
    pub fn start(&mut self) {
        self.started = true;
        if !self.visible || self.is_running() {
            return;
        }
        self.spawn(Instant::now() + self.period);
    }

    /// Stops polling until the next [`start`](Self::start).
    pub fn stop(&mut self) {
        self.started = false;
        self.cancel();
    }

    /// Reacts to the view being shown or hidden.
    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.cancel();
        if !self.started {
            return;
        }
        if visible {
            log::debug!("View visible, refreshing and resuming poll");
            self.spawn(Instant::now());
        } else {
            log::debug!("View hidden, pausing poll");
        }
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    fn spawn(&mut self, first: Instant) {
        let source = Arc::clone(&self.source);
        let period = self.period;

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(first, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = source.refresh().await {
                    log::warn!("Refresh failed: {e}");
                }
            }
        }));
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}
