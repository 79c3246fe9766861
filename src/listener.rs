//! The receive → route → dispatch loop.
//!
//! Strictly sequential: one event is fully processed, including every
//! webhook POST it triggers, before the next one is read. Delivery
//! failures are logged and counted, never propagated.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::esl::{EslConnection, EslError};
use crate::event::Event;
use crate::router::Router;
use crate::webhook::Notifier;

/// A stream of call-state events.
#[async_trait]
pub trait EventSource: Send {
    /// Wait for the next event. `Ok(None)` means the stream has ended.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying connection fails.
    async fn next_event(&mut self) -> Result<Option<Event>, EslError>;
}

#[async_trait]
impl EventSource for EslConnection {
    async fn next_event(&mut self) -> Result<Option<Event>, EslError> {
        self.recv_event().await
    }
}

/// Outcome of dispatching one event's notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Notifications delivered.
    pub sent: usize,
    /// Notifications the webhook rejected or that failed in transport.
    pub failed: usize,
}

impl DispatchSummary {
    fn absorb(&mut self, other: Self) {
        self.sent = self.sent.saturating_add(other.sent);
        self.failed = self.failed.saturating_add(other.failed);
    }
}

/// Totals for a whole listening session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListenerStats {
    /// Events received from the source.
    pub events: usize,
    /// Aggregated delivery results.
    pub dispatch: DispatchSummary,
}

/// Drives events from a source through the router into a notifier.
pub struct Listener<N> {
    router: Router,
    notifier: N,
}

impl<N: Notifier> Listener<N> {
    /// Create a listener.
    pub fn new(router: Router, notifier: N) -> Self {
        Self { router, notifier }
    }

    /// Route one event and deliver its notifications in order.
    pub async fn handle_event(&self, event: &Event) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        for notification in self.router.route(event) {
            match self.notifier.notify(&notification).await {
                Ok(()) => {
                    summary.sent = summary.sent.saturating_add(1);
                    debug!(destination = ?notification.target, "notification sent");
                }
                Err(e) => {
                    summary.failed = summary.failed.saturating_add(1);
                    warn!(destination = ?notification.target, error = %e, "unable to post notification");
                }
            }
        }
        summary
    }

    /// Consume events until the source ends.
    ///
    /// # Errors
    ///
    /// Returns the source's error if receiving fails. Delivery failures
    /// never end the loop.
    pub async fn run<S: EventSource>(&self, source: &mut S) -> Result<ListenerStats, EslError> {
        let mut stats = ListenerStats::default();
        info!(extensions = self.router.directory().len(), "listening for call events");

        while let Some(event) = source.next_event().await? {
            stats.events = stats.events.saturating_add(1);
            let summary = self.handle_event(&event).await;
            stats.dispatch.absorb(summary);
        }

        info!(
            events = stats.events,
            sent = stats.dispatch.sent,
            failed = stats.dispatch.failed,
            "event stream ended"
        );
        Ok(stats)
    }

    /// The notifier in use.
    pub fn notifier(&self) -> &N {
        &self.notifier
    }
}
