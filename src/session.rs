use std::future::poll_fn;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tokio_util::time::DelayQueue;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::gift::display::{DisplayEffect, DisplayManager};
use crate::gift::engine::AggregationEngine;
use crate::gift::event::RawGiftEvent;
use crate::webcast::client::WebcastEvent;

/// State pushes from a running session to its widget client.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum WidgetUpdate {
    /// Initial balance, sent once before the countdown starts.
    Snapshot { remaining: u64, clock: String },
    Connected {
        username: String,
        room_id: Option<String>,
    },
    Tick { remaining: u64, clock: String },
    TimeAdded {
        effect: DisplayEffect,
        remaining: u64,
        clock: String,
    },
    EffectExpired { id: String },
    /// Terminal status; the widget shows the reason and stops.
    Ended { reason: String },
}

/// Delayed work serialized onto the session loop. All three kinds live in
/// one queue so teardown cancels every pending timer at once.
#[derive(Debug)]
enum Expiry {
    /// Grace period over; move the combo entry to its tombstone.
    ComboRetire(String),
    /// Suppression window over; drop the tombstone.
    ComboForget(String),
    /// Display duration over; hide the effect.
    Effect(String),
}

/// One widget session: a single task owning the aggregation state.
///
/// The once-per-second tick, incoming gift notifications and timer
/// expirations are all applied here, one at a time, so combo deltas for a
/// given series are computed in arrival order and the balance is never
/// observed mid-update.
pub struct Session {
    config: Config,
    engine: AggregationEngine,
    display: DisplayManager,
    expirations: DelayQueue<Expiry>,
    events: mpsc::UnboundedReceiver<WebcastEvent>,
    updates: mpsc::UnboundedSender<WidgetUpdate>,
}

impl Session {
    pub fn new(
        config: Config,
        events: mpsc::UnboundedReceiver<WebcastEvent>,
        updates: mpsc::UnboundedSender<WidgetUpdate>,
    ) -> Self {
        let engine = AggregationEngine::new(config.initial_seconds);

        Self {
            config,
            engine,
            display: DisplayManager::new(),
            expirations: DelayQueue::new(),
            events,
            updates,
        }
    }

    /// Runs until the event source ends or teardown is requested. Dropping
    /// the session afterwards discards every pending expiration with it.
    #[instrument(skip_all)]
    pub async fn run(mut self, cancel: CancellationToken) {
        let tick = Duration::from_secs(1);
        let mut ticker = time::interval_at(time::Instant::now() + tick, tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        self.push(WidgetUpdate::Snapshot {
            remaining: self.engine.balance(),
            clock: self.engine.format_clock(),
        });

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let remaining = self.engine.tick();
                    self.push(WidgetUpdate::Tick {
                        remaining,
                        clock: self.engine.format_clock(),
                    });
                }

                event = self.events.recv() => match event {
                    Some(WebcastEvent::Gift(raw)) => self.on_gift(&raw),

                    Some(WebcastEvent::Connected { username, room_id }) => {
                        info!(%username, "gift stream connected");
                        self.push(WidgetUpdate::Connected { username, room_id });
                    }

                    Some(WebcastEvent::Ended { reason }) => {
                        info!(%reason, "gift stream ended");
                        self.push(WidgetUpdate::Ended { reason });
                        break;
                    }

                    None => {
                        debug!("event source dropped; ending session");
                        break;
                    }
                },

                Some(expired) = poll_fn(|cx| self.expirations.poll_expired(cx)),
                    if !self.expirations.is_empty() =>
                {
                    self.on_expiry(expired.into_inner());
                }

                _ = cancel.cancelled() => {
                    info!("session teardown requested");
                    break;
                }
            }
        }

        debug!(
            live_effects = self.display.active().len(),
            balance = self.engine.balance(),
            "session closed"
        );
    }

    fn on_gift(&mut self, raw: &RawGiftEvent) {
        let outcome = match self.engine.process(raw) {
            Ok(outcome) => outcome,
            Err(e) => {
                // A single malformed notification is skipped, never fatal.
                warn!("dropping malformed gift event: {}", e);
                return;
            }
        };

        if let Some(combo_id) = outcome.finished_combo {
            self.expirations
                .insert(Expiry::ComboRetire(combo_id), self.config.combo_grace);
        }

        if outcome.credited > 0 {
            let effect = self.display.show(outcome.credited, &outcome.sender_name);
            self.expirations
                .insert(Expiry::Effect(effect.id.clone()), self.config.effect_duration);

            self.push(WidgetUpdate::TimeAdded {
                effect,
                remaining: self.engine.balance(),
                clock: self.engine.format_clock(),
            });
        }
    }

    fn on_expiry(&mut self, expiry: Expiry) {
        match expiry {
            Expiry::ComboRetire(combo_id) => {
                if self.engine.retire_combo(&combo_id) {
                    self.expirations
                        .insert(Expiry::ComboForget(combo_id), self.config.combo_suppress);
                }
            }

            Expiry::ComboForget(combo_id) => self.engine.forget_combo(&combo_id),

            Expiry::Effect(id) => {
                if self.display.retire(&id) {
                    self.push(WidgetUpdate::EffectExpired { id });
                }
            }
        }
    }

    fn push(&self, update: WidgetUpdate) {
        if self.updates.send(update).is_err() {
            debug!("widget client gone; update dropped");
        }
    }
}
