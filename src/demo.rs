use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use serde_json::json;
use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::gift::event::RawGiftEvent;
use crate::webcast::client::WebcastEvent;

/// Coin values of the fake gift catalog used for layout testing.
const DEMO_GIFT_COINS: [u64; 3] = [1, 5, 30];

const DEMO_SENDERS: [&str; 4] = ["Ivan_Pro", "Ksenia_Live", "TikTokFan_99", "MegaDonater"];

/// Synthetic gift generator for demo mode.
///
/// Emits one random single-shot gift per interval through the same
/// channel the live transport uses, so the session cannot tell the two
/// sources apart.
pub struct DemoProducer {
    interval: Duration,
    events: mpsc::UnboundedSender<WebcastEvent>,
}

impl DemoProducer {
    pub fn new(interval: Duration, events: mpsc::UnboundedSender<WebcastEvent>) -> Self {
        Self { interval, events }
    }

    #[instrument(skip_all)]
    pub async fn run(self, cancel: CancellationToken) {
        info!("demo mode started");
        let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if self.events.send(WebcastEvent::Gift(fake_gift())).is_err() {
                        debug!("session gone; stopping demo producer");
                        break;
                    }
                }

                _ = cancel.cancelled() => break,
            }
        }
    }
}

fn fake_gift() -> RawGiftEvent {
    let mut rng = rand::rng();
    let coins = DEMO_GIFT_COINS[rng.random_range(0..DEMO_GIFT_COINS.len())];
    let sender = DEMO_SENDERS[rng.random_range(0..DEMO_SENDERS.len())];

    RawGiftEvent {
        gift_id: Some(json!(rng.random_range(1000..10_000))),
        sender_name: Some(sender.to_string()),
        coins: Some(json!(coins)),
        repeat_count: Some(json!(1)),
        is_combo: Some(false),
        is_finished: Some(true),
        combo_id: Some(format!("demo_{}", Utc::now().timestamp_millis())),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gift::event::GiftEvent;

    #[test]
    fn fake_gifts_pass_normalization() {
        for _ in 0..50 {
            let gift = GiftEvent::normalize(&fake_gift()).unwrap();
            assert!(DEMO_GIFT_COINS.contains(&gift.coin_value));
            assert_eq!(gift.repeat_count, 1);
            assert!(!gift.is_combo);
            assert!(gift.is_finished);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn emits_one_gift_per_interval_until_cancelled() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let producer = DemoProducer::new(Duration::from_secs(2), tx);
        let handle = tokio::spawn(producer.run(cancel.clone()));

        time::sleep(Duration::from_millis(6500)).await;
        cancel.cancel();
        handle.await.unwrap();

        let mut count = 0;
        while let Some(event) = rx.recv().await {
            assert!(matches!(event, WebcastEvent::Gift(_)));
            count += 1;
        }
        assert_eq!(count, 3);
    }
}
