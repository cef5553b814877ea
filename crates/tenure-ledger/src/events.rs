//! Ledger events
//!
//! Every committed mutation is published on a broadcast channel so outer
//! layers can index, audit or notify without polling the ledger. Events are
//! only sent after the mutation is visible to readers.

use serde::{Deserialize, Serialize};
use tenure_common::{AccountId, Amount, BasisPoints, Payout, Timestamp};
use tokio::sync::broadcast;
use tracing::trace;

/// Committed ledger change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEvent {
    RoundCreated {
        depositor: AccountId,
        created_by: AccountId,
        index: usize,
        amount: Amount,
        bonus_rate_bps: BasisPoints,
        tenure_seconds: u64,
        bonus_flag: bool,
        start_timestamp: Timestamp,
    },
    RoundSettled {
        depositor: AccountId,
        index: usize,
        payout: Payout,
    },
    BatchSettled {
        depositor: AccountId,
        indices: Vec<usize>,
        principal: Amount,
        stable_reward: Amount,
        bonus_reward: Amount,
    },
    MinimumDepositChanged {
        previous: Amount,
        current: Amount,
    },
}

/// Broadcast fan-out of [`LedgerEvent`]s
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LedgerEvent>,
}

impl EventBus {
    /// `capacity` bounds how far a slow subscriber may lag before it starts
    /// missing events
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn publish(&self, event: LedgerEvent) {
        // Err only means nobody is subscribed
        if self.sender.send(event).is_err() {
            trace!("No event subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(crate::DEFAULT_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = EventBus::new(4);
        bus.publish(LedgerEvent::MinimumDepositChanged {
            previous: 0,
            current: 1,
        });
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscriber_receives() {
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe();
        bus.publish(LedgerEvent::MinimumDepositChanged {
            previous: 0,
            current: 100,
        });
        assert_eq!(
            rx.recv().await.unwrap(),
            LedgerEvent::MinimumDepositChanged {
                previous: 0,
                current: 100
            }
        );
    }

    #[test]
    fn test_event_json_shape() {
        let event = LedgerEvent::MinimumDepositChanged {
            previous: 1,
            current: 2,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["minimum_deposit_changed"]["current"], 2);
    }
}
