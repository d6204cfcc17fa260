use serde::Serialize;
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    Notifications,
    Messages,
}

impl Topic {
    pub const ALL: [Topic; 2] = [Topic::Notifications, Topic::Messages];
}

/// "Something changed for this user under this topic". Events carry no
/// payload: subscribers re-fetch the current state and replace what they
/// hold, so duplicate or coalesced deliveries are harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeEvent {
    pub user_id: Uuid,
    pub topic: Topic,
}

#[derive(Clone)]
pub struct RealtimeHub {
    tx: broadcast::Sender<ChangeEvent>,
}

impl RealtimeHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, user_id: Uuid, topic: Topic) {
        // No receivers just means nobody is online.
        let delivered = self.tx.send(ChangeEvent { user_id, topic }).unwrap_or(0);
        tracing::trace!(%user_id, ?topic, delivered, "realtime event published");
    }

    pub fn publish_many(&self, user_ids: &[Uuid], topic: Topic) {
        for user_id in user_ids {
            self.publish(*user_id, topic);
        }
    }

    pub fn subscribe(&self, user_id: Uuid) -> Subscription {
        Subscription {
            user_id,
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new(256)
    }
}

pub struct Subscription {
    user_id: Uuid,
    rx: broadcast::Receiver<ChangeEvent>,
}

impl Subscription {
    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    /// Waits for the next change addressed to this user and returns the
    /// topics to refresh. After falling behind, every topic is returned.
    /// `None` once the hub is gone.
    pub async fn next(&mut self) -> Option<Vec<Topic>> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.user_id == self.user_id => return Some(vec![event.topic]),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(user_id = %self.user_id, skipped, "realtime subscriber lagged");
                    return Some(Topic::ALL.to_vec());
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_only_own_events() {
        let hub = RealtimeHub::new(16);
        let me = Uuid::new_v4();
        let mut sub = hub.subscribe(me);

        hub.publish(Uuid::new_v4(), Topic::Messages);
        hub.publish(me, Topic::Notifications);

        assert_eq!(sub.next().await, Some(vec![Topic::Notifications]));
    }

    #[tokio::test]
    async fn lagging_asks_for_full_refresh() {
        let hub = RealtimeHub::new(2);
        let me = Uuid::new_v4();
        let mut sub = hub.subscribe(me);

        for _ in 0..5 {
            hub.publish(me, Topic::Messages);
        }

        assert_eq!(sub.next().await, Some(Topic::ALL.to_vec()));
    }

    #[tokio::test]
    async fn closes_with_hub() {
        let hub = RealtimeHub::new(4);
        let mut sub = hub.subscribe(Uuid::new_v4());
        drop(hub);
        assert_eq!(sub.next().await, None);
    }

    #[test]
    fn publishing_without_subscribers_is_fine() {
        let hub = RealtimeHub::default();
        hub.publish(Uuid::new_v4(), Topic::Messages);
        assert_eq!(hub.subscriber_count(), 0);
    }
}
