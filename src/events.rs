//! In-process event bus with optional NATS forwarding.

use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::domain::events::DomainEvent;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<DomainEvent>,
    nats: Option<async_nats::Client>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender, nats: None }
    }

    pub fn with_nats(mut self, client: async_nats::Client) -> Self {
        self.nats = Some(client);
        self
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }

    /// Delivery is best effort: a bus with no subscribers and a NATS outage
    /// are both logged and otherwise ignored.
    pub async fn publish(&self, event: DomainEvent) {
        debug!(subject = event.subject(), ?event, "publishing event");
        if let Some(nats) = &self.nats {
            match serde_json::to_vec(&event) {
                Ok(payload) => {
                    if let Err(e) = nats.publish(event.subject().to_string(), payload.into()).await {
                        warn!(error = %e, subject = event.subject(), "failed to forward event to NATS");
                    }
                }
                Err(e) => warn!(error = %e, "failed to serialize event"),
            }
        }
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self { Self::new(256) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::events::InventoryEvent;

    #[tokio::test]
    async fn test_subscribers_receive_events() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        bus.publish(DomainEvent::Inventory(InventoryEvent::AlertResolved { alert_id: "alert-001".into() })).await;
        let got = rx.recv().await.unwrap();
        assert_eq!(got.subject(), "fashun.inventory");
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_noop() {
        let bus = EventBus::new(0);
        bus.publish(DomainEvent::Inventory(InventoryEvent::TransferCreated { transfer_id: "tr-1".into() })).await;
    }
}
