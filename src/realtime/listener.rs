use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{RealtimeEvent, StoreDirector};

/// Background task feeding realtime events into a [`StoreDirector`].
///
/// Events are applied one at a time in arrival order. The task ends when
/// every sender of the channel has been dropped.
pub struct RealtimeListener {
    handle: JoinHandle<usize>,
}

impl RealtimeListener {
    pub fn spawn(director: Arc<StoreDirector>, mut receiver: mpsc::Receiver<RealtimeEvent>) -> Self {
        let handle = tokio::spawn(async move {
            let mut handled = 0;
            while let Some(event) = receiver.recv().await {
                debug!("Realtime event received: {}", event.event_type());
                // Failures are logged by the director, the next event may succeed
                let _ = director.dispatch(&event).await;
                handled += 1;
            }
            info!("Realtime channel closed after {} events", handled);
            handled
        });
        Self { handle }
    }

    /// Waits for the channel to close. Returns the number of events handled.
    pub async fn join(self) -> Result<usize> {
        Ok(self.handle.await?)
    }

    pub fn abort(&self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::notifications::{Notification, StorePredicate};
    use crate::remote::{InMemoryNotificationBackend, RemoteCollaborators};

    #[tokio::test]
    async fn test_listener_applies_events_until_channel_closes() {
        let backend = Arc::new(InMemoryNotificationBackend::new(vec![
            Notification::new("a", "Title", 1700000100),
            Notification::new("b", "Title", 1700000000),
        ]));
        let director = Arc::new(StoreDirector::new(
            RemoteCollaborators::from_backend(backend.clone()),
            StoreConfig::default(),
        ));
        let store = director.with_predicate(StorePredicate::new());
        store.refresh().await.unwrap();

        let (sender, receiver) = mpsc::channel(8);
        let listener = RealtimeListener::spawn(director.clone(), receiver);

        backend.remove("a");
        sender
            .send(RealtimeEvent::NotificationDeleted { id: "a".to_string() })
            .await
            .unwrap();
        backend.insert_newest(Notification::new("c", "Title", 1700000200));
        sender
            .send(RealtimeEvent::NotificationCreated { id: "c".to_string() })
            .await
            .unwrap();
        drop(sender);

        assert_eq!(listener.join().await.unwrap(), 2);
        let ids: Vec<String> = store.notifications().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec!["c", "b"]);
    }
}
