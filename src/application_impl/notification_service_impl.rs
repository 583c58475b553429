use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use std::sync::Arc;

pub struct RealNotificationService {
    repo: Arc<dyn NotificationRepo>,
    publisher: Option<Arc<dyn NotificationPublisher>>,
}

impl RealNotificationService {
    pub fn new(repo: Arc<dyn NotificationRepo>) -> Self {
        Self {
            repo,
            publisher: None,
        }
    }

    /// Push each created notification to the recipient's real-time channel.
    pub fn with_publisher(mut self, publisher: Arc<dyn NotificationPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }
}

#[async_trait::async_trait]
impl NotificationService for RealNotificationService {
    async fn create_notification(
        &self,
        new: NewNotification,
    ) -> Result<Notification, NotificationError> {
        let notification = Notification::new(new);
        self.repo.insert(&notification).await?;
        tracing::debug!(
            id = %notification.id,
            recipient = %notification.user_id,
            kind = notification.kind.type_name(),
            "notification created"
        );

        // the row is the source of truth; a missed push is picked up on next list
        if let Some(publisher) = &self.publisher {
            if let Err(e) = publisher.publish(&notification).await {
                tracing::warn!(id = %notification.id, "publish notification: {e}");
            }
        }

        Ok(notification)
    }

    async fn list_notifications(
        &self,
        me: UserId,
        page_size: PageSize,
        unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationError> {
        self.repo.list_for(me, page_size, unread_only).await
    }

    async fn mark_read(&self, me: UserId, id: NotificationId) -> Result<(), NotificationError> {
        if !self.repo.mark_read(me, id).await? {
            return Err(NotificationError::NotFound);
        }
        Ok(())
    }

    async fn mark_all_read(&self, me: UserId) -> Result<u64, NotificationError> {
        self.repo.mark_all_read(me).await
    }

    async fn delete_notification(
        &self,
        me: UserId,
        id: NotificationId,
    ) -> Result<(), NotificationError> {
        if !self.repo.delete(me, id).await? {
            return Err(NotificationError::NotFound);
        }
        Ok(())
    }

    async fn unread_count(&self, me: UserId) -> Result<u64, NotificationError> {
        self.repo.count_unread(me).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::MemoryBackend;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CapturingPublisher {
        fail: bool,
        published: Mutex<Vec<NotificationId>>,
    }

    #[async_trait::async_trait]
    impl NotificationPublisher for CapturingPublisher {
        async fn publish(&self, notification: &Notification) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("channel closed");
            }
            self.published.lock().unwrap().push(notification.id);
            Ok(())
        }
    }

    fn setup(
        publisher: Arc<CapturingPublisher>,
    ) -> (Arc<MemoryBackend>, RealNotificationService, UserId, PublicProfile) {
        let backend = Arc::new(MemoryBackend::new());
        let me = backend.add_user("me");
        let sender = PublicProfile {
            user_id: backend.add_user("sender"),
            username: "sender".to_string(),
            name: Some("Sender".to_string()),
            avatar_url: None,
        };
        let service = RealNotificationService::new(backend.clone()).with_publisher(publisher);
        (backend, service, me, sender)
    }

    #[tokio::test]
    async fn created_notification_is_stored_unread_and_published() {
        let publisher = Arc::new(CapturingPublisher::default());
        let (_backend, service, me, sender) = setup(publisher.clone());

        let n = service
            .create_notification(NewNotification::friend_request(me, &sender))
            .await
            .unwrap();

        assert!(!n.read);
        assert_eq!(*publisher.published.lock().unwrap(), vec![n.id]);
        assert_eq!(service.unread_count(me).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn publish_failure_does_not_fail_creation() {
        let publisher = Arc::new(CapturingPublisher {
            fail: true,
            ..Default::default()
        });
        let (_backend, service, me, sender) = setup(publisher);

        let n = service
            .create_notification(NewNotification::friend_request(me, &sender))
            .await
            .unwrap();
        let listed = service
            .list_notifications(me, PageSize::default(), false)
            .await
            .unwrap();
        assert_eq!(listed, vec![n]);
    }

    #[tokio::test]
    async fn read_and_delete_unknown_ids_are_not_found() {
        let (_backend, service, me, _) = setup(Arc::new(CapturingPublisher::default()));
        let missing = NotificationId(uuid::Uuid::new_v4());

        assert!(matches!(
            service.mark_read(me, missing).await,
            Err(NotificationError::NotFound)
        ));
        assert!(matches!(
            service.delete_notification(me, missing).await,
            Err(NotificationError::NotFound)
        ));
    }

    #[tokio::test]
    async fn unread_filter_and_mark_all_read() {
        let (_backend, service, me, sender) = setup(Arc::new(CapturingPublisher::default()));
        let first = service
            .create_notification(NewNotification::friend_request(me, &sender))
            .await
            .unwrap();
        service
            .create_notification(NewNotification::friend_request_accepted(me, &sender))
            .await
            .unwrap();

        service.mark_read(me, first.id).await.unwrap();
        let unread = service
            .list_notifications(me, PageSize::default(), true)
            .await
            .unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].kind.type_name(), "friend_request_accepted");

        assert_eq!(service.mark_all_read(me).await.unwrap(), 1);
        assert_eq!(service.unread_count(me).await.unwrap(), 0);
    }
}
