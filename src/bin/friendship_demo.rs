use rapport::application_impl::*;
use rapport::application_port::*;
use rapport::client::FriendsClient;
use rapport::domain_model::*;
use rapport::domain_port::TokioSleeper;
use rapport::infra_memory::MemoryBackend;
use rapport::logger::*;
use std::sync::Arc;
use std::time::Duration;

// Walks alice and bob through a request, an accept against a lagging store,
// and the notifications each side ends up with.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logger = Logger::new_bootstrap();
    logger.reload_from_config(&LogConfig {
        filter: "info,rapport=debug".to_string(),
    })?;

    let backend = Arc::new(MemoryBackend::new().with_read_lag(2));
    let alice = backend.add_user("alice");
    let bob = backend.add_user("bob");

    let notifications: Arc<dyn NotificationService> =
        Arc::new(RealNotificationService::new(backend.clone()));
    let relationships: Arc<dyn RelationshipService> = Arc::new(RealRelationshipService::new(
        backend.clone(),
        backend.clone(),
        notifications.clone(),
        Arc::new(TokioSleeper),
        RetryPolicy {
            max_attempts: 5,
            base_delay: Duration::from_millis(50),
            final_grace: Some(Duration::from_millis(100)),
        },
    ));

    let session = Arc::new(FakeSessionService::signed_in(alice));
    let client = FriendsClient::new(session.clone(), relationships.clone());

    let sent = client.send_friend_request(bob).await;
    let status = client.friendship_status(bob).await;
    info!(sent, ?status, "alice -> bob");

    session.switch_to(Some(bob));
    for request in client.refresh_pending().await? {
        info!(from = %request.user.display_name(), direction = ?request.direction, "bob has request");
    }
    let accepted = client.accept_friend_request(alice).await?;
    let status = client.friendship_status(alice).await;
    info!(accepted, ?status, "bob accepted");

    for user in [alice, bob] {
        for n in notifications.list_notifications(user, PageSize::default(), false).await? {
            info!(%user, title = %n.title, body = %n.body, "notification");
        }
    }

    Ok(())
}
