use crate::application_port::*;
use crate::domain_model::*;
use std::sync::{Arc, Mutex};

/// Session-bound view over [`RelationshipService`] for a signed-in user.
///
/// Mutations report plain success flags and log failures. The local list of
/// pending requests changes only after the store confirmed an operation.
pub struct FriendsClient {
    session: Arc<dyn SessionService>,
    relationships: Arc<dyn RelationshipService>,
    pending: Mutex<Vec<FriendRequest>>,
}

impl FriendsClient {
    pub fn new(
        session: Arc<dyn SessionService>,
        relationships: Arc<dyn RelationshipService>,
    ) -> Self {
        Self {
            session,
            relationships,
            pending: Mutex::new(Vec::new()),
        }
    }

    async fn me(&self, op: &'static str) -> Option<UserId> {
        match self.session.current_user().await {
            Ok(me) => Some(me),
            Err(e) => {
                tracing::warn!(op, "no session: {e}");
                None
            }
        }
    }

    fn forget(&self, other: UserId, direction: RequestDirection) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.retain(|r| !(r.counterpart() == other && r.direction == direction));
        }
    }

    pub async fn friendship_status(&self, other: UserId) -> FriendshipStatus {
        match self.me("friendship_status").await {
            Some(me) => self.relationships.friendship_status(me, other).await,
            None => FriendshipStatus::None,
        }
    }

    pub async fn send_friend_request(&self, target: UserId) -> bool {
        let Some(me) = self.me("send_friend_request").await else {
            return false;
        };
        match self.relationships.send_friend_request(me, target).await {
            Ok(outcome) => {
                tracing::debug!(%target, ?outcome, "friend request sent");
                true
            }
            Err(e) => {
                tracing::warn!(%target, "send friend request: {e}");
                false
            }
        }
    }

    /// An unconfirmed accept still counts as success; only auth failure is an error.
    pub async fn accept_friend_request(&self, requester: UserId) -> Result<bool, AuthError> {
        let me = self.session.current_user().await?;
        match self.relationships.accept_friend_request(me, requester).await {
            Ok(outcome) => {
                if !outcome.confirmed {
                    tracing::info!(%requester, attempts = outcome.attempts, "accept not yet visible");
                }
                self.forget(requester, RequestDirection::Incoming);
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(%requester, "accept friend request: {e}");
                Ok(false)
            }
        }
    }

    pub async fn reject_friend_request(&self, requester: UserId) -> bool {
        let Some(me) = self.me("reject_friend_request").await else {
            return false;
        };
        match self.relationships.reject_friend_request(me, requester).await {
            Ok(()) => {
                self.forget(requester, RequestDirection::Incoming);
                true
            }
            Err(e) => {
                tracing::warn!(%requester, "reject friend request: {e}");
                false
            }
        }
    }

    pub async fn cancel_friend_request(&self, friend: UserId) -> bool {
        let Some(me) = self.me("cancel_friend_request").await else {
            return false;
        };
        match self.relationships.cancel_friend_request(me, friend).await {
            Ok(()) => {
                self.forget(friend, RequestDirection::Outgoing);
                true
            }
            Err(e) => {
                tracing::warn!(%friend, "cancel friend request: {e}");
                false
            }
        }
    }

    /// Replaces the local list with incoming then outgoing requests from the store.
    pub async fn refresh_pending(&self) -> Result<Vec<FriendRequest>, RelationError> {
        let me = self
            .session
            .current_user()
            .await
            .map_err(|e| RelationError::Store(format!("session: {e}")))?;

        let mut requests = self.relationships.list_incoming_requests(me).await?;
        requests.extend(self.relationships.list_outgoing_requests(me).await?);

        if let Ok(mut pending) = self.pending.lock() {
            *pending = requests.clone();
        }
        Ok(requests)
    }

    pub fn pending_requests(&self) -> Vec<FriendRequest> {
        self.pending
            .lock()
            .map(|pending| pending.clone())
            .unwrap_or_default()
    }

    pub async fn list_friends(&self) -> Result<Vec<PublicProfile>, RelationError> {
        let me = self
            .session
            .current_user()
            .await
            .map_err(|e| RelationError::Store(format!("session: {e}")))?;
        self.relationships.list_friends(me).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::*;
    use crate::domain_port::TokioSleeper;
    use crate::infra_memory::MemoryBackend;
    use std::time::Duration;

    struct Fixture {
        backend: Arc<MemoryBackend>,
        session: Arc<FakeSessionService>,
        client: FriendsClient,
        alice: UserId,
        bob: UserId,
    }

    fn fixture() -> Fixture {
        let backend = Arc::new(MemoryBackend::new());
        let alice = backend.add_user("alice");
        let bob = backend.add_user("bob");
        let notifications = Arc::new(RealNotificationService::new(backend.clone()));
        let relationships = Arc::new(RealRelationshipService::new(
            backend.clone(),
            backend.clone(),
            notifications,
            Arc::new(TokioSleeper),
            RetryPolicy {
                max_attempts: 2,
                base_delay: Duration::ZERO,
                final_grace: None,
            },
        ));
        let session = Arc::new(FakeSessionService::signed_in(bob));
        let client = FriendsClient::new(session.clone(), relationships);
        Fixture {
            backend,
            session,
            client,
            alice,
            bob,
        }
    }

    #[tokio::test]
    async fn signed_out_client_never_touches_the_store() {
        let f = fixture();
        f.session.switch_to(None);

        assert!(!f.client.send_friend_request(f.alice).await);
        assert!(!f.client.cancel_friend_request(f.alice).await);
        assert!(!f.client.reject_friend_request(f.alice).await);
        assert!(matches!(
            f.client.accept_friend_request(f.alice).await,
            Err(AuthError::NotSignedIn)
        ));
        assert_eq!(
            f.client.friendship_status(f.alice).await,
            FriendshipStatus::None
        );
        assert!(f.backend.committed_edge(f.bob, f.alice).is_none());
    }

    #[tokio::test]
    async fn accept_removes_the_request_from_the_local_list() {
        let f = fixture();
        f.backend.put_edge(f.alice, f.bob, EdgeStatus::Pending);

        let pending = f.client.refresh_pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].direction, RequestDirection::Incoming);

        assert!(f.client.accept_friend_request(f.alice).await.unwrap());
        assert!(f.client.pending_requests().is_empty());
        assert_eq!(
            f.client.friendship_status(f.alice).await,
            FriendshipStatus::Friends
        );
    }

    #[tokio::test]
    async fn failed_reject_keeps_the_local_list() {
        let f = fixture();
        f.backend.put_edge(f.alice, f.bob, EdgeStatus::Pending);
        f.client.refresh_pending().await.unwrap();

        f.backend.set_fail_writes(true);
        assert!(!f.client.reject_friend_request(f.alice).await);
        assert_eq!(f.client.pending_requests().len(), 1);

        f.backend.set_fail_writes(false);
        assert!(f.client.reject_friend_request(f.alice).await);
        assert!(f.client.pending_requests().is_empty());
    }

    #[tokio::test]
    async fn cancel_only_drops_the_outgoing_entry() {
        let f = fixture();
        let carol = f.backend.add_user("carol");
        f.backend.put_edge(carol, f.bob, EdgeStatus::Pending);
        assert!(f.client.send_friend_request(f.alice).await);
        assert_eq!(f.client.refresh_pending().await.unwrap().len(), 2);

        assert!(f.client.cancel_friend_request(f.alice).await);
        let left = f.client.pending_requests();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].counterpart(), carol);
    }

    #[tokio::test]
    async fn send_succeeds_over_a_blocked_edge() {
        let f = fixture();
        f.backend.put_edge(f.bob, f.alice, EdgeStatus::Blocked);

        assert!(f.client.send_friend_request(f.alice).await);
        assert_eq!(
            f.backend.committed_edge(f.bob, f.alice).map(|e| e.status),
            Some(EdgeStatus::Pending)
        );
    }

    #[tokio::test]
    async fn accept_store_failure_is_false_not_an_error() {
        let f = fixture();
        f.backend.put_edge(f.alice, f.bob, EdgeStatus::Pending);
        f.backend.set_fail_writes(true);

        assert!(!f.client.accept_friend_request(f.alice).await.unwrap());
    }
}
