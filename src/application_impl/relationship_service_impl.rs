use crate::application_impl::{PollOutcome, RetryPolicy, poll_until};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use futures_util::future::try_join;
use std::collections::HashSet;
use std::sync::Arc;

pub struct RealRelationshipService {
    store: Arc<dyn RelationshipStore>,
    profile_repo: Arc<dyn ProfileRepo>,
    notification_service: Arc<dyn NotificationService>,
    sleeper: Arc<dyn Sleeper>,
    confirm_policy: RetryPolicy,
}

impl RealRelationshipService {
    pub fn new(
        store: Arc<dyn RelationshipStore>,
        profile_repo: Arc<dyn ProfileRepo>,
        notification_service: Arc<dyn NotificationService>,
        sleeper: Arc<dyn Sleeper>,
        confirm_policy: RetryPolicy,
    ) -> Self {
        Self {
            store,
            profile_repo,
            notification_service,
            sleeper,
            confirm_policy,
        }
    }

    async fn resolve_status(
        &self,
        me: UserId,
        other: UserId,
    ) -> Result<FriendshipStatus, RelationError> {
        let (outgoing, incoming) = try_join(
            self.store.find_edge(me, other, EdgeStatus::Active),
            self.store.find_edge(other, me, EdgeStatus::Active),
        )
        .await?;
        // a single active edge is a half-applied accept, not a friendship
        if outgoing.is_some() && incoming.is_some() {
            return Ok(FriendshipStatus::Friends);
        }

        if self
            .store
            .find_edge(me, other, EdgeStatus::Pending)
            .await?
            .is_some()
        {
            return Ok(FriendshipStatus::PendingSent);
        }

        if self
            .store
            .find_edge(other, me, EdgeStatus::Pending)
            .await?
            .is_some()
        {
            return Ok(FriendshipStatus::PendingReceived);
        }

        Ok(FriendshipStatus::None)
    }

    /// Polls until both edges read back active. The outcome is only logged by callers.
    async fn await_friendship(&self, me: UserId, other: UserId) -> AcceptOutcome {
        let outcome = poll_until(
            &self.confirm_policy,
            self.sleeper.as_ref(),
            || self.friendship_status(me, other),
            |status| *status == FriendshipStatus::Friends,
        )
        .await;

        let (mut attempts, last) = match outcome {
            PollOutcome::Satisfied { attempts, .. } => {
                return AcceptOutcome {
                    confirmed: true,
                    attempts,
                };
            }
            PollOutcome::Exhausted { attempts, last } => (attempts, last),
        };

        let Some(grace) = self.confirm_policy.final_grace else {
            tracing::warn!(%me, %other, attempts, ?last, "friendship not visible after accept");
            return AcceptOutcome {
                confirmed: false,
                attempts,
            };
        };

        self.sleeper.sleep(grace).await;
        attempts += 1;
        let last = self.friendship_status(me, other).await;
        let confirmed = last == FriendshipStatus::Friends;
        if !confirmed {
            tracing::warn!(%me, %other, attempts, ?last, "friendship not visible after final check");
        }
        AcceptOutcome {
            confirmed,
            attempts,
        }
    }

    async fn notify_best_effort(
        &self,
        actor: UserId,
        build: impl FnOnce(&PublicProfile) -> NewNotification + Send,
    ) {
        let profile = match self.profile_repo.find_profile(actor).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                tracing::warn!(%actor, "skip notification: no profile");
                return;
            }
            Err(e) => {
                tracing::warn!(%actor, "skip notification: load profile: {e}");
                return;
            }
        };

        let new = build(&profile);
        let kind = new.kind.type_name();
        if let Err(e) = self.notification_service.create_notification(new).await {
            tracing::warn!(%actor, kind, "create notification: {e}");
        }
    }

    async fn enrich(
        &self,
        edges: Vec<FriendshipEdge>,
        direction: RequestDirection,
    ) -> Result<Vec<FriendRequest>, RelationError> {
        let counterpart = |edge: &FriendshipEdge| match direction {
            RequestDirection::Incoming => edge.user_id,
            RequestDirection::Outgoing => edge.friend_id,
        };
        let ids: Vec<UserId> = edges.iter().map(counterpart).collect();
        let profiles = self.profile_repo.find_profiles(&ids).await?;

        let mut requests = Vec::with_capacity(edges.len());
        for edge in &edges {
            let user_id = counterpart(edge);
            let Some(profile) = profiles.iter().find(|p| p.user_id == user_id) else {
                tracing::debug!(%user_id, "request counterpart has no profile");
                continue;
            };
            requests.push(FriendRequest {
                user: profile.clone(),
                direction,
                requested_at: edge.updated_at,
            });
        }
        requests.sort_by(|a, b| b.requested_at.cmp(&a.requested_at));
        Ok(requests)
    }
}

#[async_trait::async_trait]
impl RelationshipService for RealRelationshipService {
    async fn friendship_status(&self, me: UserId, other: UserId) -> FriendshipStatus {
        match self.resolve_status(me, other).await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(%me, %other, "resolve friendship status: {e}");
                FriendshipStatus::None
            }
        }
    }

    async fn send_friend_request(
        &self,
        me: UserId,
        target: UserId,
    ) -> Result<SendOutcome, RelationError> {
        if me == target {
            return Err(RelationError::SelfRequest);
        }
        if self.profile_repo.find_profile(target).await?.is_none() {
            return Err(RelationError::UserNotFound);
        }

        // any other edge, blocked included, is replaced by the pending upsert
        match self.store.find_edge_between(me, target).await? {
            Some(edge) if edge.status == EdgeStatus::Active => {
                return Ok(SendOutcome::AlreadyFriends);
            }
            Some(edge) if edge.status == EdgeStatus::Pending => {
                return Ok(SendOutcome::AlreadyPending);
            }
            _ => {}
        }

        self.store.upsert_pending(me, target).await?;
        tracing::info!(%me, %target, "friend request sent");

        self.notify_best_effort(me, |sender| NewNotification::friend_request(target, sender))
            .await;

        Ok(SendOutcome::Sent)
    }

    async fn accept_friend_request(
        &self,
        me: UserId,
        requester: UserId,
    ) -> Result<AcceptOutcome, RelationError> {
        if me == requester {
            return Err(RelationError::SelfRequest);
        }

        if !self.store.accept_friend_request(requester, me).await? {
            return Err(RelationError::Declined("accept_friend_request"));
        }
        tracing::info!(%me, %requester, "friend request accepted");

        let outcome = self.await_friendship(me, requester).await;

        self.notify_best_effort(me, |accepter| {
            NewNotification::friend_request_accepted(requester, accepter)
        })
        .await;

        Ok(outcome)
    }

    async fn reject_friend_request(
        &self,
        me: UserId,
        requester: UserId,
    ) -> Result<(), RelationError> {
        if !self.store.reject_friend_request(requester, me).await? {
            return Err(RelationError::Declined("reject_friend_request"));
        }
        tracing::info!(%me, %requester, "friend request rejected");
        Ok(())
    }

    async fn cancel_friend_request(
        &self,
        me: UserId,
        friend: UserId,
    ) -> Result<(), RelationError> {
        if !self.store.reject_friend_request(me, friend).await? {
            return Err(RelationError::Declined("cancel_friend_request"));
        }
        tracing::info!(%me, %friend, "friend request cancelled");
        Ok(())
    }

    async fn list_incoming_requests(
        &self,
        me: UserId,
    ) -> Result<Vec<FriendRequest>, RelationError> {
        let edges = self.store.list_edges_to(me, EdgeStatus::Pending).await?;
        self.enrich(edges, RequestDirection::Incoming).await
    }

    async fn list_outgoing_requests(
        &self,
        me: UserId,
    ) -> Result<Vec<FriendRequest>, RelationError> {
        let edges = self.store.list_edges_from(me, EdgeStatus::Pending).await?;
        self.enrich(edges, RequestDirection::Outgoing).await
    }

    async fn list_friends(&self, me: UserId) -> Result<Vec<PublicProfile>, RelationError> {
        let (outgoing, incoming) = try_join(
            self.store.list_edges_from(me, EdgeStatus::Active),
            self.store.list_edges_to(me, EdgeStatus::Active),
        )
        .await?;

        let mirrored: HashSet<UserId> = incoming.iter().map(|e| e.user_id).collect();
        let ids: Vec<UserId> = outgoing
            .iter()
            .map(|e| e.friend_id)
            .filter(|id| mirrored.contains(id))
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut friends = self.profile_repo.find_profiles(&ids).await?;
        friends.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(friends)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::RealNotificationService;
    use crate::application_impl::retry::tests::RecordingSleeper;
    use crate::infra_memory::MemoryBackend;

    struct Fixture {
        backend: Arc<MemoryBackend>,
        sleeper: Arc<RecordingSleeper>,
        service: RealRelationshipService,
        a: UserId,
        b: UserId,
    }

    fn fixture(backend: MemoryBackend) -> Fixture {
        let backend = Arc::new(backend);
        let a = backend.add_user("alice");
        let b = backend.add_user("bob");
        let sleeper = Arc::new(RecordingSleeper::default());
        let notifications = Arc::new(RealNotificationService::new(backend.clone()));
        let service = RealRelationshipService::new(
            backend.clone(),
            backend.clone(),
            notifications,
            sleeper.clone(),
            RetryPolicy::default(),
        );
        Fixture {
            backend,
            sleeper,
            service,
            a,
            b,
        }
    }

    fn kinds(backend: &MemoryBackend, user: UserId) -> Vec<&'static str> {
        backend
            .notifications_for(user)
            .iter()
            .map(|n| n.kind.type_name())
            .collect()
    }

    #[tokio::test]
    async fn friends_requires_both_directed_edges() {
        let f = fixture(MemoryBackend::new());

        f.backend.put_edge(f.a, f.b, EdgeStatus::Active);
        assert_eq!(f.service.friendship_status(f.a, f.b).await, FriendshipStatus::None);
        assert_eq!(f.service.friendship_status(f.b, f.a).await, FriendshipStatus::None);

        f.backend.put_edge(f.b, f.a, EdgeStatus::Pending);
        assert_eq!(
            f.service.friendship_status(f.a, f.b).await,
            FriendshipStatus::PendingReceived
        );
        assert_eq!(
            f.service.friendship_status(f.b, f.a).await,
            FriendshipStatus::PendingSent
        );

        f.backend.put_edge(f.b, f.a, EdgeStatus::Active);
        assert_eq!(f.service.friendship_status(f.a, f.b).await, FriendshipStatus::Friends);
        assert_eq!(f.service.friendship_status(f.b, f.a).await, FriendshipStatus::Friends);
    }

    #[tokio::test]
    async fn read_error_resolves_to_none_even_between_friends() {
        let f = fixture(MemoryBackend::new());
        f.backend.put_edge(f.a, f.b, EdgeStatus::Active);
        f.backend.put_edge(f.b, f.a, EdgeStatus::Active);

        f.backend.set_fail_reads(true);
        assert_eq!(f.service.friendship_status(f.a, f.b).await, FriendshipStatus::None);
    }

    #[tokio::test]
    async fn send_twice_keeps_one_pending_edge_and_one_notification() {
        let f = fixture(MemoryBackend::new());

        let first = f.service.send_friend_request(f.a, f.b).await.unwrap();
        let second = f.service.send_friend_request(f.a, f.b).await.unwrap();

        assert_eq!(first, SendOutcome::Sent);
        assert_eq!(second, SendOutcome::AlreadyPending);
        assert_eq!(
            f.backend.list_edges_from(f.a, EdgeStatus::Pending).await.unwrap().len(),
            1
        );
        assert_eq!(kinds(&f.backend, f.b), vec!["friend_request"]);
    }

    #[tokio::test]
    async fn send_to_existing_friend_is_a_no_op() {
        let f = fixture(MemoryBackend::new());
        f.backend.put_edge(f.a, f.b, EdgeStatus::Active);
        f.backend.put_edge(f.b, f.a, EdgeStatus::Active);

        let outcome = f.service.send_friend_request(f.a, f.b).await.unwrap();

        assert_eq!(outcome, SendOutcome::AlreadyFriends);
        assert!(f.backend.notifications_for(f.b).is_empty());
    }

    #[tokio::test]
    async fn send_rejects_self_and_unknown_targets() {
        let f = fixture(MemoryBackend::new());
        let stranger = UserId(uuid::Uuid::new_v4());

        assert!(matches!(
            f.service.send_friend_request(f.a, f.a).await,
            Err(RelationError::SelfRequest)
        ));
        assert!(matches!(
            f.service.send_friend_request(f.a, stranger).await,
            Err(RelationError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn send_over_blocked_edge_writes_a_pending_request() {
        let f = fixture(MemoryBackend::new());
        f.backend.put_edge(f.a, f.b, EdgeStatus::Blocked);

        let outcome = f.service.send_friend_request(f.a, f.b).await.unwrap();

        assert_eq!(outcome, SendOutcome::Sent);
        assert_eq!(
            f.backend.committed_edge(f.a, f.b).map(|e| e.status),
            Some(EdgeStatus::Pending)
        );
        assert_eq!(kinds(&f.backend, f.b), vec!["friend_request"]);
    }

    #[tokio::test]
    async fn notification_failure_does_not_fail_send() {
        let f = fixture(MemoryBackend::new());
        f.backend.set_fail_notifications(true);

        let outcome = f.service.send_friend_request(f.a, f.b).await.unwrap();

        assert_eq!(outcome, SendOutcome::Sent);
        assert!(f.backend.committed_edge(f.a, f.b).is_some());
    }

    #[tokio::test]
    async fn write_failure_fails_send() {
        let f = fixture(MemoryBackend::new());
        f.backend.set_fail_writes(true);

        assert!(matches!(
            f.service.send_friend_request(f.a, f.b).await,
            Err(RelationError::Store(_))
        ));
        assert!(f.backend.notifications_for(f.b).is_empty());
    }

    #[tokio::test]
    async fn accept_confirms_on_first_read_when_store_is_consistent() {
        let f = fixture(MemoryBackend::new());
        f.service.send_friend_request(f.a, f.b).await.unwrap();

        let outcome = f.service.accept_friend_request(f.b, f.a).await.unwrap();

        assert_eq!(
            outcome,
            AcceptOutcome {
                confirmed: true,
                attempts: 1
            }
        );
        assert_eq!(f.sleeper.delays_ms(), vec![1000]);
        assert_eq!(kinds(&f.backend, f.a), vec!["friend_request_accepted"]);
    }

    #[tokio::test]
    async fn accept_backs_off_until_both_edges_are_visible() {
        // a failed status check reads each pair twice
        let f = fixture(MemoryBackend::new().with_read_lag(4));
        f.backend.put_edge(f.a, f.b, EdgeStatus::Pending);

        let outcome = f.service.accept_friend_request(f.b, f.a).await.unwrap();

        assert_eq!(
            outcome,
            AcceptOutcome {
                confirmed: true,
                attempts: 3
            }
        );
        assert_eq!(f.sleeper.delays_ms(), vec![1000, 2000, 4000]);
    }

    #[tokio::test]
    async fn accept_succeeds_unconfirmed_after_bounded_retries() {
        let f = fixture(MemoryBackend::new().with_read_lag(1000));
        f.backend.put_edge(f.a, f.b, EdgeStatus::Pending);

        let outcome = f.service.accept_friend_request(f.b, f.a).await.unwrap();

        assert_eq!(
            outcome,
            AcceptOutcome {
                confirmed: false,
                attempts: 6
            }
        );
        // five backoff probes, then the fixed grace before the final check
        assert_eq!(
            f.sleeper.delays_ms(),
            vec![1000, 2000, 4000, 8000, 16000, 2000]
        );
        assert_eq!(kinds(&f.backend, f.a), vec!["friend_request_accepted"]);
    }

    #[tokio::test]
    async fn accept_without_pending_request_is_declined() {
        let f = fixture(MemoryBackend::new());

        assert!(matches!(
            f.service.accept_friend_request(f.b, f.a).await,
            Err(RelationError::Declined(_))
        ));
        assert!(f.sleeper.delays_ms().is_empty());
        assert!(f.backend.notifications_for(f.a).is_empty());
    }

    #[tokio::test]
    async fn accept_store_error_propagates() {
        let f = fixture(MemoryBackend::new());
        f.backend.put_edge(f.a, f.b, EdgeStatus::Pending);
        f.backend.set_fail_writes(true);

        assert!(matches!(
            f.service.accept_friend_request(f.b, f.a).await,
            Err(RelationError::Store(_))
        ));
    }

    #[tokio::test]
    async fn reject_and_cancel_need_a_pending_edge_in_their_direction() {
        let f = fixture(MemoryBackend::new());
        f.backend.put_edge(f.a, f.b, EdgeStatus::Pending);

        // b cannot cancel a request it never sent
        assert!(matches!(
            f.service.cancel_friend_request(f.b, f.a).await,
            Err(RelationError::Declined(_))
        ));
        // a cannot reject its own outgoing request
        assert!(matches!(
            f.service.reject_friend_request(f.a, f.b).await,
            Err(RelationError::Declined(_))
        ));

        f.service.reject_friend_request(f.b, f.a).await.unwrap();
        assert!(f.backend.committed_edge(f.a, f.b).is_none());
    }

    #[tokio::test]
    async fn lists_requests_from_each_side_with_profiles() {
        let f = fixture(MemoryBackend::new());
        let carol = f.backend.add_user("carol");
        f.service.send_friend_request(f.a, f.b).await.unwrap();
        f.service.send_friend_request(carol, f.b).await.unwrap();

        let incoming = f.service.list_incoming_requests(f.b).await.unwrap();
        let mut names: Vec<&str> = incoming.iter().map(|r| r.user.username.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["alice", "carol"]);
        assert!(incoming
            .iter()
            .all(|r| r.direction == RequestDirection::Incoming));

        let outgoing = f.service.list_outgoing_requests(f.a).await.unwrap();
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].counterpart(), f.b);
        assert_eq!(outgoing[0].direction, RequestDirection::Outgoing);
    }

    #[tokio::test]
    async fn friends_list_only_holds_mutual_edges() {
        let f = fixture(MemoryBackend::new());
        let carol = f.backend.add_user("carol");
        f.backend.put_edge(f.a, f.b, EdgeStatus::Active);
        f.backend.put_edge(f.b, f.a, EdgeStatus::Active);
        f.backend.put_edge(f.a, carol, EdgeStatus::Active);

        let friends = f.service.list_friends(f.a).await.unwrap();

        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0].user_id, f.b);
        assert!(f.service.list_friends(carol).await.unwrap().is_empty());
    }
}
