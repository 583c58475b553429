use crate::application_port::*;
use crate::domain_model::*;

/// Directed friendship edges, keyed by the ordered pair `(user_id, friend_id)`.
#[async_trait::async_trait]
pub trait RelationshipStore: Send + Sync {
    async fn find_edge(
        &self,
        user_id: UserId,
        friend_id: UserId,
        status: EdgeStatus,
    ) -> Result<Option<FriendshipEdge>, RelationError>;

    async fn find_edge_between(
        &self,
        user_id: UserId,
        friend_id: UserId,
    ) -> Result<Option<FriendshipEdge>, RelationError>;

    /// Insert a pending edge, or on conflict reset it to pending and refresh `updated_at`.
    async fn upsert_pending(
        &self,
        user_id: UserId,
        friend_id: UserId,
    ) -> Result<FriendshipEdge, RelationError>;

    /// Atomically flips `requester -> accepter` to active and creates or flips the mirror.
    /// Returns false when there is no pending request to accept.
    async fn accept_friend_request(
        &self,
        requester_id: UserId,
        accepter_id: UserId,
    ) -> Result<bool, RelationError>;

    /// Removes the pending `requester -> target` edge. Returns false when there is none.
    async fn reject_friend_request(
        &self,
        requester_id: UserId,
        target_id: UserId,
    ) -> Result<bool, RelationError>;

    async fn list_edges_from(
        &self,
        user_id: UserId,
        status: EdgeStatus,
    ) -> Result<Vec<FriendshipEdge>, RelationError>;

    async fn list_edges_to(
        &self,
        friend_id: UserId,
        status: EdgeStatus,
    ) -> Result<Vec<FriendshipEdge>, RelationError>;
}
