use crate::domain_model::*;

#[derive(Debug, thiserror::Error)]
pub enum RelationError {
    #[error("user not found")]
    UserNotFound,
    #[error("cannot send a friend request to yourself")]
    SelfRequest,
    #[error("{0} was not applied")]
    Declined(&'static str),
    #[error("store error: {0}")]
    Store(String),
}

#[async_trait::async_trait]
pub trait RelationshipService: Send + Sync {
    /// Never fails: a read error resolves to [`FriendshipStatus::None`].
    async fn friendship_status(&self, me: UserId, other: UserId) -> FriendshipStatus;
    async fn send_friend_request(
        &self,
        me: UserId,
        target: UserId,
    ) -> Result<SendOutcome, RelationError>;
    async fn accept_friend_request(
        &self,
        me: UserId,
        requester: UserId,
    ) -> Result<AcceptOutcome, RelationError>;
    async fn reject_friend_request(
        &self,
        me: UserId,
        requester: UserId,
    ) -> Result<(), RelationError>;
    async fn cancel_friend_request(&self, me: UserId, friend: UserId)
    -> Result<(), RelationError>;
    async fn list_incoming_requests(&self, me: UserId)
    -> Result<Vec<FriendRequest>, RelationError>;
    async fn list_outgoing_requests(&self, me: UserId)
    -> Result<Vec<FriendRequest>, RelationError>;
    async fn list_friends(&self, me: UserId) -> Result<Vec<PublicProfile>, RelationError>;
}
