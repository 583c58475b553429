use crate::domain_model::{PublicProfile, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct NotificationId(pub uuid::Uuid);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for NotificationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::parse_str(s).map(NotificationId)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum NotificationKind {
    FriendRequest(FriendRequestSent),
    FriendRequestAccepted(FriendRequestAccepted),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRequestSent {
    pub sender_id: UserId,
    pub sender_name: String,
    pub sender_username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRequestAccepted {
    pub accepter_id: UserId,
    pub accepter_name: String,
    pub accepter_username: String,
}

impl NotificationKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            NotificationKind::FriendRequest(_) => "friend_request",
            NotificationKind::FriendRequestAccepted(_) => "friend_request_accepted",
        }
    }

    /// Payload without the type tag, as kept in a `data` column.
    pub fn data(&self) -> serde_json::Result<serde_json::Value> {
        match self {
            NotificationKind::FriendRequest(data) => serde_json::to_value(data),
            NotificationKind::FriendRequestAccepted(data) => serde_json::to_value(data),
        }
    }

    pub fn from_parts(type_name: &str, data: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(serde_json::json!({ "type": type_name, "data": data }))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewNotification {
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
}

impl NewNotification {
    pub fn friend_request(to: UserId, sender: &PublicProfile) -> Self {
        let name = sender.display_name().to_string();
        Self {
            user_id: to,
            title: "New Friend Request".to_string(),
            body: format!("{name} sent you a friend request"),
            kind: NotificationKind::FriendRequest(FriendRequestSent {
                sender_id: sender.user_id,
                sender_name: name,
                sender_username: sender.username.clone(),
            }),
        }
    }

    pub fn friend_request_accepted(to: UserId, accepter: &PublicProfile) -> Self {
        let name = accepter.display_name().to_string();
        Self {
            user_id: to,
            title: "Friend Request Accepted".to_string(),
            body: format!("{name} accepted your friend request"),
            kind: NotificationKind::FriendRequestAccepted(FriendRequestAccepted {
                accepter_id: accepter.user_id,
                accepter_name: name,
                accepter_username: accepter.username.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    #[serde(flatten)]
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(new: NewNotification) -> Self {
        Self {
            id: NotificationId(uuid::Uuid::new_v4()),
            user_id: new.user_id,
            kind: new.kind,
            title: new.title,
            body: new.body,
            read: false,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(username: &str, name: Option<&str>) -> PublicProfile {
        PublicProfile {
            user_id: UserId(uuid::Uuid::new_v4()),
            username: username.to_string(),
            name: name.map(str::to_string),
            avatar_url: None,
        }
    }

    #[test]
    fn friend_request_carries_sender_fields() {
        let sender = profile("bob", Some("Bob"));
        let to = UserId(uuid::Uuid::new_v4());
        let new = NewNotification::friend_request(to, &sender);

        assert_eq!(new.user_id, to);
        assert_eq!(new.kind.type_name(), "friend_request");
        assert_eq!(new.body, "Bob sent you a friend request");
        match new.kind {
            NotificationKind::FriendRequest(data) => {
                assert_eq!(data.sender_id, sender.user_id);
                assert_eq!(data.sender_username, "bob");
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn kind_rebuilds_from_type_and_data_columns() {
        let accepter = profile("carol", None);
        let kind = NewNotification::friend_request_accepted(UserId(uuid::Uuid::nil()), &accepter).kind;

        let data = kind.data().unwrap();
        assert!(data.get("type").is_none());
        let rebuilt = NotificationKind::from_parts(kind.type_name(), data).unwrap();
        assert_eq!(rebuilt, kind);

        assert!(NotificationKind::from_parts("poke", serde_json::json!({})).is_err());
    }

    #[test]
    fn notification_json_is_flat_with_type_tag() {
        let n = Notification::new(NewNotification::friend_request(
            UserId(uuid::Uuid::nil()),
            &profile("dave", None),
        ));
        let json = serde_json::to_value(&n).unwrap();
        assert_eq!(json["type"], "friend_request");
        assert_eq!(json["data"]["sender_name"], "dave");
        assert_eq!(json["read"], false);
    }
}
