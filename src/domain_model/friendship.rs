use crate::domain_model::{PublicProfile, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStatus {
    Pending,
    Active,
    Blocked,
}

impl EdgeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeStatus::Pending => "pending",
            EdgeStatus::Active => "active",
            EdgeStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for EdgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EdgeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EdgeStatus::Pending),
            "active" => Ok(EdgeStatus::Active),
            "blocked" => Ok(EdgeStatus::Blocked),
            other => Err(format!("unknown edge status: {other}")),
        }
    }
}

/// A directed row `user_id -> friend_id`. A mutual friendship is two active edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendshipEdge {
    pub user_id: UserId,
    pub friend_id: UserId,
    pub status: EdgeStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Relationship between the caller and another user, derived from both directed edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendshipStatus {
    Friends,
    PendingSent,
    PendingReceived,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestDirection {
    Incoming,
    Outgoing,
}

/// A pending edge seen from one side, enriched with the counterpart's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRequest {
    pub user: PublicProfile,
    pub direction: RequestDirection,
    pub requested_at: DateTime<Utc>,
}

impl FriendRequest {
    pub fn counterpart(&self) -> UserId {
        self.user.user_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SendOutcome {
    Sent,
    AlreadyPending,
    AlreadyFriends,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AcceptOutcome {
    /// Whether a read observed both edges active before giving up.
    pub confirmed: bool,
    /// Status reads spent on confirmation, including the final check.
    pub attempts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_status_parses_its_own_text() {
        for status in [EdgeStatus::Pending, EdgeStatus::Active, EdgeStatus::Blocked] {
            assert_eq!(status.as_str().parse::<EdgeStatus>(), Ok(status));
        }
        assert!("accepted".parse::<EdgeStatus>().is_err());
    }

    #[test]
    fn friendship_status_serializes_snake_case() {
        let json = serde_json::to_string(&FriendshipStatus::PendingReceived).unwrap();
        assert_eq!(json, "\"pending_received\"");
    }
}
