use super::{Parser, Subcommand};
use crate::application_impl::get_fake_id;
use crate::domain_model::{NotificationId, UserId};
use std::convert::Infallible;
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(
    name = "rapport",
    about = "Friend requests and notifications",
    after_help = "With the memory store nothing persists between commands; only the seeded users have profiles."
)]
pub struct Cli {
    #[arg(long)]
    pub settings: Option<String>,

    /// Act as this user (fake session backend). A UUID or a username.
    #[arg(long = "as", value_name = "USER")]
    pub as_user: Option<UserRef>,

    /// Access token (jwt session backend).
    #[arg(long)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Relationship with another user.
    Status { other: UserRef },
    Send { target: UserRef },
    Accept { requester: UserRef },
    Reject { requester: UserRef },
    Cancel { friend: UserRef },
    /// Incoming and outgoing pending requests.
    Requests,
    Friends,
    Notifications {
        #[arg(long)]
        unread: bool,
        #[arg(long, default_value_t = 50)]
        limit: u16,
    },
    Read { id: NotificationId },
    ReadAll,
    DeleteNotification { id: NotificationId },
}

/// A user given on the command line, either by id or by username.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserRef(pub UserId);

impl FromStr for UserRef {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(UserRef(
            s.parse::<UserId>().unwrap_or_else(|_| get_fake_id(s)),
        ))
    }
}
