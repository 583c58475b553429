use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

type EdgeKey = (UserId, UserId);

/// One ordered pair. After a write, readers keep seeing `stale` for `stale_reads` reads.
#[derive(Default)]
struct EdgeSlot {
    current: Option<FriendshipEdge>,
    stale: Option<FriendshipEdge>,
    stale_reads: u32,
}

impl EdgeSlot {
    fn observe(&mut self) -> Option<FriendshipEdge> {
        if self.stale_reads > 0 {
            self.stale_reads -= 1;
            return self.stale.clone();
        }
        self.current.clone()
    }
}

/// In-process stand-in for the hosted backend: relationship table, profiles and
/// notifications, with replication lag and failures that tests can switch on.
#[derive(Default)]
pub struct MemoryBackend {
    edges: DashMap<EdgeKey, EdgeSlot>,
    profiles: DashMap<UserId, PublicProfile>,
    notifications: DashMap<NotificationId, Notification>,
    // serializes multi-row writes so accept/reject stay all-or-nothing
    write_lock: Mutex<()>,
    read_lag: AtomicU32,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    fail_notifications: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every edge write stays invisible to the next `reads` reads of that pair.
    pub fn with_read_lag(self, reads: u32) -> Self {
        self.read_lag.store(reads, Ordering::SeqCst);
        self
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_notifications(&self, fail: bool) {
        self.fail_notifications.store(fail, Ordering::SeqCst);
    }

    pub fn add_profile(&self, profile: PublicProfile) {
        self.profiles.insert(profile.user_id, profile);
    }

    pub fn add_user(&self, username: &str) -> UserId {
        let user_id = UserId(uuid::Uuid::new_v4());
        self.add_profile(PublicProfile {
            user_id,
            username: username.to_string(),
            name: None,
            avatar_url: None,
        });
        user_id
    }

    /// Writes an edge directly, bypassing lag. For seeding fixtures.
    pub fn put_edge(&self, user_id: UserId, friend_id: UserId, status: EdgeStatus) {
        let now = Utc::now();
        self.edges.insert(
            (user_id, friend_id),
            EdgeSlot {
                current: Some(FriendshipEdge {
                    user_id,
                    friend_id,
                    status,
                    created_at: now,
                    updated_at: now,
                }),
                ..Default::default()
            },
        );
    }

    /// Committed state of a pair, ignoring lag.
    pub fn committed_edge(&self, user_id: UserId, friend_id: UserId) -> Option<FriendshipEdge> {
        self.edges
            .get(&(user_id, friend_id))
            .and_then(|slot| slot.current.clone())
    }

    pub fn notifications_for(&self, user_id: UserId) -> Vec<Notification> {
        self.notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .map(|n| n.value().clone())
            .collect()
    }

    fn check_read(&self) -> Result<(), RelationError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RelationError::Store("injected read failure".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), RelationError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RelationError::Store("injected write failure".to_string()));
        }
        Ok(())
    }

    fn check_notifications(&self) -> Result<(), NotificationError> {
        if self.fail_notifications.load(Ordering::SeqCst) {
            return Err(NotificationError::Store(
                "injected notification failure".to_string(),
            ));
        }
        Ok(())
    }

    fn observe(&self, key: EdgeKey) -> Option<FriendshipEdge> {
        self.edges.get_mut(&key).and_then(|mut slot| slot.observe())
    }

    fn write(&self, key: EdgeKey, edge: Option<FriendshipEdge>) {
        let lag = self.read_lag.load(Ordering::SeqCst);
        let mut slot = self.edges.entry(key).or_default();
        if slot.stale_reads == 0 {
            slot.stale = slot.current.clone();
        }
        slot.current = edge;
        slot.stale_reads = lag;
    }

    fn lock_writes(&self) -> Result<std::sync::MutexGuard<'_, ()>, RelationError> {
        self.write_lock
            .lock()
            .map_err(|_| RelationError::Store("write lock poisoned".to_string()))
    }

    fn observe_matching(
        &self,
        status: EdgeStatus,
        matches: impl Fn(&EdgeKey) -> bool,
    ) -> Vec<FriendshipEdge> {
        let mut edges: Vec<FriendshipEdge> = self
            .edges
            .iter_mut()
            .filter(|slot| matches(slot.key()))
            .filter_map(|mut slot| slot.observe())
            .filter(|edge| edge.status == status)
            .collect();
        edges.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        edges
    }
}

#[async_trait::async_trait]
impl RelationshipStore for MemoryBackend {
    async fn find_edge(
        &self,
        user_id: UserId,
        friend_id: UserId,
        status: EdgeStatus,
    ) -> Result<Option<FriendshipEdge>, RelationError> {
        self.check_read()?;
        Ok(self
            .observe((user_id, friend_id))
            .filter(|edge| edge.status == status))
    }

    async fn find_edge_between(
        &self,
        user_id: UserId,
        friend_id: UserId,
    ) -> Result<Option<FriendshipEdge>, RelationError> {
        self.check_read()?;
        Ok(self.observe((user_id, friend_id)))
    }

    async fn upsert_pending(
        &self,
        user_id: UserId,
        friend_id: UserId,
    ) -> Result<FriendshipEdge, RelationError> {
        self.check_write()?;
        let _guard = self.lock_writes()?;

        let now = Utc::now();
        let created_at = self
            .committed_edge(user_id, friend_id)
            .map(|edge| edge.created_at)
            .unwrap_or(now);
        let edge = FriendshipEdge {
            user_id,
            friend_id,
            status: EdgeStatus::Pending,
            created_at,
            updated_at: now,
        };
        self.write((user_id, friend_id), Some(edge.clone()));
        Ok(edge)
    }

    async fn accept_friend_request(
        &self,
        requester_id: UserId,
        accepter_id: UserId,
    ) -> Result<bool, RelationError> {
        self.check_write()?;
        let _guard = self.lock_writes()?;

        let Some(request) = self
            .committed_edge(requester_id, accepter_id)
            .filter(|edge| edge.status == EdgeStatus::Pending)
        else {
            return Ok(false);
        };

        let now = Utc::now();
        let mirror_created_at = self
            .committed_edge(accepter_id, requester_id)
            .map(|edge| edge.created_at)
            .unwrap_or(now);

        self.write(
            (requester_id, accepter_id),
            Some(FriendshipEdge {
                status: EdgeStatus::Active,
                updated_at: now,
                ..request
            }),
        );
        self.write(
            (accepter_id, requester_id),
            Some(FriendshipEdge {
                user_id: accepter_id,
                friend_id: requester_id,
                status: EdgeStatus::Active,
                created_at: mirror_created_at,
                updated_at: now,
            }),
        );
        Ok(true)
    }

    async fn reject_friend_request(
        &self,
        requester_id: UserId,
        target_id: UserId,
    ) -> Result<bool, RelationError> {
        self.check_write()?;
        let _guard = self.lock_writes()?;

        let pending = self
            .committed_edge(requester_id, target_id)
            .is_some_and(|edge| edge.status == EdgeStatus::Pending);
        if pending {
            self.write((requester_id, target_id), None);
        }
        Ok(pending)
    }

    async fn list_edges_from(
        &self,
        user_id: UserId,
        status: EdgeStatus,
    ) -> Result<Vec<FriendshipEdge>, RelationError> {
        self.check_read()?;
        Ok(self.observe_matching(status, |(from, _)| *from == user_id))
    }

    async fn list_edges_to(
        &self,
        friend_id: UserId,
        status: EdgeStatus,
    ) -> Result<Vec<FriendshipEdge>, RelationError> {
        self.check_read()?;
        Ok(self.observe_matching(status, |(_, to)| *to == friend_id))
    }
}

#[async_trait::async_trait]
impl ProfileRepo for MemoryBackend {
    async fn find_profile(&self, user_id: UserId) -> Result<Option<PublicProfile>, RelationError> {
        self.check_read()?;
        Ok(self.profiles.get(&user_id).map(|p| p.value().clone()))
    }

    async fn find_profiles(
        &self,
        user_ids: &[UserId],
    ) -> Result<Vec<PublicProfile>, RelationError> {
        self.check_read()?;
        Ok(user_ids
            .iter()
            .filter_map(|id| self.profiles.get(id).map(|p| p.value().clone()))
            .collect())
    }
}

#[async_trait::async_trait]
impl NotificationRepo for MemoryBackend {
    async fn insert(&self, notification: &Notification) -> Result<(), NotificationError> {
        self.check_notifications()?;
        self.notifications
            .insert(notification.id, notification.clone());
        Ok(())
    }

    async fn list_for(
        &self,
        user_id: UserId,
        page_size: PageSize,
        unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationError> {
        self.check_notifications()?;
        let mut list: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !(unread_only && n.read))
            .map(|n| n.value().clone())
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        list.truncate(page_size.0 as usize);
        Ok(list)
    }

    async fn mark_read(
        &self,
        user_id: UserId,
        id: NotificationId,
    ) -> Result<bool, NotificationError> {
        self.check_notifications()?;
        match self.notifications.get_mut(&id) {
            Some(mut n) if n.user_id == user_id => {
                n.read = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_all_read(&self, user_id: UserId) -> Result<u64, NotificationError> {
        self.check_notifications()?;
        let mut count = 0;
        for mut n in self.notifications.iter_mut() {
            if n.user_id == user_id && !n.read {
                n.read = true;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn delete(
        &self,
        user_id: UserId,
        id: NotificationId,
    ) -> Result<bool, NotificationError> {
        self.check_notifications()?;
        Ok(self
            .notifications
            .remove_if(&id, |_, n| n.user_id == user_id)
            .is_some())
    }

    async fn count_unread(&self, user_id: UserId) -> Result<u64, NotificationError> {
        self.check_notifications()?;
        Ok(self
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.read)
            .count() as u64)
    }
}
