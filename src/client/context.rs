use crate::application_impl::*;
use crate::application_port::*;
use crate::client::FriendsClient;
use crate::domain_model::{PublicProfile, UserId};
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::{self, Settings};
use sqlx::{MySql, Pool};
use std::sync::Arc;
use std::time::Duration;

/// The service graph one signed-in client works against.
pub struct ClientContext {
    pub session: Arc<dyn SessionService>,
    pub relationship_service: Arc<dyn RelationshipService>,
    pub notification_service: Arc<dyn NotificationService>,
    pub friends: FriendsClient,
    pool: Option<Pool<MySql>>,
}

impl ClientContext {
    pub async fn try_new(
        settings: &Settings,
        session: Arc<dyn SessionService>,
    ) -> anyhow::Result<Self> {
        let (store, profile_repo, notification_repo, pool): (
            Arc<dyn RelationshipStore>,
            Arc<dyn ProfileRepo>,
            Arc<dyn NotificationRepo>,
            Option<Pool<MySql>>,
        ) = match settings.store.backend.as_str() {
            "memory" => {
                warn!("memory store keeps nothing between runs");
                let backend = Arc::new(MemoryBackend::new());
                for username in &settings.store.seed_users {
                    backend.add_profile(PublicProfile {
                        user_id: get_fake_id(username),
                        username: username.clone(),
                        name: None,
                        avatar_url: None,
                    });
                }
                let store: Arc<dyn RelationshipStore> = backend.clone();
                let profile_repo: Arc<dyn ProfileRepo> = backend.clone();
                let notification_repo: Arc<dyn NotificationRepo> = backend;
                (store, profile_repo, notification_repo, None)
            }
            "mysql" => {
                let dsn = settings
                    .store
                    .dsn
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("store.dsn is required for mysql"))?;
                let pool = Pool::<MySql>::connect(dsn).await?;
                let store: Arc<dyn RelationshipStore> =
                    Arc::new(MySqlRelationshipStore::new(pool.clone()));
                let profile_repo: Arc<dyn ProfileRepo> =
                    Arc::new(MySqlProfileRepo::new(pool.clone()));
                let notification_repo: Arc<dyn NotificationRepo> =
                    Arc::new(MySqlNotificationRepo::new(pool.clone()));
                (store, profile_repo, notification_repo, Some(pool))
            }
            other => return Err(anyhow::anyhow!("Unknown store backend: {}", other)),
        };

        let mut notifications = RealNotificationService::new(notification_repo);
        match settings.notification.publisher.as_str() {
            "none" => {}
            "redis" => {
                let dsn = settings
                    .notification
                    .redis_dsn
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("notification.redis_dsn is required for redis"))?;
                let redis_client = redis::Client::open(dsn)?;
                let redis_manager = redis_client.get_connection_manager().await?;
                notifications = notifications.with_publisher(Arc::new(
                    RedisNotificationPublisher::new(
                        redis_manager,
                        settings.notification.channel_prefix.clone(),
                    ),
                ));
            }
            other => return Err(anyhow::anyhow!("Unknown notification publisher: {}", other)),
        }
        let notification_service: Arc<dyn NotificationService> = Arc::new(notifications);

        let relationship_service: Arc<dyn RelationshipService> =
            Arc::new(RealRelationshipService::new(
                store,
                profile_repo,
                notification_service.clone(),
                Arc::new(TokioSleeper),
                confirm_policy(&settings.confirm),
            ));

        let friends = FriendsClient::new(session.clone(), relationship_service.clone());

        Ok(Self {
            session,
            relationship_service,
            notification_service,
            friends,
            pool,
        })
    }

    pub async fn shutdown(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

pub fn confirm_policy(confirm: &settings::Confirm) -> RetryPolicy {
    RetryPolicy {
        max_attempts: confirm.max_attempts,
        base_delay: Duration::from_millis(confirm.base_delay_ms),
        final_grace: confirm.final_grace_ms.map(Duration::from_millis),
    }
}

/// `as_user` drives the fake backend, `token` the jwt one.
pub fn build_session(
    settings: &settings::Session,
    as_user: Option<UserId>,
    token: Option<String>,
) -> anyhow::Result<Arc<dyn SessionService>> {
    match settings.backend.as_str() {
        "fake" => Ok(Arc::new(match as_user {
            Some(user) => FakeSessionService::signed_in(user),
            None => FakeSessionService::signed_out(),
        })),
        "jwt" => {
            let secret = settings
                .jwt_secret
                .clone()
                .ok_or_else(|| anyhow::anyhow!("session.jwt_secret is required for jwt"))?;
            let session = JwtSessionService::new(JwtConfig {
                audience: settings.audience.clone(),
                issuer: settings.issuer.clone(),
                signing_key: secret.into_bytes(),
            });
            if let Some(token) = token {
                session.sign_in(token);
            }
            Ok(Arc::new(session))
        }
        other => Err(anyhow::anyhow!("Unknown session backend: {}", other)),
    }
}
