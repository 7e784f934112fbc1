/// Best-effort notification fan-out
///
/// The notifier composes the [`ConnectionRegistry`] with a membership
/// resolver to broadcast a [`ServerMessage`] to either a single user or all
/// members of a project.
///
/// Delivery semantics, deliberately minimal:
/// - The payload is serialized once; every open connection of a recipient
///   gets the identical text frame.
/// - The recipient set of a project broadcast is the membership snapshot at
///   call time; members added afterwards do not receive the message.
/// - A failed membership lookup is logged and swallowed: live push is an
///   optional enhancement over the persisted state, never load-bearing.
/// - No acknowledgment, no retry, no ordering guarantee across a user's
///   connections.
///
/// Every broadcast returns an explicit per-recipient outcome so the
/// partial-failure contract is visible and testable, even though the mutation
/// handlers ignore it.

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

use super::message::ServerMessage;
use super::registry::ConnectionRegistry;
use crate::models::membership::ProjectMember;

/// Resolves the member set of a project
///
/// A trait seam so the notifier can be exercised without a database.
#[async_trait]
pub trait MembershipResolver: Send + Sync {
    /// Returns the user ids of all members of the project
    async fn project_member_ids(&self, project_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error>;
}

/// Production resolver backed by the project_members table
pub struct PgMembershipResolver {
    pool: PgPool,
}

impl PgMembershipResolver {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipResolver for PgMembershipResolver {
    async fn project_member_ids(&self, project_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
        ProjectMember::list_user_ids(&self.pool, project_id).await
    }
}

/// Delivery outcome for one recipient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// At least one of the recipient's connections accepted the frame
    Delivered,

    /// The recipient had no open connection
    Skipped,

    /// Every send to the recipient failed
    Failed,
}

/// Per-recipient result of a broadcast
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipientOutcome {
    pub user_id: Uuid,
    pub delivery: Delivery,
}

/// Fan-out of domain events to live connections
pub struct Notifier {
    registry: Arc<ConnectionRegistry>,
    members: Arc<dyn MembershipResolver>,
}

impl Notifier {
    pub fn new(registry: Arc<ConnectionRegistry>, members: Arc<dyn MembershipResolver>) -> Self {
        Self { registry, members }
    }

    /// Pushes a message to every open connection of one user
    ///
    /// Returns true iff at least one send succeeded. A user with zero open
    /// connections yields false and performs no send.
    pub fn notify_user(&self, user_id: Uuid, message: &ServerMessage) -> bool {
        let Some(payload) = serialize(message) else {
            return false;
        };

        let outcome = self.registry.send_to_user(user_id, &payload);
        debug!(
            %user_id,
            delivered = outcome.delivered,
            skipped = outcome.skipped,
            failed = outcome.failed,
            "Pushed message to user"
        );
        outcome.any_delivered()
    }

    /// Pushes a message to an explicit snapshot of recipients
    ///
    /// Used when the membership rows are already gone (project deletion) or
    /// the caller has resolved the recipient set itself.
    pub fn notify_users(&self, user_ids: &[Uuid], message: &ServerMessage) -> Vec<RecipientOutcome> {
        let Some(payload) = serialize(message) else {
            return Vec::new();
        };

        user_ids
            .iter()
            .map(|&user_id| {
                let outcome = self.registry.send_to_user(user_id, &payload);
                let delivery = if outcome.any_delivered() {
                    Delivery::Delivered
                } else if outcome.failed > 0 {
                    Delivery::Failed
                } else {
                    Delivery::Skipped
                };
                RecipientOutcome { user_id, delivery }
            })
            .collect()
    }

    /// Pushes a message to every member of a project
    ///
    /// The member set is resolved once, at call time. A resolver failure is
    /// logged and yields an empty outcome list; no compensating action.
    pub async fn notify_project(
        &self,
        project_id: Uuid,
        message: &ServerMessage,
    ) -> Vec<RecipientOutcome> {
        let member_ids = match self.members.project_member_ids(project_id).await {
            Ok(ids) => ids,
            Err(e) => {
                error!(%project_id, error = %e, "Failed to resolve project members for broadcast");
                return Vec::new();
            }
        };

        self.notify_users(&member_ids, message)
    }
}

fn serialize(message: &ServerMessage) -> Option<String> {
    match serde_json::to_string(message) {
        Ok(payload) => Some(payload),
        Err(e) => {
            error!(error = %e, "Failed to serialize realtime message");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::message::Toast;
    use axum::extract::ws::Message;
    use tokio::sync::mpsc;

    /// Resolver with a fixed member list
    struct StaticResolver(Vec<Uuid>);

    #[async_trait]
    impl MembershipResolver for StaticResolver {
        async fn project_member_ids(&self, _project_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
            Ok(self.0.clone())
        }
    }

    /// Resolver that always fails, simulating a data-store error
    struct FailingResolver;

    #[async_trait]
    impl MembershipResolver for FailingResolver {
        async fn project_member_ids(&self, _project_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
            Err(sqlx::Error::PoolClosed)
        }
    }

    fn toast_message() -> ServerMessage {
        ServerMessage::notification(Toast::info("Title", "Message"))
    }

    #[tokio::test]
    async fn test_notify_user_without_connections_is_noop() {
        let registry = Arc::new(ConnectionRegistry::new());
        let notifier = Notifier::new(registry, Arc::new(StaticResolver(vec![])));

        assert!(!notifier.notify_user(Uuid::new_v4(), &toast_message()));
    }

    #[tokio::test]
    async fn test_notify_user_reaches_every_tab() {
        let registry = Arc::new(ConnectionRegistry::new());
        let user_id = Uuid::new_v4();

        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        registry.register(user_id, tx1);
        registry.register(user_id, tx2);

        let notifier = Notifier::new(registry, Arc::new(StaticResolver(vec![])));
        assert!(notifier.notify_user(user_id, &toast_message()));

        let frame1 = rx1.recv().await.unwrap();
        let frame2 = rx2.recv().await.unwrap();
        assert_eq!(frame1, frame2);

        let Message::Text(payload) = frame1 else {
            panic!("expected text frame");
        };
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["type"], "notification");
    }

    #[tokio::test]
    async fn test_notify_project_targets_members_at_call_time() {
        let registry = Arc::new(ConnectionRegistry::new());
        let member = Uuid::new_v4();
        let outsider = Uuid::new_v4();

        let (tx_member, mut rx_member) = mpsc::unbounded_channel();
        let (tx_outsider, mut rx_outsider) = mpsc::unbounded_channel();
        registry.register(member, tx_member);
        registry.register(outsider, tx_outsider);

        let notifier = Notifier::new(
            registry,
            Arc::new(StaticResolver(vec![member])),
        );

        let outcomes = notifier
            .notify_project(Uuid::new_v4(), &toast_message())
            .await;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].user_id, member);
        assert_eq!(outcomes[0].delivery, Delivery::Delivered);

        assert!(rx_member.recv().await.is_some());
        assert!(rx_outsider.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_notify_project_marks_offline_members_skipped() {
        let registry = Arc::new(ConnectionRegistry::new());
        let online = Uuid::new_v4();
        let offline = Uuid::new_v4();

        let (tx, _rx) = mpsc::unbounded_channel();
        registry.register(online, tx);

        let notifier = Notifier::new(
            registry,
            Arc::new(StaticResolver(vec![online, offline])),
        );

        let outcomes = notifier
            .notify_project(Uuid::new_v4(), &toast_message())
            .await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].delivery, Delivery::Delivered);
        assert_eq!(outcomes[1].user_id, offline);
        assert_eq!(outcomes[1].delivery, Delivery::Skipped);
    }

    #[tokio::test]
    async fn test_resolver_failure_is_swallowed() {
        let registry = Arc::new(ConnectionRegistry::new());
        let user_id = Uuid::new_v4();

        let (tx, mut rx) = mpsc::unbounded_channel();
        registry.register(user_id, tx);

        let notifier = Notifier::new(registry, Arc::new(FailingResolver));

        let outcomes = notifier
            .notify_project(Uuid::new_v4(), &toast_message())
            .await;

        assert!(outcomes.is_empty());
        assert!(rx.try_recv().is_err());
    }
}
