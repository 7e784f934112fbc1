/// Real-time notification layer
///
/// This module implements the live-push side of SynergySphere: a registry of
/// open WebSocket connections per user, a JSON message envelope, and a
/// notifier that fans envelopes out to a user or to all members of a project.
///
/// Delivery is strictly best-effort. There is no queuing, no backpressure, no
/// acknowledgment, and no retry: a recipient without an open connection is
/// skipped, and the persisted notifications table remains the source of truth.
///
/// # Modules
///
/// - `registry`: user id → set of live connection handles
/// - `message`: the server→client JSON envelope and toast payloads
/// - `notifier`: fan-out to a user or project membership snapshot

pub mod message;
pub mod notifier;
pub mod registry;

pub use message::{MessageKind, ServerMessage, Toast, ToastKind};
pub use notifier::{
    Delivery, MembershipResolver, Notifier, PgMembershipResolver, RecipientOutcome,
};
pub use registry::{ConnectionId, ConnectionRegistry, SendOutcome};
