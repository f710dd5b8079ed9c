//! Notification repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{NewNotification, Notification, NotificationId, UserId};

/// Repository trait for per-user notification rows.
///
/// Fan-out happens in the service layer: one insert per affected user
/// at the moment of the triggering event, no batching.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Insert a notification row (unread).
    async fn insert_notification(&self, new: NewNotification) -> RepositoryResult<Notification>;

    /// A user's notifications, newest first, optionally unread only.
    async fn list_notifications(
        &self,
        user: UserId,
        unread_only: bool,
    ) -> RepositoryResult<Vec<Notification>>;

    /// Mark one of the user's notifications read.
    ///
    /// # Returns
    /// * `Ok(Some(Notification))` - The updated row
    /// * `Ok(None)` - No such notification, or it belongs to someone else
    async fn mark_notification_read(
        &self,
        id: NotificationId,
        user: UserId,
    ) -> RepositoryResult<Option<Notification>>;

    /// Mark all of the user's notifications read.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of rows flipped to read
    async fn mark_all_notifications_read(&self, user: UserId) -> RepositoryResult<usize>;
}
