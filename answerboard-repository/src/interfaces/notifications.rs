//! This module defines the `NotificationRepository` trait. Notifications are
//! plain document inserts keyed by recipient.
use answerboard_shared::types::{Notification, NotificationId, UserId};

use crate::errors::RepositoryError;

#[async_trait::async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert_notification(&self, notification: &Notification) -> Result<(), RepositoryError>;

    /// Lists a recipient's notifications, newest first.
    async fn list_notifications(
        &self,
        recipient_id: UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, RepositoryError>;

    /// Marks one of the recipient's notifications as read.
    ///
    /// Returns `false` if no such notification belongs to the recipient.
    async fn mark_notification_read(
        &self,
        recipient_id: UserId,
        id: NotificationId,
    ) -> Result<bool, RepositoryError>;
}
