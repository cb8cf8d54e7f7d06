//! Best-effort notification delivery.
//!
//! Services never write notifications themselves. They hand a message to a
//! [`NotificationEmitter`], which pushes it onto a bounded channel without
//! waiting. A single [`NotificationDispatcher`] task drains the channel into
//! the notification store. A full queue, a stopped dispatcher or a failed
//! insert is logged and the notification is dropped: delivery is at most
//! once and never affects the operation that triggered it.
use std::sync::Arc;

use answerboard_repository::NotificationRepository;
use answerboard_shared::types::{Notification, NotificationId, NotificationKind, UserId};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::LedgerError;

/// Sending half of the notification queue. Cheap to clone.
#[derive(Clone)]
pub struct NotificationEmitter {
    sender: Option<mpsc::Sender<Notification>>,
}

impl NotificationEmitter {
    /// An emitter that drops everything it is given.
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    /// Queues a notification for `recipient_id` without waiting.
    pub fn emit(&self, recipient_id: UserId, kind: NotificationKind) {
        let Some(sender) = &self.sender else {
            debug!(recipient_id = %recipient_id, kind = kind.name(), "Notifications disabled, dropping");
            return;
        };

        match sender.try_send(Notification::new(recipient_id, kind)) {
            Ok(()) => {}
            Err(TrySendError::Full(notification)) => {
                warn!(
                    recipient_id = %notification.recipient_id,
                    kind = notification.kind.name(),
                    "Notification queue full, dropping notification"
                );
            }
            Err(TrySendError::Closed(notification)) => {
                warn!(
                    recipient_id = %notification.recipient_id,
                    kind = notification.kind.name(),
                    "Notification dispatcher stopped, dropping notification"
                );
            }
        }
    }
}

/// Receiving half of the notification queue, persisting into a
/// `NotificationRepository`.
pub struct NotificationDispatcher {
    receiver: mpsc::Receiver<Notification>,
    sink: Arc<dyn NotificationRepository>,
}

impl NotificationDispatcher {
    /// Creates a dispatcher and the emitter feeding it.
    ///
    /// # Arguments
    ///
    /// * `sink` - Where notifications are persisted
    /// * `capacity` - Maximum number of queued notifications; at least one
    pub fn new(sink: Arc<dyn NotificationRepository>, capacity: usize) -> (Self, NotificationEmitter) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self { receiver, sink },
            NotificationEmitter {
                sender: Some(sender),
            },
        )
    }

    /// Drains the queue until every emitter has been dropped.
    pub async fn run(mut self) {
        info!("Notification dispatcher started");
        while let Some(notification) = self.receiver.recv().await {
            match self.sink.insert_notification(&notification).await {
                Ok(()) => debug!(
                    notification_id = %notification.id,
                    recipient_id = %notification.recipient_id,
                    kind = notification.kind.name(),
                    "Notification delivered"
                ),
                Err(e) => warn!(
                    notification_id = %notification.id,
                    recipient_id = %notification.recipient_id,
                    kind = notification.kind.name(),
                    error = %e,
                    "Failed to persist notification, dropping"
                ),
            }
        }
        info!("Notification dispatcher stopped");
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

/// Read side of a user's notifications.
pub struct NotificationInbox {
    repository: Arc<dyn NotificationRepository>,
}

impl NotificationInbox {
    pub fn new(repository: Arc<dyn NotificationRepository>) -> Self {
        Self { repository }
    }

    pub async fn list(&self, recipient_id: UserId, unread_only: bool) -> Result<Vec<Notification>, LedgerError> {
        Ok(self.repository.list_notifications(recipient_id, unread_only).await?)
    }

    /// Marks one of the recipient's notifications as read.
    ///
    /// Notifications belonging to someone else are reported as not found.
    pub async fn mark_read(&self, recipient_id: UserId, id: NotificationId) -> Result<(), LedgerError> {
        if self.repository.mark_notification_read(recipient_id, id).await? {
            Ok(())
        } else {
            Err(LedgerError::not_found(format!("notification {id}")))
        }
    }
}
