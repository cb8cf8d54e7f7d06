// App state for the Axum server
use std::sync::Arc;

use answerboard_ledger::{AcceptanceService, ContentService, NotificationInbox, VoteService};

#[derive(Clone)]
pub struct AppState {
    pub votes: Arc<VoteService>,
    pub acceptance: Arc<AcceptanceService>,
    pub content: Arc<ContentService>,
    pub inbox: Arc<NotificationInbox>,
}
