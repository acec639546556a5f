use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub appointment_id: Option<String>,
    pub message: String,
    pub is_read: bool,
    pub created_at: Option<DateTime<Utc>>,
}

/// A nurse pushing a message straight to a user's inbox.
#[derive(Debug, Deserialize)]
pub struct SendNotificationRequest {
    pub user_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub unread: usize,
}
