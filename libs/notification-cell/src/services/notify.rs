use serde_json::{json, Value};
use tracing::{debug, warn};

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_database::Method;
use shared_models::error::AppError;

use crate::models::{Notification, SendNotificationRequest};

pub struct NotificationService {
    client: SupabaseClient,
}

impl NotificationService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: SupabaseClient::new(config),
        }
    }

    pub async fn create(
        &self,
        user_id: &str,
        appointment_id: Option<&str>,
        message: &str,
    ) -> Result<Notification, AppError> {
        let row = json!({
            "user_id": user_id,
            "appointment_id": appointment_id,
            "message": message,
            "is_read": false
        });

        let created = self
            .client
            .insert_returning("notifications", json!([row]), None)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let row = created.into_iter().next().ok_or_else(|| {
            AppError::Database("Notification insert returned no rows".to_string())
        })?;

        serde_json::from_value(row)
            .map_err(|e| AppError::Internal(format!("Failed to parse notification row: {}", e)))
    }

    /// Fire-and-forget variant for notices raised as a side effect of
    /// another operation. A failed notice never fails the operation.
    pub async fn notify(&self, user_id: &str, appointment_id: Option<&str>, message: &str) {
        if let Err(e) = self.create(user_id, appointment_id, message).await {
            warn!("Failed to notify user {}: {}", user_id, e);
        }
    }

    /// Returns the user's inbox newest-first and marks everything in it
    /// as read, so the unread badge clears once the list is seen.
    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Notification>, AppError> {
        let path = format!(
            "/rest/v1/notifications?user_id=eq.{}&select=*&order=created_at.desc",
            user_id
        );

        let rows: Vec<Value> = self
            .client
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let notifications: Vec<Notification> = rows
            .into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| {
                    AppError::Internal(format!("Failed to parse notification row: {}", e))
                })
            })
            .collect::<Result<_, _>>()?;

        if notifications.iter().any(|n| !n.is_read) {
            let mark_path = format!(
                "/rest/v1/notifications?user_id=eq.{}&is_read=eq.false",
                user_id
            );
            if let Err(e) = self
                .client
                .update_returning(&mark_path, json!({ "is_read": true }), None)
                .await
            {
                warn!("Failed to mark notifications read for {}: {}", user_id, e);
            }
        }

        Ok(notifications)
    }

    pub async fn mark_read(
        &self,
        user_id: &str,
        notification_id: &str,
    ) -> Result<Notification, AppError> {
        let rows: Vec<Value> = self
            .client
            .request(
                Method::GET,
                &format!("/rest/v1/notifications?id=eq.{}&select=*", notification_id),
                None,
                None,
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

        let notification: Notification = serde_json::from_value(row)
            .map_err(|e| AppError::Internal(format!("Failed to parse notification row: {}", e)))?;

        if notification.user_id != user_id {
            return Err(AppError::Forbidden(
                "You can only manage your own notifications".to_string(),
            ));
        }

        let updated = self
            .client
            .update_returning(
                &format!("/rest/v1/notifications?id=eq.{}", notification_id),
                json!({ "is_read": true }),
                None,
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let row = updated
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;

        serde_json::from_value(row)
            .map_err(|e| AppError::Internal(format!("Failed to parse notification row: {}", e)))
    }

    pub async fn unread_count(&self, user_id: &str) -> Result<usize, AppError> {
        let path = format!(
            "/rest/v1/notifications?user_id=eq.{}&is_read=eq.false&select=id",
            user_id
        );

        let rows: Vec<Value> = self
            .client
            .request(Method::GET, &path, None, None)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.len())
    }

    /// Nurse-initiated message. The recipient sees who sent it.
    pub async fn send_direct(
        &self,
        sender_name: &str,
        request: SendNotificationRequest,
    ) -> Result<Notification, AppError> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(AppError::ValidationError(
                "Message cannot be empty".to_string(),
            ));
        }

        let recipients: Vec<Value> = self
            .client
            .request(
                Method::GET,
                &format!("/rest/v1/users?id=eq.{}&select=id", request.user_id),
                None,
                None,
            )
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if recipients.is_empty() {
            return Err(AppError::NotFound("Recipient not found".to_string()));
        }

        debug!("Direct notification to {}", request.user_id);
        self.create(
            &request.user_id,
            None,
            &format!("From {}: {}", sender_name, message),
        )
        .await
    }
}
