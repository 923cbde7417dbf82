use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
    pub note: Option<String>,
}

impl WebhookAck {
    pub fn handled() -> Self {
        Self {
            received: true,
            note: None,
        }
    }

    pub fn ignored(note: impl Into<String>) -> Self {
        Self {
            received: true,
            note: Some(note.into()),
        }
    }
}

/// Identity provider event about a user account.
#[derive(Debug, Deserialize)]
pub struct IdentityEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: IdentityUser,
}

#[derive(Debug, Deserialize)]
pub struct IdentityUser {
    pub id: String,
    #[serde(default)]
    pub email_addresses: Vec<IdentityEmail>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub image_url: Option<String>,
    /// Plan slug mirrored from the billing side, if any.
    pub plan: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IdentityEmail {
    pub email_address: String,
}

impl IdentityUser {
    pub fn primary_email(&self) -> String {
        self.email_addresses
            .first()
            .map(|e| e.email_address.clone())
            .unwrap_or_default()
    }

    pub fn full_name(&self) -> String {
        format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tolerates_sparse_user_payloads() {
        let event: IdentityEvent = serde_json::from_str(
            r#"{"type":"user.created","data":{"id":"user_1","first_name":"Ada"}}"#,
        )
        .expect("event");
        assert_eq!(event.data.primary_email(), "");
        assert_eq!(event.data.full_name(), "Ada");
    }

    #[test]
    fn takes_first_email_and_joins_names() {
        let event: IdentityEvent = serde_json::from_str(
            r#"{"type":"user.updated","data":{"id":"user_1","first_name":"Ada","last_name":"Lovelace",
               "email_addresses":[{"email_address":"ada@example.com"},{"email_address":"alt@example.com"}]}}"#,
        )
        .expect("event");
        assert_eq!(event.data.primary_email(), "ada@example.com");
        assert_eq!(event.data.full_name(), "Ada Lovelace");
    }
}
