//! Payment provider client: hosted checkout sessions and webhook payloads.

use chrono::Utc;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};
use uuid::Uuid;

use super::{ClientError, ensure_success};
use crate::config::PaymentConfig;

const META_ORDER_IDS: &str = "orderIds";
const META_USER_ID: &str = "userId";
const META_APP_ID: &str = "appId";

/// Hosted checkout sessions must stay open for at least 30 minutes.
const SESSION_TTL_SECS: i64 = 30 * 60;

#[derive(Clone)]
pub struct PaymentGateway {
    client: Client,
    config: PaymentConfig,
}

impl std::fmt::Debug for PaymentGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentGateway")
            .field("api_base", &self.config.api_base)
            .field("secret_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// One charge line of a checkout session; one per seller order.
#[derive(Debug, Clone)]
pub struct ChargeLine {
    pub order_id: Uuid,
    pub label: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionList {
    data: Vec<SessionWithMetadata>,
}

#[derive(Debug, Deserialize)]
struct SessionWithMetadata {
    #[serde(default)]
    metadata: HashMap<String, String>,
}

/// What a checkout session tells the reconciler about its orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMetadata {
    pub order_ids: Vec<Uuid>,
    pub user_id: String,
    pub app_id: String,
}

/// Who a checkout session belongs to. Sessions of other applications share
/// the provider account and must be acknowledged without being parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionClaim {
    Foreign { app_id: String },
    Ours(SessionMetadata),
}

impl SessionClaim {
    /// Classify raw session metadata against our app id. The app id is
    /// compared first; only our own sessions are required to be well formed.
    pub fn classify(
        metadata: &HashMap<String, String>,
        expected_app_id: &str,
    ) -> Result<Self, String> {
        let app_id = metadata.get(META_APP_ID).map(String::as_str).unwrap_or_default();
        if app_id != expected_app_id {
            return Ok(Self::Foreign {
                app_id: app_id.to_string(),
            });
        }
        SessionMetadata::from_map(metadata).map(Self::Ours)
    }
}

impl SessionMetadata {
    pub fn from_map(metadata: &HashMap<String, String>) -> Result<Self, String> {
        let app_id = metadata.get(META_APP_ID).cloned().unwrap_or_default();
        let user_id = metadata
            .get(META_USER_ID)
            .filter(|id| !id.is_empty())
            .cloned()
            .ok_or_else(|| "session metadata has no user id".to_string())?;
        let order_ids = metadata
            .get(META_ORDER_IDS)
            .map(String::as_str)
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| Uuid::parse_str(id).map_err(|_| format!("invalid order id '{id}'")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            order_ids,
            user_id,
            app_id,
        })
    }
}

/// Envelope of an inbound payment event.
#[derive(Debug, Deserialize)]
pub struct PaymentEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: PaymentEventData,
}

#[derive(Debug, Deserialize)]
pub struct PaymentEventData {
    pub object: PaymentEventObject,
}

#[derive(Debug, Deserialize)]
pub struct PaymentEventObject {
    pub id: String,
}

/// How a payment intent ended, as far as the marketplace cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Succeeded,
    Failed,
}

impl PaymentEvent {
    pub fn outcome(&self) -> Option<PaymentOutcome> {
        match self.kind.as_str() {
            "payment_intent.succeeded" => Some(PaymentOutcome::Succeeded),
            "payment_intent.canceled" | "payment_intent.payment_failed" => {
                Some(PaymentOutcome::Failed)
            }
            _ => None,
        }
    }
}

impl PaymentGateway {
    #[must_use]
    pub fn new(client: Client, config: PaymentConfig) -> Self {
        Self { client, config }
    }

    pub fn app_id(&self) -> &str {
        &self.config.app_id
    }

    pub fn webhook_secret(&self) -> &str {
        self.config.webhook_secret.expose_secret()
    }

    /// Open a hosted checkout session covering every order of one checkout.
    ///
    /// # Errors
    ///
    /// Returns error if the provider rejects the session or is unreachable.
    #[instrument(skip(self, lines), fields(orders = lines.len()))]
    pub async fn create_checkout_session(
        &self,
        user_id: &str,
        lines: &[ChargeLine],
    ) -> Result<CheckoutSession, ClientError> {
        let order_ids = lines
            .iter()
            .map(|line| line.order_id.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let mut form: Vec<(String, String)> = vec![
            ("mode".into(), "payment".into()),
            ("success_url".into(), format!("{}?payment=success", self.config.return_url)),
            ("cancel_url".into(), format!("{}?payment=cancelled", self.config.return_url)),
            (
                "expires_at".into(),
                (Utc::now().timestamp() + SESSION_TTL_SECS).to_string(),
            ),
            (format!("metadata[{META_ORDER_IDS}]"), order_ids),
            (format!("metadata[{META_USER_ID}]"), user_id.to_string()),
            (format!("metadata[{META_APP_ID}]"), self.config.app_id.clone()),
        ];
        for (i, line) in lines.iter().enumerate() {
            let prefix = format!("line_items[{i}]");
            form.push((format!("{prefix}[quantity]"), "1".into()));
            form.push((
                format!("{prefix}[price_data][currency]"),
                self.config.currency.clone(),
            ));
            form.push((
                format!("{prefix}[price_data][unit_amount]"),
                line.amount.to_string(),
            ));
            form.push((
                format!("{prefix}[price_data][product_data][name]"),
                line.label.clone(),
            ));
        }

        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.config.api_base))
            .bearer_auth(self.config.secret_key.expose_secret())
            .form(&form)
            .send()
            .await?;
        let session: CheckoutSession = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Response(e.to_string()))?;

        debug!(session_id = %session.id, "checkout session created");
        Ok(session)
    }

    /// Look up the metadata of the checkout session that produced a payment
    /// intent. The map is returned raw; see [`SessionClaim::classify`].
    ///
    /// `Ok(None)` means the provider knows no session for this intent.
    ///
    /// # Errors
    ///
    /// Returns error if the provider is unreachable or answers garbage.
    #[instrument(skip(self))]
    pub async fn find_session_by_intent(
        &self,
        payment_intent_id: &str,
    ) -> Result<Option<HashMap<String, String>>, ClientError> {
        let response = self
            .client
            .get(format!("{}/v1/checkout/sessions", self.config.api_base))
            .bearer_auth(self.config.secret_key.expose_secret())
            .query(&[("payment_intent", payment_intent_id), ("limit", "1")])
            .send()
            .await?;
        let list: SessionList = ensure_success(response)
            .await?
            .json()
            .await
            .map_err(|e| ClientError::Response(e.to_string()))?;

        Ok(list.data.into_iter().next().map(|session| session.metadata))
    }
}
