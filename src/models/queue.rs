use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use crate::models::status::QueueStatus;

/// One persisted outbound-message request. `payload` holds the internally
/// tagged message kind, fixed at enqueue time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: Uuid,
    pub to: String,
    pub member_name: String,
    pub payload: JsonValue,
    pub status: QueueStatus,
    pub error: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub checked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessagePayload {
    Welcome(WelcomeDetails),
    PaymentConfirmation(PaymentDetails),
    Text { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeDetails {
    pub joining_date: NaiveDate,
    pub plan_name: String,
    pub membership_amount: u32,

    #[serde(default)]
    pub registration_fee: u32,

    #[serde(default)]
    pub security_fee: u32,

    #[serde(default)]
    pub access_restriction: bool,

    #[serde(default)]
    pub seat_type: Option<SeatType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeatType {
    Fixed,
    Random,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub amount: u32,
    pub next_due_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewQueueItem {
    pub to: String,
    pub member_name: String,
    pub payload: MessagePayload,
}

/// Terminal failure taxonomy recorded on a queue item. Display strings are
/// persisted verbatim in the item's `error` column.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("missing required data fields")]
    MissingFields,

    #[error("invalid phone number format")]
    InvalidPhoneNumber,

    #[error("not a registered address")]
    NotRegistered,

    #[error("{0}")]
    Gateway(String),
}

impl QueueItem {
    /// Validates the item for dispatch and resolves its payload variant.
    /// A payment amount of zero counts as missing, matching the upstream
    /// producer's contract.
    pub fn validate(&self) -> Result<MessagePayload, DeliveryError> {
        if self.to.trim().is_empty() || self.member_name.trim().is_empty() {
            return Err(DeliveryError::MissingFields);
        }

        let payload: MessagePayload = serde_json::from_value(self.payload.clone())
            .map_err(|_| DeliveryError::MissingFields)?;

        let incomplete = match &payload {
            MessagePayload::Welcome(details) => details.plan_name.trim().is_empty(),
            MessagePayload::PaymentConfirmation(details) => details.amount == 0,
            MessagePayload::Text { message } => message.trim().is_empty(),
        };

        if incomplete {
            return Err(DeliveryError::MissingFields);
        }

        Ok(payload)
    }
}
