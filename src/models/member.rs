use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result};
use uuid::Uuid;

use crate::models::status::ReminderStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Library {
    pub id: Uuid,
    pub name: String,
}

/// A membership record. `status` is an open string set owned by the
/// membership store; only "Active" members are eligible for reminders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: Uuid,
    pub library_id: Uuid,
    pub name: String,
    pub contact: String,
    pub amount: u32,
    pub expiry_at: Option<NaiveDate>,
    pub status: String,
}

impl Member {
    pub fn is_active(&self) -> bool {
        self.status == "Active"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderType {
    Expiring7Days,
    ExpiringToday,
    Expired1Day,
}

impl ReminderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderType::Expiring7Days => "expiring_7_days",
            ReminderType::ExpiringToday => "expiring_today",
            ReminderType::Expired1Day => "expired_1_day",
        }
    }
}

impl Display for ReminderType {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{}", self.as_str())
    }
}

/// One append-only dedup-log entry proving a reminder type was attempted
/// for a member. Any entry for a (member, kind) pair suppresses re-sending,
/// whatever its status.
#[derive(Debug, Clone, Serialize)]
pub struct CreateReminderLog {
    pub kind: ReminderType,
    pub status: ReminderStatus,
    pub message: String,
    pub reason: Option<String>,
}

impl CreateReminderLog {
    pub fn new(kind: ReminderType, status: ReminderStatus, message: String) -> Self {
        Self {
            kind,
            status,
            message,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: String) -> Self {
        self.reason = Some(reason);
        self
    }
}
