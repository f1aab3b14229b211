#![allow(dead_code)]

use std::{collections::HashMap, sync::Mutex, time::Duration};

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use whatsapp_service::{
    clients::{
        gateway::Gateway,
        store::{MembershipStore, QueueStore},
    },
    models::{
        member::{CreateReminderLog, Library, Member, ReminderType},
        phone::Address,
        queue::{NewQueueItem, QueueItem},
        status::QueueStatus,
    },
    worker::DeliveryOptions,
};

pub fn delivery_options() -> DeliveryOptions {
    DeliveryOptions {
        country_code: "91".to_string(),
        address_domain: "c.us".to_string(),
        send_delay: Duration::ZERO,
    }
}

/// Gateway double that records every call instead of talking to a bridge.
pub struct SpyGateway {
    reachable: bool,
    send_error: Option<String>,
    pub reachability_checks: Mutex<Vec<String>>,
    pub sent: Mutex<Vec<(String, String)>>,
}

impl SpyGateway {
    pub fn registered() -> Self {
        Self {
            reachable: true,
            send_error: None,
            reachability_checks: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn unregistered() -> Self {
        Self {
            reachable: false,
            ..Self::registered()
        }
    }

    pub fn failing_send(error: &str) -> Self {
        Self {
            send_error: Some(error.to_string()),
            ..Self::registered()
        }
    }

    pub fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.reachability_checks.lock().unwrap().len() + self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Gateway for SpyGateway {
    async fn is_reachable(&self, address: &Address) -> Result<bool, Error> {
        self.reachability_checks
            .lock()
            .unwrap()
            .push(address.as_str().to_string());

        Ok(self.reachable)
    }

    async fn send(&self, address: &Address, text: &str) -> Result<(), Error> {
        if let Some(error) = &self.send_error {
            return Err(anyhow!("{}", error));
        }

        self.sent
            .lock()
            .unwrap()
            .push((address.as_str().to_string(), text.to_string()));

        Ok(())
    }
}

/// Queue store double with the same claim/terminal-transition semantics as
/// the PostgreSQL store.
pub struct InMemoryQueue {
    items: Mutex<HashMap<Uuid, QueueItem>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
        }
    }

    pub fn seed_pending(
        &self,
        to: &str,
        member_name: &str,
        payload: serde_json::Value,
    ) -> QueueItem {
        let item = QueueItem {
            id: Uuid::new_v4(),
            to: to.to_string(),
            member_name: member_name.to_string(),
            payload,
            status: QueueStatus::Pending,
            error: None,
            sent_at: None,
            checked_at: None,
            created_at: Utc::now(),
        };

        self.items.lock().unwrap().insert(item.id, item.clone());

        item
    }

    pub fn item(&self, id: &Uuid) -> QueueItem {
        self.items.lock().unwrap().get(id).unwrap().clone()
    }

    pub fn all_items(&self) -> Vec<QueueItem> {
        self.items.lock().unwrap().values().cloned().collect()
    }
}

#[async_trait]
impl QueueStore for InMemoryQueue {
    async fn pending_items(&self) -> Result<Vec<QueueItem>, Error> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .values()
            .filter(|item| item.status == QueueStatus::Pending)
            .cloned()
            .collect())
    }

    async fn claim(&self, id: &Uuid) -> Result<bool, Error> {
        let mut items = self.items.lock().unwrap();

        match items.get_mut(id) {
            Some(item) if item.status == QueueStatus::Pending => {
                item.status = QueueStatus::Processing;
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Ok(false),
        }
    }

    async fn mark_sent(&self, id: &Uuid) -> Result<(), Error> {
        let mut items = self.items.lock().unwrap();
        let item = items.get_mut(id).ok_or_else(|| anyhow!("no such item"))?;

        item.status = QueueStatus::Sent;
        item.sent_at = Some(Utc::now());
        item.checked_at = Some(Utc::now());
        item.error = None;

        Ok(())
    }

    async fn mark_failed(&self, id: &Uuid, error: &str) -> Result<(), Error> {
        let mut items = self.items.lock().unwrap();
        let item = items.get_mut(id).ok_or_else(|| anyhow!("no such item"))?;

        item.status = QueueStatus::Failed;
        item.error = Some(error.to_string());
        item.checked_at = Some(Utc::now());

        Ok(())
    }

    async fn enqueue_claimed(&self, new: NewQueueItem) -> Result<QueueItem, Error> {
        let item = QueueItem {
            id: Uuid::new_v4(),
            to: new.to,
            member_name: new.member_name,
            payload: serde_json::to_value(&new.payload)?,
            status: QueueStatus::Processing,
            error: None,
            sent_at: None,
            checked_at: None,
            created_at: Utc::now(),
        };

        self.items.lock().unwrap().insert(item.id, item.clone());

        Ok(item)
    }
}

/// Membership dataset double; single-unit read failures are injectable to
/// exercise the sweep's isolation guarantees.
pub struct InMemoryMembership {
    libraries: Vec<Library>,
    members: Vec<Member>,
    logs: Mutex<Vec<(Uuid, CreateReminderLog)>>,
    pub fail_members_for: Option<Uuid>,
    pub fail_log_read_for: Option<Uuid>,
}

impl InMemoryMembership {
    pub fn new(libraries: Vec<Library>, members: Vec<Member>) -> Self {
        Self {
            libraries,
            members,
            logs: Mutex::new(Vec::new()),
            fail_members_for: None,
            fail_log_read_for: None,
        }
    }

    /// One library holding the given members; their `library_id` is rebound
    /// to the created library.
    pub fn single_library(mut members: Vec<Member>) -> (Self, Library) {
        let library = Library {
            id: Uuid::new_v4(),
            name: "The Expert Hub Library".to_string(),
        };

        for member in &mut members {
            member.library_id = library.id;
        }

        (Self::new(vec![library.clone()], members), library)
    }

    pub fn seed_log(&self, member_id: Uuid, log: CreateReminderLog) {
        self.logs.lock().unwrap().push((member_id, log));
    }

    pub fn logs_for(&self, member_id: &Uuid) -> Vec<CreateReminderLog> {
        self.logs
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| id == member_id)
            .map(|(_, log)| log.clone())
            .collect()
    }
}

#[async_trait]
impl MembershipStore for InMemoryMembership {
    async fn list_libraries(&self) -> Result<Vec<Library>, Error> {
        Ok(self.libraries.clone())
    }

    async fn list_members(&self, library_id: &Uuid) -> Result<Vec<Member>, Error> {
        if self.fail_members_for.as_ref() == Some(library_id) {
            return Err(anyhow!("members collection unreadable"));
        }

        Ok(self
            .members
            .iter()
            .filter(|member| member.library_id == *library_id)
            .cloned()
            .collect())
    }

    async fn has_reminder_log(&self, member_id: &Uuid, kind: ReminderType) -> Result<bool, Error> {
        if self.fail_log_read_for.as_ref() == Some(member_id) {
            return Err(anyhow!("log collection unreadable"));
        }

        Ok(self
            .logs
            .lock()
            .unwrap()
            .iter()
            .any(|(id, log)| id == member_id && log.kind == kind))
    }

    async fn append_reminder_log(
        &self,
        member_id: &Uuid,
        log: CreateReminderLog,
    ) -> Result<(), Error> {
        self.logs.lock().unwrap().push((*member_id, log));

        Ok(())
    }
}

pub fn active_member(library_id: Uuid, name: &str, expiry_at: Option<NaiveDate>) -> Member {
    Member {
        id: Uuid::new_v4(),
        library_id,
        name: name.to_string(),
        contact: "+91 98765 43210".to_string(),
        amount: 700,
        expiry_at,
        status: "Active".to_string(),
    }
}
