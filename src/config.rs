use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use chrono::FixedOffset;
use dotenvy::dotenv;
use serde::Deserialize;

use crate::{models::retry::RetryConfig, worker::DeliveryOptions};

#[derive(Clone, Deserialize, Debug)]
pub struct Config {
    pub database_url: String,

    pub gateway_base_url: String,
    pub gateway_auth_token: String,
    pub gateway_address_domain: String,
    pub default_country_code: String,

    pub send_delay_seconds: u64,
    pub queue_poll_interval_seconds: u64,
    pub session_poll_interval_seconds: u64,
    pub reconnect_backoff_seconds: u64,

    pub reminder_hour: u32,
    pub reminder_minute: u32,
    pub utc_offset_minutes: i32,

    pub telegram_bot_token: String,
    pub telegram_chat_id: String,

    pub max_retry_attempts: u32,
    pub initial_retry_delay_ms: u64,
    pub max_retry_delay_ms: u64,
    pub retry_backoff_multiplier: u64,

    pub server_port: u16,
}

impl Config {
    pub fn load() -> Result<Self, Error> {
        dotenv().ok();

        let config = envy::from_env::<Self>()
            .map_err(|_| anyhow!("Invalid or missing environmental variable"))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.reminder_hour > 23 || self.reminder_minute > 59 {
            return Err(anyhow!(
                "Invalid reminder time {:02}:{:02}",
                self.reminder_hour,
                self.reminder_minute
            ));
        }

        if !self.default_country_code.chars().all(|c| c.is_ascii_digit())
            || self.default_country_code.is_empty()
        {
            return Err(anyhow!("Default country code must be digits"));
        }

        if self.queue_poll_interval_seconds == 0 || self.session_poll_interval_seconds == 0 {
            return Err(anyhow!("Poll intervals must be at least one second"));
        }

        self.timezone()?;

        Ok(())
    }

    pub fn timezone(&self) -> Result<FixedOffset, Error> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60)
            .ok_or_else(|| anyhow!("UTC offset out of range"))
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_retry_attempts,
            initial_delay_ms: self.initial_retry_delay_ms,
            max_delay_ms: self.max_retry_delay_ms,
            backoff_multiplier: self.retry_backoff_multiplier,
        }
    }

    pub fn delivery_options(&self) -> DeliveryOptions {
        DeliveryOptions {
            country_code: self.default_country_code.clone(),
            address_domain: self.gateway_address_domain.clone(),
            send_delay: Duration::from_secs(self.send_delay_seconds),
        }
    }
}
