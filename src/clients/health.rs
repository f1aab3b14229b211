use std::{collections::HashMap, time::Instant};

use chrono::Utc;
use tracing::{debug, warn};

use crate::{
    clients::{gateway::HttpGateway, store::PgStore},
    config::Config,
    models::health::{HealthCheckResponse, HealthStatus, ServiceHealth},
};

pub struct HealthChecker {
    config: Config,
}

impl HealthChecker {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn check_all(&self) -> HealthCheckResponse {
        let mut checks = HashMap::new();

        let db_health = self.check_database().await;
        checks.insert("database".to_string(), db_health);

        let gateway_health = self.check_gateway().await;
        checks.insert("gateway".to_string(), gateway_health);

        let status = Self::determine_overall_status(&checks);

        HealthCheckResponse {
            status,
            timestamp: Utc::now(),
            checks,
        }
    }

    async fn check_database(&self) -> ServiceHealth {
        let start = Instant::now();

        match PgStore::connect(&self.config.database_url).await {
            Ok(store) => match store.health_check().await {
                Ok(_) => {
                    let elapsed = start.elapsed().as_millis() as u64;
                    debug!(response_time_ms = elapsed, "Database health check passed");
                    ServiceHealth::healthy(elapsed)
                }
                Err(e) => {
                    warn!(error = %e, "Database health check failed");
                    ServiceHealth::unhealthy(format!("Health check query failed: {}", e))
                }
            },
            Err(e) => {
                warn!(error = %e, "Database connection failed");
                ServiceHealth::unhealthy(format!("Connection failed: {}", e))
            }
        }
    }

    async fn check_gateway(&self) -> ServiceHealth {
        let start = Instant::now();

        let gateway = match HttpGateway::new(&self.config) {
            Ok(gateway) => gateway,
            Err(e) => {
                return ServiceHealth::unhealthy(format!("Client creation failed: {}", e));
            }
        };

        match gateway.session_status().await {
            Ok(status) => {
                debug!(state = %status.state, "Gateway session state checked");

                match status.state.as_str() {
                    "ready" => {
                        let elapsed = start.elapsed().as_millis() as u64;
                        ServiceHealth::healthy(elapsed).with_session("ready".to_string())
                    }
                    "qr" => ServiceHealth::degraded(
                        "qr".to_string(),
                        "Session awaiting QR pairing".to_string(),
                    ),
                    "disconnected" => ServiceHealth::degraded(
                        "disconnected".to_string(),
                        status
                            .reason
                            .unwrap_or_else(|| "Session disconnected".to_string()),
                    ),
                    other => ServiceHealth::unhealthy(format!("Session in state '{}'", other)),
                }
            }
            Err(e) => {
                warn!(error = %e, "Gateway session check failed");
                ServiceHealth::unhealthy(format!("Session status failed: {}", e))
            }
        }
    }

    fn determine_overall_status(checks: &HashMap<String, ServiceHealth>) -> HealthStatus {
        let has_unhealthy = checks
            .values()
            .any(|health| health.status == HealthStatus::Unhealthy);

        let has_degraded = checks
            .values()
            .any(|health| health.status == HealthStatus::Degraded);

        if has_unhealthy {
            HealthStatus::Unhealthy
        } else if has_degraded {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        }
    }
}
