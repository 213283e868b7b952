//! Process configuration from environment variables.

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

use hcm_auth::Role;
use hcm_directory::{EmployeeProfile, NewEmployee, Salary};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SESSION_TTL_MINUTES: i64 = 480;
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} is required when {1} is set")]
    Missing(&'static str, &'static str),
}

/// Administrator seeded into an empty directory on startup.
#[derive(Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl BootstrapAdmin {
    pub fn into_new_employee(self) -> NewEmployee {
        NewEmployee {
            profile: EmployeeProfile {
                first_name: self.first_name,
                last_name: self.last_name,
                email: self.email,
                job_title: "HR Administrator".to_string(),
                salary: Salary::ZERO,
                department: "HR".to_string(),
                role: Role::HrAdmin,
            },
            password: self.password,
        }
    }
}

impl core::fmt::Debug for BootstrapAdmin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BootstrapAdmin")
            .field("email", &self.email)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub session_ttl: Duration,
    /// Postgres when set; in-memory otherwise.
    pub database_url: Option<String>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_raw = var("HCM_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                var: "HCM_BIND_ADDR",
                value: bind_raw.clone(),
                reason: e.to_string(),
            })?;

        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            DEV_JWT_SECRET.to_string()
        });

        let session_ttl = match var("HCM_SESSION_TTL_MINUTES") {
            None => Duration::minutes(DEFAULT_SESSION_TTL_MINUTES),
            Some(raw) => match raw.trim().parse::<i64>() {
                Ok(minutes) if minutes > 0 => Duration::minutes(minutes),
                _ => {
                    return Err(ConfigError::Invalid {
                        var: "HCM_SESSION_TTL_MINUTES",
                        value: raw,
                        reason: "expected a positive number of minutes".to_string(),
                    });
                }
            },
        };

        let bootstrap_admin = match var("HCM_BOOTSTRAP_ADMIN_EMAIL") {
            None => None,
            Some(email) => Some(BootstrapAdmin {
                email,
                password: var("HCM_BOOTSTRAP_ADMIN_PASSWORD").ok_or(ConfigError::Missing(
                    "HCM_BOOTSTRAP_ADMIN_PASSWORD",
                    "HCM_BOOTSTRAP_ADMIN_EMAIL",
                ))?,
                first_name: var("HCM_BOOTSTRAP_ADMIN_FIRST_NAME")
                    .unwrap_or_else(|| "System".to_string()),
                last_name: var("HCM_BOOTSTRAP_ADMIN_LAST_NAME")
                    .unwrap_or_else(|| "Administrator".to_string()),
            }),
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            session_ttl,
            database_url: var("DATABASE_URL"),
            bootstrap_admin,
        })
    }
}

impl core::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("session_ttl", &self.session_ttl)
            .field("database", &self.database_url.as_ref().map(|_| "<set>"))
            .field("bootstrap_admin", &self.bootstrap_admin)
            .finish_non_exhaustive()
    }
}
