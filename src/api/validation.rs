//! Server-side validation as an explicit policy.
//!
//! The backend exposes `POST /validar-produto`. Under the default advisory policy only an
//! explicit "invalid" verdict blocks a submission; an unreachable or broken endpoint is
//! logged and ignored.

use serde::{Deserialize, Serialize};

use super::CatalogApi;
use crate::catalog::ProductPayload;

pub const FALLBACK_REJECTION: &str = "Dados inválidos.";
pub const UNAVAILABLE_REJECTION: &str = "Validação remota indisponível. Tente novamente.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationPolicy {
    /// Ask the server, but proceed when it cannot answer.
    #[default]
    Advisory,
    /// Ask the server and block when it cannot answer.
    Strict,
    /// Never ask the server.
    Off,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteVerdict {
    Accepted,
    Rejected(Vec<String>),
    Unavailable,
    Skipped,
}

impl RemoteVerdict {
    pub fn allows_submission(&self) -> bool {
        !matches!(self, RemoteVerdict::Rejected(_))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AdvisoryValidation {
    policy: ValidationPolicy,
}

impl AdvisoryValidation {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    pub fn check(&self, api: &dyn CatalogApi, payload: &ProductPayload) -> RemoteVerdict {
        if self.policy == ValidationPolicy::Off {
            return RemoteVerdict::Skipped;
        }
        match api.validate_product(payload) {
            Ok(verdict) if verdict.valido => RemoteVerdict::Accepted,
            Ok(verdict) => {
                let errors = verdict
                    .erros
                    .filter(|errors| !errors.is_empty())
                    .unwrap_or_else(|| vec![FALLBACK_REJECTION.to_string()]);
                tracing::info!(?errors, "server rejected product payload");
                RemoteVerdict::Rejected(errors)
            }
            Err(err) if self.policy == ValidationPolicy::Strict => {
                tracing::warn!(?err, "remote validation unavailable; blocking submission");
                RemoteVerdict::Rejected(vec![UNAVAILABLE_REJECTION.to_string()])
            }
            Err(err) => {
                tracing::warn!(?err, "remote validation unavailable; proceeding with payload");
                RemoteVerdict::Unavailable
            }
        }
    }
}
