//! Per-item request workers

use crate::breach::api::{range_contains, ApiEndpoints, BreachTransport};
use crate::breach::key::LookupKey;
use crate::pipeline::outcome::{ClassifiedResult, CredentialKind};
use crate::proxy::pool::ProxyPool;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Everything a worker needs, shared read-only across all of them
pub struct WorkerContext {
    pub pool: ProxyPool,
    pub transport: Arc<dyn BreachTransport>,
    pub endpoints: ApiEndpoints,
}

impl WorkerContext {
    pub fn new(
        pool: ProxyPool,
        transport: Arc<dyn BreachTransport>,
        endpoints: ApiEndpoints,
    ) -> Self {
        Self {
            pool,
            transport,
            endpoints,
        }
    }

    /// Run the check matching `kind`
    pub async fn check(&self, kind: CredentialKind, item: &str) -> ClassifiedResult {
        match kind {
            CredentialKind::Password => self.check_password(item).await,
            CredentialKind::Email => self.check_email(item).await,
        }
    }

    /// Range-query the password hash prefix and match the suffix locally
    pub async fn check_password(&self, password: &str) -> ClassifiedResult {
        let kind = CredentialKind::Password;
        let key = LookupKey::derive(password);
        let proxy = self.pool.select();
        let url = self.endpoints.range_url(&key.prefix);
        let start = Instant::now();

        let reply = match self.transport.get(proxy, &url, true).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(password, %proxy, error = %e, "password request failed");
                return ClassifiedResult::from_fetch_error(kind, password, e);
            }
        };

        info!(
            password,
            status = reply.status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "password response"
        );

        if !reply.is_ok() {
            return ClassifiedResult::status_failure(kind, password, reply.status);
        }

        let body = reply.body.unwrap_or_default();
        if range_contains(&body, &key.suffix) {
            info!(password, "password compromised");
            ClassifiedResult::Compromised(password.to_string())
        } else {
            info!(password, "password clean");
            ClassifiedResult::Clean(password.to_string())
        }
    }

    /// Any 200 from the search endpoint counts as a breach; the body is
    /// not inspected and there is no clean outcome.
    pub async fn check_email(&self, email: &str) -> ClassifiedResult {
        let kind = CredentialKind::Email;
        let proxy = self.pool.select();
        let url = self.endpoints.email_url(email);
        let start = Instant::now();

        let reply = match self.transport.get(proxy, &url, false).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(email, %proxy, error = %e, "email request failed");
                return ClassifiedResult::from_fetch_error(kind, email, e);
            }
        };

        info!(
            email,
            status = reply.status,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "email response"
        );

        if reply.is_ok() {
            ClassifiedResult::BreachedEmail(email.to_string())
        } else {
            ClassifiedResult::status_failure(kind, email, reply.status)
        }
    }
}
