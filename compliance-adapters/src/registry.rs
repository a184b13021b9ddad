//! Carbon-registry ledger client

use crate::{sync::ObligationSync, Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Serialize)]
struct AuthRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct SyncRequest {
    obligation_id: Uuid,
}

/// HTTP client for the external carbon-registry ledger.
///
/// Credentials are injected at construction; the bearer token is cached and
/// refreshed by `ensure_authenticated`. There is no global singleton.
pub struct CarbonRegistryClient {
    base_url: String,
    client_id: String,
    client_secret: String,
    http: reqwest::Client,
    token: RwLock<Option<String>>,
}

impl CarbonRegistryClient {
    /// Create a client for the given ledger endpoint
    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            http: reqwest::Client::new(),
            token: RwLock::new(None),
        }
    }

    async fn authenticate(&self) -> Result<String> {
        let response = self
            .http
            .post(format!("{}/auth/token", self.base_url))
            .json(&AuthRequest {
                client_id: &self.client_id,
                client_secret: &self.client_secret,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Authentication(format!(
                "Token endpoint returned {}",
                response.status()
            )));
        }

        let auth: AuthResponse = response.json().await?;
        Ok(auth.access_token)
    }
}

#[async_trait]
impl ObligationSync for CarbonRegistryClient {
    async fn ensure_authenticated(&self) -> Result<()> {
        if self.token.read().await.is_some() {
            return Ok(());
        }

        let token = self.authenticate().await?;
        *self.token.write().await = Some(token);
        debug!("Authenticated with carbon registry");
        Ok(())
    }

    async fn sync_obligation(&self, obligation_id: Uuid) -> Result<()> {
        self.ensure_authenticated().await?;

        let token = self
            .token
            .read()
            .await
            .clone()
            .ok_or_else(|| Error::Authentication("No token after authentication".to_string()))?;

        let response = self
            .http
            .post(format!("{}/obligations", self.base_url))
            .bearer_auth(token)
            .json(&SyncRequest { obligation_id })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Sync(format!(
                "Ledger returned {} for obligation {}",
                response.status(),
                obligation_id
            )));
        }

        info!(%obligation_id, "Obligation synced to carbon registry");
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Error::Http(format!(
                "Health check returned {}",
                response.status()
            )))
        }
    }

    fn name(&self) -> &str {
        "carbon-registry"
    }
}
