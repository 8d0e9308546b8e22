//! Pi-hole REST client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use super::models::{DeviceRecord, DevicesResponse, LeaseRecord, LeasesResponse};
use super::PresenceSource;
use crate::error::RefreshError;

pub const LEASES_ENDPOINT: &str = "/api/dhcp/leases";
pub const DEVICES_ENDPOINT: &str = "/api/network/devices?max_devices=999&max_addresses=24";

pub struct PiholeClient {
    base_url: String,
    http_client: Client,
    timeout: Duration,
}

impl PiholeClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http_client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout.min(Duration::from_secs(5)))
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
            timeout,
        })
    }

    /// GET `path` and decode the body as JSON regardless of the declared content type
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RefreshError> {
        let url = format!("{}{}", self.base_url, path);

        let resp = self
            .http_client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| RefreshError::from_reqwest(&url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RefreshError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| RefreshError::from_reqwest(&url, e))?;

        serde_json::from_slice(&body).map_err(|source| RefreshError::Malformed { url, source })
    }
}

#[async_trait]
impl PresenceSource for PiholeClient {
    async fn fetch_leases(&self) -> Result<Vec<LeaseRecord>, RefreshError> {
        let resp: LeasesResponse = self.get_json(LEASES_ENDPOINT).await?;
        tracing::debug!("[Pihole] {} leases from {}", resp.leases.len(), self.base_url);
        Ok(resp.leases)
    }

    async fn fetch_devices(&self) -> Result<Vec<DeviceRecord>, RefreshError> {
        let resp: DevicesResponse = self.get_json(DEVICES_ENDPOINT).await?;
        tracing::debug!("[Pihole] {} devices from {}", resp.devices.len(), self.base_url);
        Ok(resp.devices)
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}
