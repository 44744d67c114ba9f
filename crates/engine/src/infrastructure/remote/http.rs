//! HTTP adapter for the remote profile service.
//!
//! Speaks plain JSON REST: `GET /profiles/{user_id}` and `PUT
//! /profiles/{user_id}`. A 404 on fetch is "no record yet", not an error.

use async_trait::async_trait;
use reqwest::StatusCode;

use chatling_domain::UserId;

use crate::infrastructure::ports::{ProfileRecord, ProfileRepo, RemoteError};

pub struct HttpProfileRepo {
    client: reqwest::Client,
    base_url: String,
}

impl HttpProfileRepo {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn profile_url(&self, user_id: UserId) -> String {
        format!("{}/profiles/{}", self.base_url.trim_end_matches('/'), user_id)
    }
}

#[async_trait]
impl ProfileRepo for HttpProfileRepo {
    async fn fetch(&self, user_id: UserId) -> Result<Option<ProfileRecord>, RemoteError> {
        let response = self
            .client
            .get(self.profile_url(user_id))
            .send()
            .await
            .map_err(RemoteError::request_failed)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = response
            .error_for_status()
            .map_err(RemoteError::request_failed)?;

        let record = response
            .json::<ProfileRecord>()
            .await
            .map_err(RemoteError::invalid_response)?;
        Ok(Some(record))
    }

    async fn upsert(&self, record: &ProfileRecord) -> Result<(), RemoteError> {
        self.client
            .put(self.profile_url(record.user_id))
            .json(record)
            .send()
            .await
            .map_err(RemoteError::request_failed)?
            .error_for_status()
            .map_err(RemoteError::request_failed)?;
        Ok(())
    }
}
