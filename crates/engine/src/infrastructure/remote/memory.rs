//! In-memory profile store for tests and offline demo runs.

use async_trait::async_trait;
use dashmap::DashMap;

use chatling_domain::UserId;

use crate::infrastructure::ports::{ProfileRecord, ProfileRepo, RemoteError};

/// Remote-store stand-in keyed by user id.
#[derive(Debug, Default)]
pub struct InMemoryProfileRepo {
    records: DashMap<UserId, ProfileRecord>,
}

impl InMemoryProfileRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct read access for test assertions.
    pub fn record(&self, user_id: UserId) -> Option<ProfileRecord> {
        self.records.get(&user_id).map(|r| r.clone())
    }

    /// Seed a record, e.g. to simulate progress from another device.
    pub fn seed(&self, record: ProfileRecord) {
        self.records.insert(record.user_id, record);
    }
}

#[async_trait]
impl ProfileRepo for InMemoryProfileRepo {
    async fn fetch(&self, user_id: UserId) -> Result<Option<ProfileRecord>, RemoteError> {
        Ok(self.records.get(&user_id).map(|r| r.clone()))
    }

    async fn upsert(&self, record: &ProfileRecord) -> Result<(), RemoteError> {
        self.records.insert(record.user_id, record.clone());
        Ok(())
    }
}
