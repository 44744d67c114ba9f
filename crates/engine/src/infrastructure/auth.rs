//! Static authentication adapter.
//!
//! The demo and tests don't run a real auth provider; identity is fixed at
//! construction (or absent for anonymous sessions).

use async_trait::async_trait;

use chatling_domain::UserId;

use super::ports::{AuthPort, Identity};

#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    identity: Option<Identity>,
}

impl StaticAuth {
    /// No active session: every sync pass will no-op with `NoIdentity`.
    pub fn anonymous() -> Self {
        Self { identity: None }
    }

    pub fn signed_in(user_id: UserId, email: Option<String>) -> Self {
        Self {
            identity: Some(Identity { user_id, email }),
        }
    }
}

#[async_trait]
impl AuthPort for StaticAuth {
    async fn current_identity(&self) -> Option<Identity> {
        self.identity.clone()
    }
}
