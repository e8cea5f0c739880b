use crate::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

/// A signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

/// Signs users in and out.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self) -> Result<Identity>;
    async fn sign_out(&self, identity: &Identity) -> Result<()>;
}

/// Always signs in the same fixed user.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockIdentityProvider;

impl MockIdentityProvider {
    pub fn identity() -> Identity {
        Identity {
            id: "user_123".to_string(),
            name: "Người dùng Google".to_string(),
            email: "user@gmail.com".to_string(),
            picture: Some("https://via.placeholder.com/40".to_string()),
        }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn sign_in(&self) -> Result<Identity> {
        let identity = Self::identity();
        info!("Signed in as {}", identity.email);
        Ok(identity)
    }

    async fn sign_out(&self, identity: &Identity) -> Result<()> {
        info!("Signed out {}", identity.email);
        Ok(())
    }
}
