use serde::{Deserialize, Serialize};

pub const ROLE_TRAVELER: &str = "TRAVELER";
pub const ROLE_HOST: &str = "HOST";
pub const ROLE_ADMIN: &str = "ADMIN";

/// Access token claims issued by the external identity provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub exp: usize,
    pub iat: usize,
    pub jti: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csrf_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub role: String,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    pub fn is_host(&self) -> bool {
        self.role == ROLE_HOST
    }

    /// Hosts act on their own chalets; admins act on any.
    pub fn can_manage_chalet(&self, host_id: &str) -> bool {
        self.is_admin() || (self.is_host() && self.user_id == host_id)
    }
}
