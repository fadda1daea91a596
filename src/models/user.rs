//! Authenticated identity and permissions

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Named capability checked before sensitive operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Permission {
    /// Manage loans: view all borrowed copies, renew, lend and return
    #[serde(rename = "catalog.can_mark_returned")]
    CanMarkReturned,
    /// Create, update and delete catalog records
    #[serde(rename = "catalog.can_edit")]
    CanEdit,
}

impl Permission {
    pub fn codename(&self) -> &'static str {
        match self {
            Permission::CanMarkReturned => "catalog.can_mark_returned",
            Permission::CanEdit => "catalog.can_edit",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.codename())
    }
}

/// JWT claims for authenticated users
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// Username
    pub sub: String,
    pub user_id: i32,
    #[serde(default)]
    pub is_superuser: bool,
    /// Permission codenames, e.g. `catalog.can_edit`
    #[serde(default)]
    pub permissions: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    /// Superusers implicitly hold every permission
    pub fn has_perm(&self, permission: Permission) -> bool {
        self.is_superuser || self.permissions.iter().any(|p| p == permission.codename())
    }
}
