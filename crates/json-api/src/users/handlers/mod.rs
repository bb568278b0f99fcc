//! User Handlers

use salvo::oapi::ToSchema;
use serde::{Deserialize, Serialize};

use reel_app::domain::users::records::UserRecord;

pub(crate) mod activate;
pub(crate) mod register;

/// Public view of an account. The password hash never leaves the server.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UserResponse {
    pub id: i64,
    pub created_at: String,
    pub name: String,
    pub email: String,
    pub activated: bool,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        UserResponse {
            id: user.id.into_i64(),
            created_at: user.created_at.to_string(),
            name: user.name,
            email: user.email,
            activated: user.activated,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UserEnvelope {
    pub user: UserResponse,
}

impl From<UserRecord> for UserEnvelope {
    fn from(user: UserRecord) -> Self {
        UserEnvelope { user: user.into() }
    }
}
