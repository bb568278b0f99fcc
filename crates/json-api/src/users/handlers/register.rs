//! Register User Handler

use std::{fmt, sync::Arc};

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use reel_app::domain::users::data::NewUser;

use crate::{
    extensions::*,
    state::State,
    users::{UserEnvelope, into_status_error},
};

/// Register User Request
#[derive(Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub(crate) struct RegisterUserRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for RegisterUserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterUserRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl From<RegisterUserRequest> for NewUser {
    fn from(request: RegisterUserRequest) -> Self {
        NewUser {
            name: request.name,
            email: request.email,
            password: request.password,
        }
    }
}

/// Register User Handler
///
/// Creates an inactive account. The activation token is mailed, not returned.
#[endpoint(
    tags("users"),
    summary = "Register User",
    responses(
        (status_code = StatusCode::ACCEPTED, description = "User registered, activation mail queued"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid user or duplicate email"),
    ),
)]
#[tracing::instrument(name = "users.register", skip(json, depot, res), err)]
pub(crate) async fn handler(
    json: JsonBody<RegisterUserRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<UserEnvelope>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let user = state
        .app
        .users
        .register_user(json.into_inner().into())
        .await
        .map_err(|error| into_status_error("users.register", &error))?;

    res.status_code(StatusCode::ACCEPTED);

    Ok(Json(user.into()))
}
