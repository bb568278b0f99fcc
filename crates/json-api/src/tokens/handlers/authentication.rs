//! Create Authentication Token Handler

use std::{fmt, sync::Arc};

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use reel_app::{auth::IssuedToken, domain::users::data::Credentials};

use crate::{extensions::*, state::State, users::into_status_error};

/// Create Authentication Token Request
#[derive(Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub(crate) struct CreateTokenRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for CreateTokenRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateTokenRequest")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl From<CreateTokenRequest> for Credentials {
    fn from(request: CreateTokenRequest) -> Self {
        Credentials {
            email: request.email,
            password: request.password,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub(crate) struct TokenResponse {
    /// Plaintext bearer token. Shown once; only its digest is stored.
    pub token: String,
    pub expiry: String,
}

impl fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenResponse")
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}

impl From<IssuedToken> for TokenResponse {
    fn from(issued: IssuedToken) -> Self {
        TokenResponse {
            expiry: issued.expiry.to_string(),
            token: issued.plaintext,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct TokenEnvelope {
    pub authentication_token: TokenResponse,
}

/// Create Authentication Token Handler
///
/// Exchanges an email and password for a 24 hour bearer token.
#[endpoint(
    tags("tokens"),
    summary = "Create Authentication Token",
    responses(
        (status_code = StatusCode::CREATED, description = "Token issued"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Invalid credentials"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid request"),
    ),
)]
#[tracing::instrument(name = "tokens.authentication", skip(json, depot, res), err)]
pub(crate) async fn handler(
    json: JsonBody<CreateTokenRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<TokenEnvelope>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let issued = state
        .app
        .users
        .create_authentication_token(json.into_inner().into())
        .await
        .map_err(|error| into_status_error("tokens.authentication", &error))?;

    res.status_code(StatusCode::CREATED);

    Ok(Json(TokenEnvelope {
        authentication_token: issued.into(),
    }))
}
