//! Activate User Handler

use std::{fmt, sync::Arc};

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::{
    extensions::*,
    state::State,
    users::{UserEnvelope, into_status_error},
};

/// Activate User Request
#[derive(Default, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub(crate) struct ActivateUserRequest {
    /// Plaintext activation token from the welcome mail
    pub token: String,
}

impl fmt::Debug for ActivateUserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivateUserRequest").finish_non_exhaustive()
    }
}

/// Activate User Handler
#[endpoint(
    tags("users"),
    summary = "Activate User",
    responses(
        (status_code = StatusCode::OK, description = "User activated"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid or expired token"),
        (status_code = StatusCode::CONFLICT, description = "Edit conflict"),
    ),
)]
#[tracing::instrument(name = "users.activate", skip(json, depot), err)]
pub(crate) async fn handler(
    json: JsonBody<ActivateUserRequest>,
    depot: &mut Depot,
) -> Result<Json<UserEnvelope>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let request = json.into_inner();

    let user = state
        .app
        .users
        .activate_user(&request.token)
        .await
        .map_err(|error| into_status_error("users.activate", &error))?;

    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use reel_app::domain::users::{MockUsersService, UsersServiceError};

    use crate::test_helpers::{make_user, users_service};

    use super::*;

    const TOKEN: &str = "Y3QMGX3PJ3WLRL2YRTQGQ6KRHU";

    fn make_service(users: MockUsersService) -> Service {
        users_service(users, Router::with_path("users/activated").put(handler))
    }

    #[tokio::test]
    async fn test_activation_returns_activated_user() -> TestResult {
        let mut users = MockUsersService::new();

        users
            .expect_activate_user()
            .once()
            .withf(|token| token == TOKEN)
            .return_once(|_| Ok(make_user(1, true)));

        let mut res = TestClient::put("http://example.com/users/activated")
            .json(&json!({ "token": TOKEN }))
            .send(&make_service(users))
            .await;

        let body: UserEnvelope = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert!(body.user.activated);

        Ok(())
    }

    #[tokio::test]
    async fn test_bad_token_returns_422_on_token() -> TestResult {
        let mut users = MockUsersService::new();

        users
            .expect_activate_user()
            .once()
            .return_once(|_| Err(UsersServiceError::InvalidActivationToken));

        let mut res = TestClient::put("http://example.com/users/activated")
            .json(&json!({ "token": TOKEN }))
            .send(&make_service(users))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));
        assert!(res.take_string().await?.contains("token"));

        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_activation_returns_409() -> TestResult {
        let mut users = MockUsersService::new();

        users
            .expect_activate_user()
            .once()
            .return_once(|_| Err(UsersServiceError::Conflict));

        let res = TestClient::put("http://example.com/users/activated")
            .json(&json!({ "token": TOKEN }))
            .send(&make_service(users))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::CONFLICT));

        Ok(())
    }
}
