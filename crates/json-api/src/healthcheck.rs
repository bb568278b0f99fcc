//! Reel JSON API Healthcheck Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{extensions::*, state::State};

/// Healthcheck response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Deployment environment name
    pub environment: String,

    /// Running build version
    pub version: String,
}

/// Healthcheck handler
///
/// Returns service health status
#[endpoint(tags("health"), summary = "Health check endpoint")]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<HealthResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    Ok(Json(HealthResponse {
        status: "available".to_string(),
        environment: state.service.environment.clone(),
        version: state.service.version.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use salvo::{
        affix_state::inject,
        test::{ResponseExt, TestClient},
    };
    use testresult::TestResult;

    use crate::test_helpers::{TEST_ENVIRONMENT, TestState};

    use super::*;

    #[tokio::test]
    async fn test_healthcheck() -> TestResult {
        let router = Router::new()
            .hoop(inject(TestState::default().build()))
            .push(Router::with_path("healthcheck").get(handler));

        let response: HealthResponse = TestClient::get("http://example.com/healthcheck")
            .send(&Service::new(router))
            .await
            .take_json()
            .await?;

        assert_eq!(response.status, "available");
        assert_eq!(response.environment, TEST_ENVIRONMENT);
        assert_eq!(response.version, env!("CARGO_PKG_VERSION"));

        Ok(())
    }
}
