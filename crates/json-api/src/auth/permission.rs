//! Route-level permission requirement.

use std::sync::Arc;

use salvo::prelude::*;

use crate::{errors::into_status_error, extensions::*, state::State};

/// Hoop that lets a request through only when its subject is authenticated,
/// activated, and holds `code`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct RequirePermission {
    code: &'static str,
}

impl RequirePermission {
    #[must_use]
    pub(crate) const fn new(code: &'static str) -> Self {
        Self { code }
    }
}

#[salvo::handler]
impl RequirePermission {
    async fn handle(
        &self,
        req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
        ctrl: &mut FlowCtrl,
    ) {
        let subject = depot.subject();

        let state = match depot.obtain_or_500::<Arc<State>>() {
            Ok(state) => state,
            Err(error) => {
                res.render(error);
                ctrl.skip_rest();

                return;
            }
        };

        if let Err(error) = state.app.gate.require_permission(&subject, self.code).await {
            res.render(into_status_error("auth.require_permission", &error));
            ctrl.skip_rest();

            return;
        }

        ctrl.call_next(req, depot, res).await;
    }
}

#[cfg(test)]
mod tests {
    use reel_app::{
        auth::{MOVIES_READ, MOVIES_WRITE, MockPermissionsRepository, Permissions, Subject},
        domain::users::records::UserId,
    };
    use salvo::{
        affix_state::inject,
        test::{ResponseExt, TestClient},
    };
    use testresult::TestResult;

    use crate::test_helpers::{InjectSubject, TestState, ok_handler};

    use super::*;

    fn make_service(permissions: MockPermissionsRepository, subject: Subject) -> Service {
        let state = TestState::default().with_permissions(permissions).build();

        Service::new(
            Router::new()
                .hoop(inject(state))
                .hoop(InjectSubject(subject))
                .hoop(RequirePermission::new(MOVIES_WRITE))
                .push(Router::with_path("movies").post(ok_handler)),
        )
    }

    #[tokio::test]
    async fn test_anonymous_subject_returns_401() -> TestResult {
        let mut permissions = MockPermissionsRepository::new();

        permissions.expect_permissions_for_user().never();

        let mut res = TestClient::post("http://example.com/movies")
            .send(&make_service(permissions, Subject::ANONYMOUS))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));
        assert!(res.take_string().await?.contains("authentication required"));

        Ok(())
    }

    #[tokio::test]
    async fn test_inactive_subject_returns_401_with_activation_message() -> TestResult {
        let mut permissions = MockPermissionsRepository::new();

        permissions.expect_permissions_for_user().never();

        let mut res = TestClient::post("http://example.com/movies")
            .send(&make_service(
                permissions,
                Subject::new(UserId::from_i64(3), false),
            ))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNAUTHORIZED));
        assert!(res.take_string().await?.contains("account must be activated"));

        Ok(())
    }

    #[tokio::test]
    async fn test_missing_code_returns_403() -> TestResult {
        let mut permissions = MockPermissionsRepository::new();

        permissions
            .expect_permissions_for_user()
            .once()
            .withf(|user| user.into_i64() == 3)
            .return_once(|_| Ok([MOVIES_READ.to_owned()].into_iter().collect::<Permissions>()));

        let res = TestClient::post("http://example.com/movies")
            .send(&make_service(permissions, Subject::new(UserId::from_i64(3), true)))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }

    #[tokio::test]
    async fn test_granted_code_passes_through() -> TestResult {
        let mut permissions = MockPermissionsRepository::new();

        permissions
            .expect_permissions_for_user()
            .once()
            .return_once(|_| {
                Ok([MOVIES_READ.to_owned(), MOVIES_WRITE.to_owned()]
                    .into_iter()
                    .collect::<Permissions>())
            });

        let mut res = TestClient::post("http://example.com/movies")
            .send(&make_service(permissions, Subject::new(UserId::from_i64(3), true)))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::OK));
        assert_eq!(res.take_string().await?, "ok");

        Ok(())
    }
}
