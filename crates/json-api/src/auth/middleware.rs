//! Auth middleware.
//!
//! Resolves the request subject from an optional bearer token. Requests without
//! an `Authorization` header continue as the anonymous subject; route-level
//! permission checks decide whether that is enough.

use std::sync::Arc;

use salvo::{
    http::header::{AUTHORIZATION, WWW_AUTHENTICATE},
    prelude::*,
};

use reel_app::auth::{Scope, Subject};

use crate::{
    errors::{AUTHENTICATION_REQUIRED, into_status_error},
    extensions::*,
    state::State,
};

#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let subject = match resolve_subject(req, depot).await {
        Ok(subject) => subject,
        Err(error) => {
            // Header values are static ASCII.
            _ = res.add_header(WWW_AUTHENTICATE, "Bearer", true);
            res.render(error);
            ctrl.skip_rest();

            return;
        }
    };

    depot.insert_subject(subject);

    ctrl.call_next(req, depot, res).await;
}

async fn resolve_subject(req: &Request, depot: &Depot) -> Result<Subject, StatusError> {
    if !req.headers().contains_key(AUTHORIZATION) {
        return Ok(Subject::ANONYMOUS);
    }

    let Some(token) = extract_bearer_token(req) else {
        return Err(StatusError::unauthorized().brief(AUTHENTICATION_REQUIRED));
    };

    let state = depot.obtain_or_500::<Arc<State>>()?;

    state
        .app
        .credentials
        .verify_token(token, Scope::Authentication)
        .await
        .map_err(|error| into_status_error("auth.authenticate", &error))
}

fn extract_bearer_token(req: &Request) -> Option<&str> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let mut parts = value.splitn(2, ' ');

    let scheme = parts.next()?;
    let token = parts.next()?.trim();

    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }

    Some(token)
}
