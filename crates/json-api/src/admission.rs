//! Per-client admission middleware.

use std::sync::Arc;

use salvo::prelude::*;
use tracing::debug;

use crate::{
    errors::RATE_LIMITED, extensions::*, observability::record_admission_denied, state::State,
};

#[salvo::handler]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let state = match depot.obtain_or_500::<Arc<State>>() {
        Ok(state) => state,
        Err(error) => {
            res.render(error);
            ctrl.skip_rest();

            return;
        }
    };

    let key = client_key(req);

    if !state.app.admission.admit(&key).is_allowed() {
        debug!(client = %key, "admission denied");
        record_admission_denied();

        res.render(StatusError::too_many_requests().brief(RATE_LIMITED));
        ctrl.skip_rest();

        return;
    }

    ctrl.call_next(req, depot, res).await;
}

/// Clients are keyed by remote IP; the port changes per connection.
fn client_key(req: &Request) -> String {
    req.remote_addr()
        .ip()
        .map_or_else(|| UNKNOWN_CLIENT.to_owned(), |ip| ip.to_string())
}

const UNKNOWN_CLIENT: &str = "unknown";
