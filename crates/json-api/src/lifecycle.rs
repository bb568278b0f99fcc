//! In-flight request tracking.

use std::sync::Arc;

use salvo::prelude::*;

use crate::{errors::UNAVAILABLE, extensions::*, state::State};

/// Count the request as outstanding work until the response is written, so
/// shutdown waits for it before the pool is closed.
#[salvo::handler]
pub(crate) async fn track_in_flight(
    req: &mut Request,
    depot: &mut Depot,
    res: &mut Response,
    ctrl: &mut FlowCtrl,
) {
    let lifecycle = match depot.obtain_or_500::<Arc<State>>() {
        Ok(state) => state.app.lifecycle.clone(),
        Err(error) => {
            res.render(error);
            ctrl.skip_rest();

            return;
        }
    };

    if lifecycle.is_shutting_down() {
        res.render(StatusError::service_unavailable().brief(UNAVAILABLE));
        ctrl.skip_rest();

        return;
    }

    let _in_flight = lifecycle.track();

    ctrl.call_next(req, depot, res).await;
}
