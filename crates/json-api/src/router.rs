//! App Router

use salvo::Router;

use reel_app::auth::{MOVIES_READ, MOVIES_WRITE};

use crate::{
    admission, auth, auth::RequirePermission, healthcheck, lifecycle, movies, tokens, users,
};

/// Versioned API routes behind in-flight tracking, admission, and subject
/// resolution. Permission codes are declared per route.
pub fn app_router() -> Router {
    Router::with_path("v1")
        .hoop(lifecycle::track_in_flight)
        .hoop(admission::handler)
        .hoop(auth::middleware::handler)
        .push(Router::with_path("healthcheck").get(healthcheck::handler))
        .push(
            Router::with_path("movies")
                .push(
                    Router::new()
                        .hoop(RequirePermission::new(MOVIES_READ))
                        .get(movies::index::handler)
                        .push(Router::with_path("{id}").get(movies::get::handler)),
                )
                .push(
                    Router::new()
                        .hoop(RequirePermission::new(MOVIES_WRITE))
                        .post(movies::create::handler)
                        .push(
                            Router::with_path("{id}")
                                .patch(movies::update::handler)
                                .delete(movies::delete::handler),
                        ),
                ),
        )
        .push(
            Router::with_path("users")
                .post(users::register::handler)
                .push(Router::with_path("activated").put(users::activate::handler)),
        )
        .push(
            Router::with_path("tokens/authentication").post(tokens::authentication::handler),
        )
}
