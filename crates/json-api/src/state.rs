//! State

use std::sync::Arc;

use reel_app::context::AppContext;

/// Facts about the running service reported by the healthcheck.
#[derive(Debug, Clone)]
pub(crate) struct ServiceInfo {
    pub(crate) environment: String,
    pub(crate) version: &'static str,
}

impl ServiceInfo {
    #[must_use]
    pub(crate) fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

#[derive(Clone)]
pub(crate) struct State {
    pub(crate) app: AppContext,
    pub(crate) service: ServiceInfo,
}

impl State {
    #[must_use]
    pub(crate) fn new(app: AppContext, service: ServiceInfo) -> Self {
        Self { app, service }
    }

    #[must_use]
    pub(crate) fn from_app_context(app: AppContext, service: ServiceInfo) -> Arc<Self> {
        Arc::new(Self::new(app, service))
    }
}
