//! Depot helper extensions.

use std::any::Any;

use salvo::prelude::{Depot, StatusError};

use reel_app::auth::Subject;

/// Helpers for mapping depot extraction failures to HTTP errors.
pub(crate) trait DepotExt {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError>;

    /// The subject resolved for this request, anonymous when none was set.
    fn subject(&self) -> Subject;

    fn insert_subject(&mut self, subject: Subject);
}

impl DepotExt for Depot {
    fn obtain_or_500<T: Any + Send + Sync>(&self) -> Result<&T, StatusError> {
        self.obtain::<T>()
            .map_err(|_ignored| StatusError::internal_server_error())
    }

    fn subject(&self) -> Subject {
        self.obtain::<Subject>()
            .copied()
            .unwrap_or(Subject::ANONYMOUS)
    }

    fn insert_subject(&mut self, subject: Subject) {
        self.inject(subject);
    }
}
