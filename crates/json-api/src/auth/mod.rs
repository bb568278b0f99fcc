//! Authentication and authorization middleware.

pub(crate) mod middleware;
mod permission;

pub(crate) use permission::RequirePermission;
