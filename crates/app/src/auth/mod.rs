//! Authentication and authorization.

mod credentials;
mod errors;
mod gate;
mod password;
mod permissions;
mod repository;
mod subject;
mod token;

pub use credentials::*;
pub use errors::*;
pub use gate::*;
pub use password::*;
pub use permissions::*;
pub use repository::{PgPermissionsRepository, PgTokensRepository};
pub use subject::*;
pub use token::*;
