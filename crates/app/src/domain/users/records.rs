//! User Records

use jiff::Timestamp;

use crate::{auth::PasswordDigest, concurrency::Version, ids::TypedId};

/// User ID
pub type UserId = TypedId<UserRecord>;

/// User Record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: UserId,
    pub created_at: Timestamp,
    pub name: String,
    pub email: String,
    pub password: PasswordDigest,
    pub activated: bool,
    pub version: Version,
}
