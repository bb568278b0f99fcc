//! Request subjects.

use crate::domain::users::records::UserId;

/// Identity attached to a request.
///
/// Id `0` is the anonymous sentinel; it never passes an authentication check,
/// whatever its other fields say.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subject {
    pub id: UserId,
    pub activated: bool,
}

impl Subject {
    pub const ANONYMOUS: Self = Self {
        id: UserId::from_i64(0),
        activated: false,
    };

    #[must_use]
    pub const fn new(id: UserId, activated: bool) -> Self {
        Self { id, activated }
    }

    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.id.into_i64() == 0
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        !self.is_anonymous()
    }
}

impl Default for Subject {
    fn default() -> Self {
        Self::ANONYMOUS
    }
}
