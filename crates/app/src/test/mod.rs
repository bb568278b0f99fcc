//! In-process stand-ins for the backing store.

pub(crate) mod db;

use std::{future, io, sync::Arc};

use async_trait::async_trait;
use jiff::Timestamp;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::subscriber::DefaultGuard;

use crate::{
    auth::{
        NewToken, Permissions, PermissionsRepository, Scope, Subject, TokenDigest,
        TokensRepository,
    },
    concurrency::{Version, VersionedStore},
    domain::users::records::UserId,
};

/// Versioned records behind one lock, with the same compare-and-increment
/// contract as the SQL `UPDATE ... WHERE version = $n`.
#[derive(Debug)]
pub(crate) struct InMemoryVersionedStore<P> {
    records: Mutex<FxHashMap<i64, (Version, P)>>,
    stalled: bool,
}

impl<P: Clone> InMemoryVersionedStore<P> {
    pub(crate) fn empty() -> Self {
        Self {
            records: Mutex::new(FxHashMap::default()),
            stalled: false,
        }
    }

    pub(crate) fn with_record(id: i64, payload: P) -> Self {
        let store = Self::empty();
        store
            .records
            .lock()
            .insert(id, (Version::INITIAL, payload));
        store
    }

    /// Every call pends forever.
    pub(crate) fn stalled(mut self) -> Self {
        self.stalled = true;
        self
    }

    pub(crate) fn snapshot(&self, id: i64) -> Option<(Version, P)> {
        self.records.lock().get(&id).cloned()
    }
}

#[async_trait]
impl<P> VersionedStore<i64, P> for InMemoryVersionedStore<P>
where
    P: Clone + Send + Sync,
{
    async fn compare_and_increment(
        &self,
        id: i64,
        expected: Version,
        changes: &P,
    ) -> Result<Option<Version>, sqlx::Error> {
        if self.stalled {
            future::pending::<()>().await;
        }

        tokio::task::yield_now().await;

        let mut records = self.records.lock();

        match records.get_mut(&id) {
            Some((version, payload)) if *version == expected => {
                *version = version.next();
                *payload = changes.clone();

                Ok(Some(*version))
            }
            _ => Ok(None),
        }
    }

    async fn exists(&self, id: i64) -> Result<bool, sqlx::Error> {
        if self.stalled {
            future::pending::<()>().await;
        }

        Ok(self.records.lock().contains_key(&id))
    }
}

/// Token rows plus the activation flag of each known user.
#[derive(Debug, Default)]
pub(crate) struct InMemoryTokens {
    tokens: Mutex<Vec<NewToken>>,
    users: Mutex<FxHashMap<UserId, bool>>,
    stalled: bool,
}

impl InMemoryTokens {
    pub(crate) fn add_user(&self, user: UserId, activated: bool) {
        self.users.lock().insert(user, activated);
    }

    pub(crate) fn stalled(mut self) -> Self {
        self.stalled = true;
        self
    }

    pub(crate) fn stored(&self) -> Vec<NewToken> {
        self.tokens.lock().clone()
    }

    async fn wait_if_stalled(&self) {
        if self.stalled {
            future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl TokensRepository for InMemoryTokens {
    async fn insert_token(&self, token: &NewToken) -> Result<(), sqlx::Error> {
        self.wait_if_stalled().await;
        self.tokens.lock().push(token.clone());

        Ok(())
    }

    async fn find_subject(
        &self,
        digest: &TokenDigest,
        scope: Scope,
        now: Timestamp,
    ) -> Result<Option<Subject>, sqlx::Error> {
        self.wait_if_stalled().await;

        let owner = self
            .tokens
            .lock()
            .iter()
            .find(|token| token.digest == *digest && token.scope == scope && token.expiry > now)
            .map(|token| token.user);

        Ok(owner.and_then(|user| {
            self.users
                .lock()
                .get(&user)
                .map(|activated| Subject::new(user, *activated))
        }))
    }

    async fn delete_tokens(&self, user: UserId, scope: Scope) -> Result<u64, sqlx::Error> {
        self.wait_if_stalled().await;

        let mut tokens = self.tokens.lock();
        let before = tokens.len();
        tokens.retain(|token| !(token.user == user && token.scope == scope));

        Ok((before - tokens.len()) as u64)
    }
}

/// Grant table keyed by user; grants are visible to the next lookup.
#[derive(Debug, Default)]
pub(crate) struct InMemoryPermissions {
    grants: Mutex<FxHashMap<UserId, Vec<String>>>,
}

#[async_trait]
impl PermissionsRepository for InMemoryPermissions {
    async fn permissions_for_user(&self, user: UserId) -> Result<Permissions, sqlx::Error> {
        Ok(self
            .grants
            .lock()
            .get(&user)
            .map(|codes| codes.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn grant_permissions(&self, user: UserId, codes: &[String]) -> Result<(), sqlx::Error> {
        let mut grants = self.grants.lock();
        let held = grants.entry(user).or_default();

        for code in codes {
            if !held.contains(code) {
                held.push(code.clone());
            }
        }

        Ok(())
    }
}

/// Collects everything logged on this thread while it is alive.
pub(crate) struct CapturedLogs {
    buffer: Arc<Mutex<Vec<u8>>>,
    _guard: DefaultGuard,
}

impl CapturedLogs {
    pub(crate) fn start() -> Self {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let writer = Arc::clone(&buffer);

        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::TRACE)
            .with_writer(move || SharedBuffer(Arc::clone(&writer)))
            .finish();

        Self {
            buffer,
            _guard: tracing::subscriber::set_default(subscriber),
        }
    }

    pub(crate) fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }
}

struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedBuffer {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(bytes);

        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
