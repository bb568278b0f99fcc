//! Test helpers.

use std::sync::Arc;

use jiff::Timestamp;
use salvo::{affix_state::inject, prelude::*};

use reel_app::{
    admission::{AdmissionConfig, RateLimiter},
    auth::{
        AuthorizationGate, CredentialStore, MockPermissionsRepository, MockTokensRepository,
        PasswordDigest, PermissionsRepository, Subject, TokensRepository,
    },
    clock::ManualClock,
    concurrency::Version,
    context::AppContext,
    domain::{
        movies::{
            MockMoviesService, MoviesService,
            records::{MovieId, MovieRecord},
            runtime::{Runtime, RuntimeError},
        },
        users::{
            MockUsersService, UsersService,
            records::{UserId, UserRecord},
        },
    },
    lifecycle::Lifecycle,
};

use crate::{
    extensions::*,
    state::{ServiceInfo, State},
};

pub(crate) const TEST_ENVIRONMENT: &str = "testing";

/// Builder for handler state. Every collaborator defaults to a mock with no
/// expectations, so any unexpected call fails the test.
pub(crate) struct TestState {
    pub(crate) clock: Arc<ManualClock>,
    pub(crate) lifecycle: Lifecycle,
    admission: AdmissionConfig,
    movies: Arc<dyn MoviesService>,
    users: Arc<dyn UsersService>,
    tokens: Arc<dyn TokensRepository>,
    permissions: Arc<dyn PermissionsRepository>,
}

impl Default for TestState {
    fn default() -> Self {
        Self {
            clock: Arc::new(ManualClock::new(Timestamp::UNIX_EPOCH)),
            lifecycle: Lifecycle::new(),
            admission: AdmissionConfig::default(),
            movies: Arc::new(MockMoviesService::new()),
            users: Arc::new(MockUsersService::new()),
            tokens: Arc::new(MockTokensRepository::new()),
            permissions: Arc::new(MockPermissionsRepository::new()),
        }
    }
}

impl TestState {
    pub(crate) fn with_movies(mut self, movies: MockMoviesService) -> Self {
        self.movies = Arc::new(movies);
        self
    }

    pub(crate) fn with_users(mut self, users: MockUsersService) -> Self {
        self.users = Arc::new(users);
        self
    }

    pub(crate) fn with_tokens(mut self, tokens: MockTokensRepository) -> Self {
        self.tokens = Arc::new(tokens);
        self
    }

    pub(crate) fn with_permissions(mut self, permissions: MockPermissionsRepository) -> Self {
        self.permissions = Arc::new(permissions);
        self
    }

    pub(crate) fn without_limits(mut self) -> Self {
        self.admission.enabled = false;
        self
    }

    pub(crate) fn build(&self) -> Arc<State> {
        let app = AppContext::from_parts(
            Arc::new(RateLimiter::new(self.admission.clone(), self.clock.clone())),
            CredentialStore::new(self.tokens.clone(), self.clock.clone()),
            AuthorizationGate::new(self.permissions.clone()),
            self.movies.clone(),
            self.users.clone(),
            self.lifecycle.clone(),
        );

        State::from_app_context(app, ServiceInfo::new(TEST_ENVIRONMENT))
    }
}

#[salvo::handler]
pub(crate) async fn ok_handler(res: &mut Response) {
    res.render("ok");
}

/// Hoop that attaches a fixed subject, standing in for the auth middleware.
#[derive(Debug, Clone, Copy)]
pub(crate) struct InjectSubject(pub(crate) Subject);

#[salvo::handler]
impl InjectSubject {
    async fn handle(
        &self,
        req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
        ctrl: &mut FlowCtrl,
    ) {
        depot.insert_subject(self.0);
        ctrl.call_next(req, depot, res).await;
    }
}

pub(crate) fn make_movie(id: i64) -> Result<MovieRecord, RuntimeError> {
    Ok(MovieRecord {
        id: MovieId::from_i64(id),
        created_at: Timestamp::UNIX_EPOCH,
        title: "Casablanca".to_owned(),
        year: 1942,
        runtime: Runtime::from_minutes(102)?,
        genres: vec!["drama".to_owned(), "romance".to_owned()],
        version: Version::INITIAL,
    })
}

pub(crate) fn make_user(id: i64, activated: bool) -> UserRecord {
    UserRecord {
        id: UserId::from_i64(id),
        created_at: Timestamp::UNIX_EPOCH,
        name: "Alice Smith".to_owned(),
        email: "alice@example.com".to_owned(),
        password: PasswordDigest::from_stored("$argon2id$v=19$stub".to_owned()),
        activated,
        version: Version::INITIAL,
    }
}

pub(crate) fn movies_service(movies: MockMoviesService, route: Router) -> Service {
    let state = TestState::default().with_movies(movies).build();

    Service::new(Router::new().hoop(inject(state)).push(route))
}

pub(crate) fn users_service(users: MockUsersService, route: Router) -> Service {
    let state = TestState::default().with_users(users).build();

    Service::new(Router::new().hoop(inject(state)).push(route))
}
