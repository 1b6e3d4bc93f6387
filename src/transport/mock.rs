//! In-memory transport for testing
//!
//! Keeps its own copy of the remote records, so tests can assert on what
//! the "server" holds independently of the client cache. Failures and
//! response delays are injected per operation.

use super::{Result, Transport, TransportError};
use crate::model::Entity;
use crate::session::BearerToken;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Transport operations, used to target injected failures and delays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    FetchAll,
    FetchOne,
    Create,
    Update,
    PatchFavorite,
    Remove,
}

struct MockState<E> {
    records: Vec<E>,
    tokens: HashMap<String, String>,
    /// `None` fails every call, `Some(n)` fails the next `n` calls
    failing: HashMap<Operation, Option<usize>>,
    delays: HashMap<Operation, VecDeque<Duration>>,
    calls: HashMap<Operation, usize>,
    next_id: u64,
}

impl<E: Entity> MockState<E> {
    fn begin(&mut self, op: Operation) -> (Option<Duration>, Result<()>) {
        *self.calls.entry(op).or_insert(0) += 1;
        let delay = self.delays.get_mut(&op).and_then(VecDeque::pop_front);

        let fail = match self.failing.get_mut(&op) {
            Some(None) => true,
            Some(Some(remaining)) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        };

        let outcome = if fail {
            Err(TransportError::Status {
                status: 500,
                message: format!("injected failure for {op:?}"),
            })
        } else {
            Ok(())
        };
        (delay, outcome)
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.records
            .iter()
            .position(|record| record.id() == Some(id))
            .ok_or_else(|| TransportError::NotFound(id.to_string()))
    }

    fn user_for(&self, credential: Option<&BearerToken>) -> Result<String> {
        credential
            .and_then(|token| self.tokens.get(token.expose()))
            .cloned()
            .ok_or_else(|| TransportError::Status {
                status: 401,
                message: "missing or unknown credential".into(),
            })
    }
}

/// In-memory [`Transport`] with failure and latency injection
pub struct MockTransport<E> {
    state: Mutex<MockState<E>>,
}

impl<E: Entity> MockTransport<E> {
    /// Create a transport serving `records`
    #[must_use]
    pub fn new(records: Vec<E>) -> Self {
        Self {
            state: Mutex::new(MockState {
                records,
                tokens: HashMap::new(),
                failing: HashMap::new(),
                delays: HashMap::new(),
                calls: HashMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Accept `token` as the credential of `user_id`
    #[must_use]
    pub fn with_user_token(self, token: &str, user_id: &str) -> Self {
        self.lock().tokens.insert(token.to_string(), user_id.to_string());
        self
    }

    /// Make every call to `op` fail until [`recover`](Self::recover)
    pub fn fail(&self, op: Operation) {
        self.lock().failing.insert(op, None);
    }

    /// Make the next `times` calls to `op` fail
    pub fn fail_times(&self, op: Operation, times: usize) {
        self.lock().failing.insert(op, Some(times));
    }

    pub fn recover(&self, op: Operation) {
        self.lock().failing.remove(&op);
    }

    /// Delay the response of the next call to `op`
    ///
    /// Delays queue up: each call consumes one.
    pub fn delay_next(&self, op: Operation, delay: Duration) {
        self.lock().delays.entry(op).or_default().push_back(delay);
    }

    /// Number of calls made to `op`
    #[must_use]
    pub fn calls(&self, op: Operation) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Copy of the server-side records
    #[must_use]
    pub fn records(&self) -> Vec<E> {
        self.lock().records.clone()
    }

    #[must_use]
    pub fn record(&self, id: &str) -> Option<E> {
        self.lock()
            .records
            .iter()
            .find(|record| record.id() == Some(id))
            .cloned()
    }

    /// Replace the server-side records
    pub fn set_records(&self, records: Vec<E>) {
        self.lock().records = records;
    }

    fn lock(&self) -> MutexGuard<'_, MockState<E>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `op` against the state, returning the response delay and result
    fn run<R, F>(&self, op: Operation, f: F) -> (Option<Duration>, Result<R>)
    where
        F: FnOnce(&mut MockState<E>) -> Result<R>,
    {
        let mut state = self.lock();
        let (delay, outcome) = state.begin(op);
        let outcome = outcome.and_then(|()| f(&mut *state));
        (delay, outcome)
    }
}

async fn respond<R>(delay: Option<Duration>, outcome: Result<R>) -> Result<R> {
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    outcome
}

impl<E: Entity> Transport<E> for MockTransport<E> {
    async fn fetch_all(&self, _credential: Option<&BearerToken>) -> Result<Vec<E>> {
        let (delay, outcome) = self.run(Operation::FetchAll, |state| Ok(state.records.clone()));
        respond(delay, outcome).await
    }

    async fn fetch_one(&self, id: &str, _credential: Option<&BearerToken>) -> Result<E> {
        let (delay, outcome) = self.run(Operation::FetchOne, |state| {
            let pos = state.position(id)?;
            Ok(state.records[pos].clone())
        });
        respond(delay, outcome).await
    }

    async fn create(&self, entity: &E, credential: Option<&BearerToken>) -> Result<E> {
        let (delay, outcome) = self.run(Operation::Create, |state| {
            state.user_for(credential)?;
            let mut created = entity.clone();
            created.assign_id(format!("mock-{}", state.next_id));
            state.next_id += 1;
            state.records.push(created.clone());
            Ok(created)
        });
        respond(delay, outcome).await
    }

    async fn update(&self, id: &str, entity: &E, credential: Option<&BearerToken>) -> Result<E> {
        let (delay, outcome) = self.run(Operation::Update, |state| {
            state.user_for(credential)?;
            let pos = state.position(id)?;
            let mut updated = entity.clone();
            updated.assign_id(id.to_string());
            state.records[pos] = updated.clone();
            Ok(updated)
        });
        respond(delay, outcome).await
    }

    async fn patch_favorite(&self, id: &str, credential: Option<&BearerToken>) -> Result<()> {
        let (delay, outcome) = self.run(Operation::PatchFavorite, |state| {
            let user_id = state.user_for(credential)?;
            let pos = state.position(id)?;
            state.records[pos].toggle_like(&user_id);
            Ok(())
        });
        respond(delay, outcome).await
    }

    async fn remove(&self, id: &str, credential: Option<&BearerToken>) -> Result<()> {
        let (delay, outcome) = self.run(Operation::Remove, |state| {
            state.user_for(credential)?;
            let pos = state.position(id)?;
            state.records.remove(pos);
            Ok(())
        });
        respond(delay, outcome).await
    }
}
