//! # Matchday Runtime
//!
//! The [`Store`] runtime that drives Matchday reducers.
//!
//! A store owns one feature's state behind an async `RwLock`, runs the
//! reducer when an action is sent, executes the returned effects in spawned
//! tasks, and feeds any actions those effects produce back through the
//! reducer. Every fed-back action is also broadcast to observers, which is
//! what lets callers wait for a terminal action of an async workflow (for
//! the booking flow: `TicketsIssued` or `BookingFailed`).
//!
//! ## Example
//!
//! ```ignore
//! let store = Store::new(BookingState::default(), BookingReducer, env);
//!
//! store.send(BookingAction::ToggleSeat { number: "C14".into() }).await?;
//!
//! let outcome = store
//!     .send_and_wait_for(
//!         BookingAction::SubmitPayment { phone_input: "0712345678".into() },
//!         |a| matches!(a, BookingAction::TicketsIssued { .. } | BookingAction::BookingFailed { .. }),
//!         Duration::from_secs(10),
//!     )
//!     .await?;
//! ```

use matchday_core::{effect::Effect, reducer::Reducer};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, broadcast};

/// Errors surfaced by [`Store`] operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store is shutting down and no longer accepts actions.
    #[error("store is shutting down")]
    ShutdownInProgress,

    /// Shutdown timed out with effects still running.
    #[error("shutdown timed out with {0} effects still running")]
    ShutdownTimeout(usize),

    /// Timeout waiting for a terminal action in [`Store::send_and_wait_for`].
    #[error("timeout waiting for action")]
    Timeout,

    /// The action broadcast channel closed, typically during shutdown.
    #[error("action broadcast channel closed")]
    ChannelClosed,
}

/// Shared innards of a store; `Store` itself is a cheap Arc handle.
struct StoreInner<S, A, E, R> {
    state: RwLock<S>,
    reducer: R,
    environment: E,
    shutdown: AtomicBool,
    pending_effects: AtomicUsize,
    action_tx: broadcast::Sender<A>,
}

/// RAII guard that decrements the pending-effect counter.
struct PendingGuard<S, A, E, R>(Arc<StoreInner<S, A, E, R>>);

impl<S, A, E, R> Drop for PendingGuard<S, A, E, R> {
    fn drop(&mut self) {
        self.0.pending_effects.fetch_sub(1, Ordering::SeqCst);
    }
}

/// The runtime coordinator for one reducer.
///
/// Manages state, reducer execution, effect execution with action feedback,
/// and graceful shutdown. Cloning a `Store` clones a handle to the same
/// state.
pub struct Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    inner: Arc<StoreInner<S, A, E, R>>,
}

impl<S, A, E, R> Clone for Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A, E, R> Store<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    A: Clone + Send + Sync + 'static,
    S: Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Create a store with an initial state, reducer, and environment.
    #[must_use]
    pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
        Self::with_broadcast_capacity(initial_state, reducer, environment, 16)
    }

    /// Create a store with a custom action-broadcast capacity.
    ///
    /// The default of 16 suits one interactive session; raise it when many
    /// observers subscribe to a busy store.
    #[must_use]
    pub fn with_broadcast_capacity(
        initial_state: S,
        reducer: R,
        environment: E,
        capacity: usize,
    ) -> Self {
        let (action_tx, _) = broadcast::channel(capacity);
        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(initial_state),
                reducer,
                environment,
                shutdown: AtomicBool::new(false),
                pending_effects: AtomicUsize::new(0),
                action_tx,
            }),
        }
    }

    /// Send an action through the reducer and start its effects.
    ///
    /// The reducer runs synchronously under the state write lock; effects
    /// run in spawned tasks, so `send` returns after effect execution has
    /// *started*, not completed. Use [`Store::send_and_wait_for`] or
    /// [`Store::settled`] when completion matters.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownInProgress`] once shutdown has begun.
    #[tracing::instrument(skip_all, name = "store_send")]
    pub async fn send(&self, action: A) -> Result<(), StoreError> {
        if self.inner.shutdown.load(Ordering::Acquire) {
            return Err(StoreError::ShutdownInProgress);
        }
        metrics::counter!("store.actions").increment(1);
        Self::dispatch(Arc::clone(&self.inner), action).await;
        Ok(())
    }

    /// Send an action and wait for a matching fed-back action.
    ///
    /// Designed for request/response use of an async workflow: subscribe to
    /// the action broadcast before sending (so nothing is missed), send the
    /// action, and return the first fed-back action the predicate accepts.
    ///
    /// Only actions produced by effects are broadcast, not the initial
    /// action itself.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Timeout`] if no matching action arrives in time
    /// - [`StoreError::ChannelClosed`] if the broadcast channel closes
    /// - [`StoreError::ShutdownInProgress`] if the store is shutting down
    pub async fn send_and_wait_for<F>(
        &self,
        action: A,
        predicate: F,
        timeout: Duration,
    ) -> Result<A, StoreError>
    where
        F: Fn(&A) -> bool,
    {
        let mut rx = self.inner.action_tx.subscribe();
        self.send(action).await?;

        tokio::time::timeout(timeout, async {
            loop {
                match rx.recv().await {
                    Ok(action) if predicate(&action) => return Ok(action),
                    Ok(_) => {},
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Keep waiting; if the terminal action was among the
                        // skipped ones the timeout reports it.
                        tracing::warn!(skipped, "action observer lagged");
                    },
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(StoreError::ChannelClosed);
                    },
                }
            }
        })
        .await
        .map_err(|_| StoreError::Timeout)?
    }

    /// Read a projection of the current state.
    pub async fn state<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&S) -> T,
    {
        let state = self.inner.state.read().await;
        f(&state)
    }

    /// Subscribe to every action produced by effects.
    #[must_use]
    pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
        self.inner.action_tx.subscribe()
    }

    /// Number of effects currently running.
    #[must_use]
    pub fn pending_effects(&self) -> usize {
        self.inner.pending_effects.load(Ordering::Acquire)
    }

    /// Wait until no effects are running or the timeout expires.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if effects are still pending when the
    /// timeout elapses.
    pub async fn settled(&self, timeout: Duration) -> Result<(), StoreError> {
        let start = tokio::time::Instant::now();
        while self.pending_effects() > 0 {
            if start.elapsed() >= timeout {
                return Err(StoreError::Timeout);
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        Ok(())
    }

    /// Gracefully shut down: reject new actions, wait for running effects.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ShutdownTimeout`] if effects are still running
    /// when the timeout elapses.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
        tracing::info!("initiating store shutdown");
        self.inner.shutdown.store(true, Ordering::Release);

        match self.settled(timeout).await {
            Ok(()) => {
                metrics::counter!("store.shutdown.completed").increment(1);
                Ok(())
            },
            Err(_) => {
                let pending = self.pending_effects();
                tracing::error!(pending, "shutdown timed out with effects running");
                Err(StoreError::ShutdownTimeout(pending))
            },
        }
    }

    /// Run the reducer under the write lock and start the returned effects.
    async fn dispatch(inner: Arc<StoreInner<S, A, E, R>>, action: A) {
        let effects = {
            let mut state = inner.state.write().await;
            inner.reducer.reduce(&mut state, action, &inner.environment)
        };
        for effect in effects {
            Self::spawn_effect(Arc::clone(&inner), effect);
        }
    }

    fn spawn_effect(inner: Arc<StoreInner<S, A, E, R>>, effect: Effect<A>) {
        inner.pending_effects.fetch_add(1, Ordering::SeqCst);
        metrics::counter!("store.effects.started").increment(1);
        tokio::spawn(async move {
            let guard = PendingGuard(Arc::clone(&inner));
            Self::run_effect(inner, effect).await;
            drop(guard);
        });
    }

    /// Execute one effect tree; boxed for recursion through nested effects.
    fn run_effect(
        inner: Arc<StoreInner<S, A, E, R>>,
        effect: Effect<A>,
    ) -> futures::future::BoxFuture<'static, ()> {
        Box::pin(async move {
            match effect {
                Effect::None => {},
                Effect::Parallel(effects) => {
                    let tasks = effects
                        .into_iter()
                        .map(|e| Self::run_effect(Arc::clone(&inner), e));
                    futures::future::join_all(tasks).await;
                },
                Effect::Sequential(effects) => {
                    for e in effects {
                        Self::run_effect(Arc::clone(&inner), e).await;
                    }
                },
                Effect::Delay { duration, action } => {
                    tokio::time::sleep(duration).await;
                    Self::feed_back(inner, *action).await;
                },
                Effect::Future(fut) => {
                    if let Some(action) = fut.await {
                        Self::feed_back(inner, action).await;
                    }
                },
            }
        })
    }

    /// Broadcast a fed-back action to observers and route it to the reducer.
    async fn feed_back(inner: Arc<StoreInner<S, A, E, R>>, action: A) {
        metrics::counter!("store.actions.fed_back").increment(1);
        let _ = inner.action_tx.send(action.clone());
        Box::pin(Self::dispatch(inner, action)).await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use matchday_core::smallvec;
    use smallvec::SmallVec;

    #[derive(Clone, Debug, Default)]
    struct CounterState {
        count: i32,
        confirmations: u32,
    }

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum CounterAction {
        Increment,
        IncrementLater,
        Confirmed,
    }

    struct CounterEnv;

    struct CounterReducer;

    impl Reducer for CounterReducer {
        type State = CounterState;
        type Action = CounterAction;
        type Environment = CounterEnv;

        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            _env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]> {
            match action {
                CounterAction::Increment => {
                    state.count += 1;
                    smallvec![Effect::future(async { Some(CounterAction::Confirmed) })]
                },
                CounterAction::IncrementLater => {
                    smallvec![Effect::Delay {
                        duration: Duration::from_millis(10),
                        action: Box::new(CounterAction::Increment),
                    }]
                },
                CounterAction::Confirmed => {
                    state.confirmations += 1;
                    SmallVec::new()
                },
            }
        }
    }

    fn store() -> Store<CounterState, CounterAction, CounterEnv, CounterReducer> {
        Store::new(CounterState::default(), CounterReducer, CounterEnv)
    }

    #[tokio::test]
    async fn send_updates_state_and_runs_effects() {
        let store = store();
        store.send(CounterAction::Increment).await.unwrap();
        store.settled(Duration::from_secs(1)).await.unwrap();

        assert_eq!(store.state(|s| s.count).await, 1);
        assert_eq!(store.state(|s| s.confirmations).await, 1);
    }

    #[tokio::test]
    async fn send_and_wait_for_returns_terminal_action() {
        let store = store();
        let result = store
            .send_and_wait_for(
                CounterAction::Increment,
                |a| matches!(a, CounterAction::Confirmed),
                Duration::from_secs(1),
            )
            .await
            .unwrap();
        assert_eq!(result, CounterAction::Confirmed);
    }

    #[tokio::test]
    async fn delay_effect_feeds_action_back() {
        let store = store();
        store.send(CounterAction::IncrementLater).await.unwrap();
        store.settled(Duration::from_secs(1)).await.unwrap();
        assert_eq!(store.state(|s| s.count).await, 1);
    }

    #[tokio::test]
    async fn shutdown_rejects_new_actions() {
        let store = store();
        store.shutdown(Duration::from_secs(1)).await.unwrap();
        let err = store.send(CounterAction::Increment).await.unwrap_err();
        assert!(matches!(err, StoreError::ShutdownInProgress));
    }
}
