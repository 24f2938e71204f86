//! # Matchday Core
//!
//! Core traits and types for the Matchday booking architecture.
//!
//! The booking flow is built as a set of reducers: pure functions from
//! `(State, Action, Environment)` to `(State, Effects)`. All I/O (ticket
//! writes, identity lookups, the M-Pesa prompt) is described by
//! [`effect::Effect`] values and executed by the store runtime, never inside
//! the reducer itself.
//!
//! ## Core concepts
//!
//! - **State**: owned, `Clone`-able domain state for one feature (e.g. the
//!   seat selection and booking phase for the active session)
//! - **Action**: every input a reducer can receive, user commands and the
//!   events fed back by completed effects alike
//! - **Reducer**: the business logic, deterministic and unit-testable
//! - **Effect**: a side-effect description (not execution)
//! - **Environment**: injected dependencies behind traits; a session is
//!   passed in explicitly rather than looked up from ambient context
//!
//! ## Example
//!
//! ```ignore
//! use matchday_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! impl Reducer for BookingReducer {
//!     type State = BookingState;
//!     type Action = BookingAction;
//!     type Environment = BookingEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut BookingState,
//!         action: BookingAction,
//!         env: &BookingEnvironment,
//!     ) -> SmallVec<[Effect<BookingAction>; 4]> {
//!         match action {
//!             BookingAction::ToggleSeat { number } => {
//!                 state.toggle(&number);
//!                 SmallVec::new()
//!             }
//!             _ => SmallVec::new(),
//!         }
//!     }
//! }
//! ```

// Re-export commonly used types so reducers only need one import.
pub use chrono::{DateTime, Utc};
pub use smallvec::{SmallVec, smallvec};

/// The core trait for business logic.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// A reducer turns an action into state changes plus effect descriptions.
    ///
    /// Reducers are pure: given the same state, action, and environment they
    /// produce the same result. Anything that touches the network belongs in
    /// a returned [`Effect`], not in the reducer body.
    pub trait Reducer {
        /// The state type this reducer operates on.
        type State;

        /// The action type this reducer processes.
        type Action;

        /// The injected dependencies this reducer reads.
        type Environment;

        /// Reduce an action into in-place state changes and effects.
        ///
        /// The returned effects are executed by the store runtime; actions
        /// they produce are fed back through this same function.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Side-effect descriptions returned by reducers.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Boxed future an effect runs, optionally feeding an action back.
    pub type EffectFuture<Action> = Pin<Box<dyn Future<Output = Option<Action>> + Send>>;

    /// Describes a side effect to be executed by the store runtime.
    ///
    /// Effects are values. A reducer returning `Effect::Future(..)` has not
    /// performed any I/O yet; the runtime awaits the future in a spawned
    /// task and, if it yields an action, routes that action back through the
    /// reducer.
    pub enum Effect<Action> {
        /// No-op effect.
        None,

        /// Run the contained effects concurrently.
        Parallel(Vec<Effect<Action>>),

        /// Run the contained effects one after another.
        ///
        /// Used where ordering is a contract: the per-seat ticket writes of
        /// a booking submission must leave a deterministic prefix if one of
        /// them fails.
        Sequential(Vec<Effect<Action>>),

        /// Dispatch an action after a delay.
        Delay {
            /// How long to wait.
            duration: Duration,
            /// Action to dispatch after the delay.
            action: Box<Action>,
        },

        /// Arbitrary async computation.
        ///
        /// If the future resolves to `Some(action)`, the action is fed back
        /// into the reducer.
        Future(EffectFuture<Action>),
    }

    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run concurrently.
        #[must_use]
        pub fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run one after another.
        #[must_use]
        pub fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Wrap an async block as an effect.
        pub fn future<F>(fut: F) -> Effect<Action>
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Effect::Future(Box::pin(fut))
        }
    }
}

/// Dependency-injection traits shared by every environment.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Abstracts time so reducers stay deterministic under test.
    pub trait Clock: Send + Sync {
        /// Get the current time.
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Fixed clock for deterministic tests.
    #[derive(Clone, Copy, Debug)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a clock pinned to `time`.
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::effect::Effect;
    use super::environment::{Clock, FixedClock};
    use chrono::{TimeZone, Utc};

    #[test]
    fn fixed_clock_is_deterministic() {
        let t = Utc.with_ymd_and_hms(2025, 6, 1, 15, 0, 0).single().unwrap();
        let clock = FixedClock::new(t);
        assert_eq!(clock.now(), t);
        assert_eq!(clock.now(), clock.now());
    }

    #[test]
    fn effect_combinators_preserve_shape() {
        let merged: Effect<u32> = Effect::merge(vec![Effect::None, Effect::None]);
        assert!(matches!(merged, Effect::Parallel(ref v) if v.len() == 2));

        let chained: Effect<u32> = Effect::chain(vec![Effect::None]);
        assert!(matches!(chained, Effect::Sequential(ref v) if v.len() == 1));
    }
}
