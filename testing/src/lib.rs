//! # Matchday Testing
//!
//! Ergonomic test utilities for Matchday reducers.
//!
//! [`ReducerTest`] gives reducer unit tests a readable Given/When/Then shape:
//!
//! ```ignore
//! ReducerTest::new(BookingReducer)
//!     .with_env(test_environment())
//!     .given_state(BookingState::default())
//!     .when_action(BookingAction::ProceedToPayment)
//!     .then_state(|state| {
//!         assert_eq!(state.error, Some(BookingError::NoSeatsSelected));
//!     })
//!     .then_effects(assertions::assert_no_effects)
//!     .run();
//! ```

#![allow(clippy::module_name_repetitions)]

use matchday_core::{effect::Effect, reducer::Reducer};

type StateAssertion<S> = Box<dyn FnOnce(&S)>;
type EffectAssertion<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Fluent Given/When/Then harness for a single reducer step.
pub struct ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    reducer: R,
    environment: Option<E>,
    initial_state: Option<S>,
    action: Option<A>,
    state_assertions: Vec<StateAssertion<S>>,
    effect_assertions: Vec<EffectAssertion<A>>,
}

impl<R, S, A, E> ReducerTest<R, S, A, E>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    /// Create a test around the given reducer.
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            initial_state: None,
            action: None,
            state_assertions: Vec::new(),
            effect_assertions: Vec::new(),
        }
    }

    /// Set the environment for the test.
    #[must_use]
    pub fn with_env(mut self, env: E) -> Self {
        self.environment = Some(env);
        self
    }

    /// Set the initial state (Given).
    #[must_use]
    pub fn given_state(mut self, state: S) -> Self {
        self.initial_state = Some(state);
        self
    }

    /// Set the action under test (When).
    #[must_use]
    pub fn when_action(mut self, action: A) -> Self {
        self.action = Some(action);
        self
    }

    /// Add an assertion over the resulting state (Then).
    #[must_use]
    pub fn then_state<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&S) + 'static,
    {
        self.state_assertions.push(Box::new(assertion));
        self
    }

    /// Add an assertion over the returned effects (Then).
    #[must_use]
    pub fn then_effects<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&[Effect<A>]) + 'static,
    {
        self.effect_assertions.push(Box::new(assertion));
        self
    }

    /// Run the reducer once and execute all assertions.
    ///
    /// # Panics
    ///
    /// Panics if the initial state, action, or environment was not set, or
    /// if any assertion fails.
    #[allow(clippy::expect_used)] // Test harness can use expect
    pub fn run(self) {
        let mut state = self
            .initial_state
            .expect("initial state must be set with given_state()");
        let action = self.action.expect("action must be set with when_action()");
        let env = self
            .environment
            .expect("environment must be set with with_env()");

        let effects = self.reducer.reduce(&mut state, action, &env);

        for assertion in self.state_assertions {
            assertion(&state);
        }
        for assertion in self.effect_assertions {
            assertion(&effects);
        }
    }
}

/// Ready-made assertions over effect slices.
pub mod assertions {
    use matchday_core::effect::Effect;

    /// Assert that the reducer returned no effects.
    ///
    /// # Panics
    ///
    /// Panics if any effect other than a lone `Effect::None` is present.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.is_empty() || matches!(effects, [Effect::None]),
            "expected no effects, found {}: {effects:?}",
            effects.len(),
        );
    }

    /// Assert the exact number of effects.
    ///
    /// # Panics
    ///
    /// Panics if the count differs.
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "expected {expected} effects, found {}",
            effects.len()
        );
    }

    /// Assert that at least one `Effect::Future` is present.
    ///
    /// # Panics
    ///
    /// Panics if no future effect is found.
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Future(_))),
            "expected at least one Future effect"
        );
    }

    /// Assert that at least one `Effect::Delay` is present.
    ///
    /// # Panics
    ///
    /// Panics if no delay effect is found.
    pub fn assert_has_delay_effect<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().any(|e| matches!(e, Effect::Delay { .. })),
            "expected at least one Delay effect"
        );
    }
}
