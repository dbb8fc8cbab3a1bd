//! Deterministic promise and microtask runtime for Rust tests.
//!
//! A [`Runtime`] owns a promise graph and a FIFO microtask queue. Settling a
//! promise never runs continuations directly; it queues them as microtasks,
//! and nothing runs until the embedder drains the queue with
//! [`Runtime::run_microtask_queue`] or [`Runtime::run_until_settled`]. That
//! makes every interleaving of settlement and continuation execution
//! reproducible from test code.
//!
//! Payloads flow through the graph as dynamic [`Value`]s, so rejection
//! reasons, thenables, and handler results all share one representation.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt;
use std::rc::Rc;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Runtime(String),
    Thrown(ThrownValue),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Runtime(msg) => write!(f, "runtime error: {msg}"),
            Self::Thrown(value) => write!(f, "thrown value: {}", value.as_string()),
        }
    }
}

impl StdError for Error {}

/// A `Value` raised from a native handler, carried through host `Result`s so
/// it can become a structured rejection reason instead of a message string.
#[derive(Debug, Clone, PartialEq)]
pub struct ThrownValue {
    pub(crate) value: Value,
}

impl ThrownValue {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn into_value(self) -> Value {
        self.value
    }

    pub fn as_string(&self) -> String {
        self.value.as_string()
    }
}

mod microtask;
mod promise_combinators;
mod promise_reactions;
mod runtime_api;
mod runtime_state;
mod runtime_values;

#[cfg(test)]
mod tests;

pub use runtime_api::Runtime;
pub use runtime_values::{
    NativeFunctionValue, ObjectValue, PromiseCapabilityFunction, PromiseSettledValue, PromiseValue,
    Value,
};

use runtime_state::{PromiseRuntimeState, ScheduledMicrotask, SchedulerState};
use runtime_values::{
    PromiseAllSettledState, PromiseAllState, PromiseAnyState, PromiseRaceState, PromiseReaction,
    PromiseReactionKind, PromiseState,
};
