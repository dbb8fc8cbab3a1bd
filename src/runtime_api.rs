use super::*;

/// Single-threaded promise runtime.
///
/// Owns every promise it creates plus the microtask queue their continuations
/// run on. All methods that touch the graph take `&mut self`; there is no
/// hidden executor and no background thread.
#[derive(Debug)]
pub struct Runtime {
    pub(crate) scheduler: SchedulerState,
    pub(crate) promise_runtime: PromiseRuntimeState,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    pub fn new() -> Self {
        Self {
            scheduler: SchedulerState::default(),
            promise_runtime: PromiseRuntimeState::default(),
        }
    }

    /// Caps how many microtasks a single drain may run before failing with a
    /// diagnostic error. Guards tests against self-requeueing loops.
    pub fn set_microtask_step_limit(&mut self, limit: usize) {
        self.scheduler.microtask_step_limit = limit.max(1);
    }

    pub fn new_array_value(values: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(values)))
    }

    pub fn new_object_value(entries: Vec<(String, Value)>) -> Value {
        Value::Object(Rc::new(RefCell::new(ObjectValue::new(entries))))
    }

    /// Wraps a host closure as a callable [`Value`].
    pub fn native_function(
        body: impl Fn(&mut Runtime, &[Value]) -> Result<Value> + 'static,
    ) -> Value {
        Value::Function(Rc::new(NativeFunctionValue {
            body: Box::new(body),
        }))
    }

    /// Raises `value` from inside a native handler; the runtime converts it
    /// into a rejection of the relevant promise.
    pub fn throw(value: Value) -> Error {
        Error::Thrown(ThrownValue::new(value))
    }

    pub(crate) fn promise_error_reason(err: Error) -> Value {
        match err {
            Error::Thrown(value) => value.into_value(),
            err => Value::String(format!("{err}")),
        }
    }

    /// Invokes a callable `Value` with `args`. Settlement capabilities accept
    /// at most one argument and ignore the rest.
    pub fn call_function(&mut self, callable: &Value, args: &[Value]) -> Result<Value> {
        match callable {
            Value::Function(function) => (function.body)(self, args),
            Value::PromiseCapability(capability) => {
                let argument = args.first().cloned().unwrap_or(Value::Undefined);
                self.call_promise_capability(capability.clone(), argument)?;
                Ok(Value::Undefined)
            }
            other => Err(Error::Runtime(format!(
                "value is not callable: {}",
                other.as_string()
            ))),
        }
    }

    /// Creates a promise and synchronously runs `executor` with its resolve
    /// and reject capabilities. A fault in the executor rejects the promise.
    pub fn promise_new(&mut self, executor: &Value) -> Result<Value> {
        if !executor.is_callable() {
            return Err(Error::Runtime(
                "promise executor must be a function".into(),
            ));
        }
        let promise = self.new_pending_promise();
        let (resolve, reject) = self.new_promise_capability_functions(promise.clone());
        if let Err(err) = self.call_function(executor, &[resolve, reject]) {
            self.promise_reject(&promise, Self::promise_error_reason(err));
        }
        Ok(Value::Promise(promise))
    }

    /// Returns the promise, its resolve capability, and its reject capability.
    pub fn promise_with_resolvers(&mut self) -> (Value, Value, Value) {
        let promise = self.new_pending_promise();
        let (resolve, reject) = self.new_promise_capability_functions(promise.clone());
        (Value::Promise(promise), resolve, reject)
    }

    /// Registers continuations and returns the next promise in the chain.
    /// Non-callable handlers count as absent: a missing `on_fulfilled` passes
    /// the value through, a missing `on_rejected` re-raises the reason.
    pub fn promise_then(
        &mut self,
        target: &Value,
        on_fulfilled: Option<Value>,
        on_rejected: Option<Value>,
    ) -> Result<Value> {
        let promise = Self::promise_from_value(target)?;
        let on_fulfilled = on_fulfilled.filter(Value::is_callable);
        let on_rejected = on_rejected.filter(Value::is_callable);
        Ok(Value::Promise(self.promise_then_internal(
            &promise,
            on_fulfilled,
            on_rejected,
        )))
    }

    pub fn promise_catch(&mut self, target: &Value, on_rejected: Option<Value>) -> Result<Value> {
        self.promise_then(target, None, on_rejected)
    }

    /// Runs `callback` once the target settles, without observing the outcome,
    /// then passes the original outcome through. A fault in the callback, or a
    /// rejecting thenable it returns, supersedes the original outcome.
    pub fn promise_finally(&mut self, target: &Value, callback: Option<Value>) -> Result<Value> {
        let promise = Self::promise_from_value(target)?;
        let callback = callback.filter(Value::is_callable);
        let result = self.new_pending_promise();
        self.promise_add_reaction(
            &promise,
            PromiseReactionKind::Finally {
                callback,
                result: result.clone(),
            },
        );
        Ok(Value::Promise(result))
    }

    /// Promise-typed values pass through unchanged; anything else is wrapped
    /// via the resolution procedure (thenables are adopted).
    pub fn promise_resolve_with(&mut self, value: Value) -> Result<Value> {
        if let Value::Promise(promise) = value {
            return Ok(Value::Promise(promise));
        }
        let promise = self.new_pending_promise();
        self.promise_resolve(&promise, value)?;
        Ok(Value::Promise(promise))
    }

    pub fn promise_reject_with(&mut self, reason: Value) -> Value {
        let promise = self.new_pending_promise();
        self.promise_reject(&promise, reason);
        Value::Promise(promise)
    }

    /// Runs `callback` immediately, capturing its return value or fault into
    /// a promise.
    pub fn promise_try(&mut self, callback: &Value, args: &[Value]) -> Result<Value> {
        if !callback.is_callable() {
            return Err(Error::Runtime(
                "promise try callback must be a function".into(),
            ));
        }
        let promise = self.new_pending_promise();
        match self.call_function(callback, args) {
            Ok(value) => {
                self.promise_resolve(&promise, value)?;
            }
            Err(err) => {
                self.promise_reject(&promise, Self::promise_error_reason(err));
            }
        }
        Ok(Value::Promise(promise))
    }

    pub fn promise_state_name(&self, target: &Value) -> Result<&'static str> {
        let promise = Self::promise_from_value(target)?;
        let name = match &promise.borrow().state {
            PromiseState::Pending => "pending",
            PromiseState::Fulfilled(_) => "fulfilled",
            PromiseState::Rejected(_) => "rejected",
        };
        Ok(name)
    }

    /// Settled outcome of the target, or `None` while it is still pending.
    pub fn promise_settled_value(&self, target: &Value) -> Result<Option<PromiseSettledValue>> {
        let promise = Self::promise_from_value(target)?;
        let settled = match &promise.borrow().state {
            PromiseState::Pending => None,
            PromiseState::Fulfilled(value) => Some(PromiseSettledValue::Fulfilled(value.clone())),
            PromiseState::Rejected(reason) => Some(PromiseSettledValue::Rejected(reason.clone())),
        };
        Ok(settled)
    }

    pub(crate) fn promise_from_value(value: &Value) -> Result<Rc<RefCell<PromiseValue>>> {
        let Value::Promise(promise) = value else {
            return Err(Error::Runtime(format!(
                "promise method target must be a promise, got: {}",
                value.as_string()
            )));
        };
        Ok(promise.clone())
    }
}
