use super::*;

impl Runtime {
    /// Fulfills with every result in input order, or rejects with the first
    /// rejection. An empty input fulfills immediately with an empty array.
    pub fn promise_all(&mut self, values: Vec<Value>) -> Result<Value> {
        let result = self.new_pending_promise();
        if values.is_empty() {
            self.promise_fulfill(&result, Self::new_array_value(Vec::new()));
            return Ok(Value::Promise(result));
        }

        let state = Rc::new(RefCell::new(PromiseAllState {
            result: result.clone(),
            remaining: values.len(),
            values: vec![None; values.len()],
            settled: false,
        }));

        for (index, value) in values.into_iter().enumerate() {
            let promise = self.promise_resolve_value_as_promise(value)?;
            self.promise_add_reaction(
                &promise,
                PromiseReactionKind::All {
                    state: state.clone(),
                    index,
                },
            );
        }

        Ok(Value::Promise(result))
    }

    /// Fulfills with a `{status, value|reason}` record per item once every
    /// item has settled.
    pub fn promise_all_settled(&mut self, values: Vec<Value>) -> Result<Value> {
        let result = self.new_pending_promise();
        if values.is_empty() {
            self.promise_fulfill(&result, Self::new_array_value(Vec::new()));
            return Ok(Value::Promise(result));
        }

        let state = Rc::new(RefCell::new(PromiseAllSettledState {
            result: result.clone(),
            remaining: values.len(),
            values: vec![None; values.len()],
        }));

        for (index, value) in values.into_iter().enumerate() {
            let promise = self.promise_resolve_value_as_promise(value)?;
            self.promise_add_reaction(
                &promise,
                PromiseReactionKind::AllSettled {
                    state: state.clone(),
                    index,
                },
            );
        }

        Ok(Value::Promise(result))
    }

    /// Fulfills with the first fulfillment; rejects with an AggregateError
    /// record if every item rejects. An empty input rejects immediately.
    pub fn promise_any(&mut self, values: Vec<Value>) -> Result<Value> {
        let result = self.new_pending_promise();
        if values.is_empty() {
            self.promise_reject(&result, Self::new_aggregate_error_value(Vec::new()));
            return Ok(Value::Promise(result));
        }

        let state = Rc::new(RefCell::new(PromiseAnyState {
            result: result.clone(),
            remaining: values.len(),
            reasons: vec![None; values.len()],
            settled: false,
        }));

        for (index, value) in values.into_iter().enumerate() {
            let promise = self.promise_resolve_value_as_promise(value)?;
            self.promise_add_reaction(
                &promise,
                PromiseReactionKind::Any {
                    state: state.clone(),
                    index,
                },
            );
        }

        Ok(Value::Promise(result))
    }

    /// Settles with the outcome of whichever item settles first. An empty
    /// input never settles.
    pub fn promise_race(&mut self, values: Vec<Value>) -> Result<Value> {
        let result = self.new_pending_promise();
        if values.is_empty() {
            return Ok(Value::Promise(result));
        }

        let state = Rc::new(RefCell::new(PromiseRaceState {
            result: result.clone(),
            settled: false,
        }));

        for value in values {
            let promise = self.promise_resolve_value_as_promise(value)?;
            self.promise_add_reaction(
                &promise,
                PromiseReactionKind::Race {
                    state: state.clone(),
                },
            );
        }

        Ok(Value::Promise(result))
    }

    pub(crate) fn new_aggregate_error_value(reasons: Vec<Value>) -> Value {
        Self::new_object_value(vec![
            ("name".into(), Value::String("AggregateError".into())),
            (
                "message".into(),
                Value::String("All promises were rejected".into()),
            ),
            ("errors".into(), Self::new_array_value(reasons)),
        ])
    }

    pub(crate) fn run_promise_all_reaction(
        &mut self,
        state: &Rc<RefCell<PromiseAllState>>,
        index: usize,
        settled: PromiseSettledValue,
    ) {
        let mut state_ref = state.borrow_mut();
        if state_ref.settled {
            return;
        }
        match settled {
            PromiseSettledValue::Fulfilled(value) => {
                if state_ref.values[index].is_none() {
                    state_ref.values[index] = Some(value);
                    state_ref.remaining = state_ref.remaining.saturating_sub(1);
                }
                if state_ref.remaining == 0 {
                    state_ref.settled = true;
                    let result = state_ref.result.clone();
                    let values = state_ref
                        .values
                        .iter()
                        .map(|value| value.clone().unwrap_or(Value::Undefined))
                        .collect::<Vec<_>>();
                    drop(state_ref);
                    self.promise_fulfill(&result, Self::new_array_value(values));
                }
            }
            PromiseSettledValue::Rejected(reason) => {
                state_ref.settled = true;
                let result = state_ref.result.clone();
                drop(state_ref);
                self.promise_reject(&result, reason);
            }
        }
    }

    pub(crate) fn run_promise_all_settled_reaction(
        &mut self,
        state: &Rc<RefCell<PromiseAllSettledState>>,
        index: usize,
        settled: PromiseSettledValue,
    ) {
        let mut state_ref = state.borrow_mut();
        if state_ref.remaining == 0 {
            return;
        }
        if state_ref.values[index].is_none() {
            let entry = match settled {
                PromiseSettledValue::Fulfilled(value) => Self::new_object_value(vec![
                    ("status".into(), Value::String("fulfilled".into())),
                    ("value".into(), value),
                ]),
                PromiseSettledValue::Rejected(reason) => Self::new_object_value(vec![
                    ("status".into(), Value::String("rejected".into())),
                    ("reason".into(), reason),
                ]),
            };
            state_ref.values[index] = Some(entry);
            state_ref.remaining = state_ref.remaining.saturating_sub(1);
        }
        if state_ref.remaining == 0 {
            let result = state_ref.result.clone();
            let values = state_ref
                .values
                .iter()
                .map(|value| value.clone().unwrap_or(Value::Undefined))
                .collect::<Vec<_>>();
            drop(state_ref);
            self.promise_fulfill(&result, Self::new_array_value(values));
        }
    }

    pub(crate) fn run_promise_any_reaction(
        &mut self,
        state: &Rc<RefCell<PromiseAnyState>>,
        index: usize,
        settled: PromiseSettledValue,
    ) {
        let mut state_ref = state.borrow_mut();
        if state_ref.settled {
            return;
        }
        match settled {
            PromiseSettledValue::Fulfilled(value) => {
                state_ref.settled = true;
                let result = state_ref.result.clone();
                drop(state_ref);
                self.promise_fulfill(&result, value);
            }
            PromiseSettledValue::Rejected(reason) => {
                if state_ref.reasons[index].is_none() {
                    state_ref.reasons[index] = Some(reason);
                    state_ref.remaining = state_ref.remaining.saturating_sub(1);
                }
                if state_ref.remaining == 0 {
                    state_ref.settled = true;
                    let result = state_ref.result.clone();
                    let reasons = state_ref
                        .reasons
                        .iter()
                        .map(|reason| reason.clone().unwrap_or(Value::Undefined))
                        .collect::<Vec<_>>();
                    drop(state_ref);
                    self.promise_reject(&result, Self::new_aggregate_error_value(reasons));
                }
            }
        }
    }

    pub(crate) fn run_promise_race_reaction(
        &mut self,
        state: &Rc<RefCell<PromiseRaceState>>,
        settled: PromiseSettledValue,
    ) {
        let mut state_ref = state.borrow_mut();
        if state_ref.settled {
            return;
        }
        state_ref.settled = true;
        let result = state_ref.result.clone();
        drop(state_ref);
        match settled {
            PromiseSettledValue::Fulfilled(value) => self.promise_fulfill(&result, value),
            PromiseSettledValue::Rejected(reason) => self.promise_reject(&result, reason),
        }
    }
}
