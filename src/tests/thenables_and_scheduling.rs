use super::*;

#[test]
fn thenable_with_callable_then_is_adopted() -> Result<()> {
    let mut runtime = Runtime::new();
    let then = Runtime::native_function(|runtime, args| {
        let resolve = args.first().cloned().unwrap_or(Value::Undefined);
        runtime.call_function(&resolve, &[Value::Number(7)])?;
        Ok(Value::Undefined)
    });
    let thenable = Runtime::new_object_value(vec![("then".into(), then)]);
    let promise = runtime.promise_resolve_with(thenable)?;

    assert_eq!(
        runtime.promise_settled_value(&promise)?,
        Some(PromiseSettledValue::Fulfilled(Value::Number(7)))
    );
    Ok(())
}

#[test]
fn thenable_first_capability_call_wins() -> Result<()> {
    let mut runtime = Runtime::new();
    let then = Runtime::native_function(|runtime, args| {
        let resolve = args.first().cloned().unwrap_or(Value::Undefined);
        let reject = args.get(1).cloned().unwrap_or(Value::Undefined);
        runtime.call_function(&resolve, &[Value::Number(1)])?;
        runtime.call_function(&reject, &[Value::String("nope".into())])?;
        Ok(Value::Undefined)
    });
    let thenable = Runtime::new_object_value(vec![("then".into(), then)]);
    let promise = runtime.promise_resolve_with(thenable)?;

    assert_eq!(
        runtime.promise_settled_value(&promise)?,
        Some(PromiseSettledValue::Fulfilled(Value::Number(1)))
    );
    Ok(())
}

#[test]
fn thenable_fault_after_settlement_is_ignored() -> Result<()> {
    let mut runtime = Runtime::new();
    let then = Runtime::native_function(|runtime, args| {
        let resolve = args.first().cloned().unwrap_or(Value::Undefined);
        runtime.call_function(&resolve, &[Value::Number(1)])?;
        Err(Runtime::throw(Value::String("too late".into())))
    });
    let thenable = Runtime::new_object_value(vec![("then".into(), then)]);
    let promise = runtime.promise_resolve_with(thenable)?;

    assert_eq!(
        runtime.promise_settled_value(&promise)?,
        Some(PromiseSettledValue::Fulfilled(Value::Number(1)))
    );
    Ok(())
}

#[test]
fn thenable_fault_before_settlement_rejects() -> Result<()> {
    let mut runtime = Runtime::new();
    let then = Runtime::native_function(|_runtime, _args| {
        Err(Runtime::throw(Value::String("probe failed".into())))
    });
    let thenable = Runtime::new_object_value(vec![("then".into(), then)]);
    let promise = runtime.promise_resolve_with(thenable)?;

    assert_eq!(
        runtime.promise_settled_value(&promise)?,
        Some(PromiseSettledValue::Rejected(Value::String(
            "probe failed".into()
        )))
    );
    Ok(())
}

#[test]
fn handler_returning_a_thenable_is_adopted() -> Result<()> {
    let mut runtime = Runtime::new();
    let promise = runtime.promise_resolve_with(Value::Number(4))?;

    let handler = Runtime::native_function(|_runtime, args| {
        let base = match args.first() {
            Some(Value::Number(value)) => *value,
            _ => 0,
        };
        let then = Runtime::native_function(move |runtime, capability_args| {
            let resolve = capability_args.first().cloned().unwrap_or(Value::Undefined);
            runtime.call_function(&resolve, &[Value::Number(base * 10)])?;
            Ok(Value::Undefined)
        });
        Ok(Runtime::new_object_value(vec![("then".into(), then)]))
    });
    let next = runtime.promise_then(&promise, Some(handler), None)?;
    runtime.run_microtask_queue()?;

    assert_eq!(
        runtime.promise_settled_value(&next)?,
        Some(PromiseSettledValue::Fulfilled(Value::Number(40)))
    );
    Ok(())
}

#[test]
fn object_without_callable_then_fulfills_directly() -> Result<()> {
    let mut runtime = Runtime::new();
    let plain = Runtime::new_object_value(vec![("then".into(), Value::Number(3))]);
    let promise = runtime.promise_resolve_with(plain.clone())?;

    assert_eq!(
        runtime.promise_settled_value(&promise)?,
        Some(PromiseSettledValue::Fulfilled(plain))
    );
    Ok(())
}

#[test]
fn rejection_reason_preserves_thrown_structured_values() -> Result<()> {
    let mut runtime = Runtime::new();
    let reason = Runtime::new_object_value(vec![
        ("name".into(), Value::String("TimeoutError".into())),
        ("message".into(), Value::String("took too long".into())),
    ]);
    let thrown = reason.clone();
    let handler =
        Runtime::native_function(move |_runtime, _args| Err(Runtime::throw(thrown.clone())));

    let promise = runtime.promise_resolve_with(Value::Undefined)?;
    let next = runtime.promise_then(&promise, Some(handler), None)?;
    runtime.run_microtask_queue()?;

    assert_eq!(
        runtime.promise_settled_value(&next)?,
        Some(PromiseSettledValue::Rejected(reason))
    );
    Ok(())
}

#[test]
fn queue_microtask_runs_in_fifo_order() -> Result<()> {
    let mut runtime = Runtime::new();
    let log = Rc::new(RefCell::new(Vec::new()));
    for tag in ["one", "two", "three"] {
        let log = log.clone();
        let tag = tag.to_string();
        runtime.queue_microtask(Runtime::native_function(move |_runtime, _args| {
            log.borrow_mut().push(tag.clone());
            Ok(Value::Undefined)
        }))?;
    }
    runtime.run_microtask_queue()?;

    assert_eq!(
        *log.borrow(),
        vec!["one".to_string(), "two".to_string(), "three".to_string()]
    );
    Ok(())
}

#[test]
fn microtask_queued_during_drain_runs_in_same_drain() -> Result<()> {
    let mut runtime = Runtime::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    let inner_log = log.clone();
    let outer_log = log.clone();
    let outer = Runtime::native_function(move |runtime, _args| {
        outer_log.borrow_mut().push("outer".to_string());
        let inner_log = inner_log.clone();
        runtime.queue_microtask(Runtime::native_function(move |_runtime, _args| {
            inner_log.borrow_mut().push("inner".to_string());
            Ok(Value::Undefined)
        }))?;
        Ok(Value::Undefined)
    });
    runtime.queue_microtask(outer)?;
    let steps = runtime.run_microtask_queue()?;

    assert_eq!(steps, 2);
    assert_eq!(*log.borrow(), vec!["outer".to_string(), "inner".to_string()]);
    Ok(())
}

#[test]
fn queue_microtask_requires_a_callable() {
    let mut runtime = Runtime::new();
    let err = runtime.queue_microtask(Value::Number(1)).unwrap_err();
    assert_eq!(
        err,
        Error::Runtime("queued microtask callback must be a function".into())
    );
}

#[test]
fn microtask_step_limit_reports_runaway_loop() -> Result<()> {
    let mut runtime = Runtime::new();
    runtime.set_microtask_step_limit(16);

    let slot: Rc<RefCell<Option<Value>>> = Rc::new(RefCell::new(None));
    let slot_handle = slot.clone();
    let callback = Runtime::native_function(move |runtime, _args| {
        let requeued = slot_handle
            .borrow()
            .clone()
            .expect("callback slot is filled before the drain");
        runtime.queue_microtask(requeued)?;
        Ok(Value::Undefined)
    });
    *slot.borrow_mut() = Some(callback.clone());

    runtime.queue_microtask(callback)?;
    let err = runtime.run_microtask_queue().unwrap_err();
    match err {
        Error::Runtime(msg) => assert!(msg.contains("microtask step limit exceeded")),
        other => panic!("expected a step limit error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn reentrant_drain_is_rejected() -> Result<()> {
    let mut runtime = Runtime::new();
    let callback = Runtime::native_function(|runtime, _args| {
        let err = runtime.run_microtask_queue().unwrap_err();
        assert_eq!(
            err,
            Error::Runtime("microtask queue is already draining".into())
        );
        Ok(Value::Undefined)
    });
    runtime.queue_microtask(callback)?;
    runtime.run_microtask_queue()?;
    Ok(())
}

#[test]
fn run_until_settled_drives_chains() -> Result<()> {
    let mut runtime = Runtime::new();
    let (promise, resolve, _reject) = runtime.promise_with_resolvers();
    let doubled = runtime.promise_then(&promise, Some(number_handler(|n| n * 2)), None)?;

    runtime.call_function(&resolve, &[Value::Number(21)])?;
    let settled = runtime.run_until_settled(&doubled)?;

    assert_eq!(settled, PromiseSettledValue::Fulfilled(Value::Number(42)));
    Ok(())
}

#[test]
fn run_until_settled_detects_deadlock() {
    let mut runtime = Runtime::new();
    let (promise, _resolve, _reject) = runtime.promise_with_resolvers();
    let err = runtime.run_until_settled(&promise).unwrap_err();
    assert_eq!(
        err,
        Error::Runtime("promise cannot settle: microtask queue is empty".into())
    );
}
