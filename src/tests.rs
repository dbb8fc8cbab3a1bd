use super::*;

mod thenables_and_scheduling;

fn recording_handler(log: &Rc<RefCell<Vec<String>>>, tag: &str) -> Value {
    let log = log.clone();
    let tag = tag.to_string();
    Runtime::native_function(move |_runtime, args| {
        let argument = args.first().cloned().unwrap_or(Value::Undefined);
        log.borrow_mut().push(format!("{tag}:{}", argument.as_string()));
        Ok(argument)
    })
}

fn throwing_handler(reason: &str) -> Value {
    let reason = reason.to_string();
    Runtime::native_function(move |_runtime, _args| {
        Err(Runtime::throw(Value::String(reason.clone())))
    })
}

fn number_handler(f: impl Fn(i64) -> i64 + 'static) -> Value {
    Runtime::native_function(move |_runtime, args| match args.first() {
        Some(Value::Number(value)) => Ok(Value::Number(f(*value))),
        other => Err(Runtime::throw(Value::String(format!(
            "expected a number argument, got {other:?}"
        )))),
    })
}

#[test]
fn resolve_then_chain_fulfills() -> Result<()> {
    let mut runtime = Runtime::new();
    let one = runtime.promise_resolve_with(Value::Number(1))?;
    let plus = runtime.promise_then(&one, Some(number_handler(|n| n + 1)), None)?;
    let doubled = runtime.promise_then(&plus, Some(number_handler(|n| n * 2)), None)?;

    assert_eq!(runtime.promise_state_name(&doubled)?, "pending");
    runtime.run_microtask_queue()?;
    assert_eq!(
        runtime.promise_settled_value(&doubled)?,
        Some(PromiseSettledValue::Fulfilled(Value::Number(4)))
    );
    Ok(())
}

#[test]
fn executor_settles_through_capabilities() -> Result<()> {
    let mut runtime = Runtime::new();
    let executor = Runtime::native_function(|runtime, args| {
        let resolve = args.first().cloned().unwrap_or(Value::Undefined);
        runtime.call_function(&resolve, &[Value::Number(42)])?;
        Ok(Value::Undefined)
    });
    let promise = runtime.promise_new(&executor)?;

    assert_eq!(
        runtime.promise_settled_value(&promise)?,
        Some(PromiseSettledValue::Fulfilled(Value::Number(42)))
    );
    Ok(())
}

#[test]
fn promise_new_requires_a_callable_executor() {
    let mut runtime = Runtime::new();
    let err = runtime.promise_new(&Value::Number(7)).unwrap_err();
    assert_eq!(
        err,
        Error::Runtime("promise executor must be a function".into())
    );
}
