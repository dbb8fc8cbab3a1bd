use super::*;

/// Dynamic payload carried through the promise graph.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(i64),
    String(String),
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<RefCell<ObjectValue>>),
    Function(Rc<NativeFunctionValue>),
    Promise(Rc<RefCell<PromiseValue>>),
    PromiseCapability(Rc<PromiseCapabilityFunction>),
}

impl Value {
    pub fn is_callable(&self) -> bool {
        matches!(self, Self::Function(_) | Self::PromiseCapability(_))
    }

    pub fn as_string(&self) -> String {
        match self {
            Self::Undefined => "undefined".into(),
            Self::Null => "null".into(),
            Self::Bool(v) => {
                if *v {
                    "true".into()
                } else {
                    "false".into()
                }
            }
            Self::Number(v) => v.to_string(),
            Self::String(v) => v.clone(),
            Self::Array(values) => {
                let values = values.borrow();
                let mut out = String::new();
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        out.push(',');
                    }
                    if matches!(value, Value::Null | Value::Undefined) {
                        continue;
                    }
                    out.push_str(&value.as_string());
                }
                out
            }
            Self::Object(entries) => {
                let entries = entries.borrow();
                match (entries.get_entry("name"), entries.get_entry("message")) {
                    (Some(Value::String(name)), Some(Value::String(message))) => {
                        format!("{name}: {message}")
                    }
                    _ => "[object Object]".into(),
                }
            }
            Self::Function(_) | Self::PromiseCapability(_) => "function".into(),
            Self::Promise(promise) => format!("[promise {}]", promise.borrow().id),
        }
    }
}

/// Ordered string-keyed entry list; later writes to an existing key update the
/// entry in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectValue {
    entries: Vec<(String, Value)>,
}

impl ObjectValue {
    pub fn new(entries: Vec<(String, Value)>) -> Self {
        let mut value = Self::default();
        for (key, entry_value) in entries {
            value.set_entry(key, entry_value);
        }
        value
    }

    pub fn get_entry(&self, key: &str) -> Option<Value> {
        self.entries
            .iter()
            .find(|(entry_key, _)| entry_key == key)
            .map(|(_, value)| value.clone())
    }

    pub fn set_entry(&mut self, key: String, value: Value) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|(entry_key, _)| *entry_key == key)
        {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn entries(&self) -> &[(String, Value)] {
        &self.entries
    }
}

/// Host closure callable from the runtime.
pub struct NativeFunctionValue {
    pub(crate) body: Box<dyn Fn(&mut Runtime, &[Value]) -> Result<Value>>,
}

impl fmt::Debug for NativeFunctionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunctionValue").finish_non_exhaustive()
    }
}

impl PartialEq for NativeFunctionValue {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

#[derive(Debug, Clone)]
pub struct PromiseValue {
    pub(crate) id: usize,
    pub(crate) state: PromiseState,
    pub(crate) reactions: Vec<PromiseReaction>,
}

impl PartialEq for PromiseValue {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[derive(Debug, Clone)]
pub(crate) enum PromiseState {
    Pending,
    Fulfilled(Value),
    Rejected(Value),
}

#[derive(Debug, Clone)]
pub(crate) struct PromiseReaction {
    pub(crate) kind: PromiseReactionKind,
}

#[derive(Debug, Clone)]
pub(crate) enum PromiseReactionKind {
    Then {
        on_fulfilled: Option<Value>,
        on_rejected: Option<Value>,
        result: Rc<RefCell<PromiseValue>>,
    },
    Finally {
        callback: Option<Value>,
        result: Rc<RefCell<PromiseValue>>,
    },
    FinallyContinuation {
        original: PromiseSettledValue,
        result: Rc<RefCell<PromiseValue>>,
    },
    ResolveTo {
        target: Rc<RefCell<PromiseValue>>,
    },
    All {
        state: Rc<RefCell<PromiseAllState>>,
        index: usize,
    },
    AllSettled {
        state: Rc<RefCell<PromiseAllSettledState>>,
        index: usize,
    },
    Any {
        state: Rc<RefCell<PromiseAnyState>>,
        index: usize,
    },
    Race {
        state: Rc<RefCell<PromiseRaceState>>,
    },
}

/// Terminal outcome of a promise.
#[derive(Debug, Clone, PartialEq)]
pub enum PromiseSettledValue {
    Fulfilled(Value),
    Rejected(Value),
}

#[derive(Debug, Clone)]
pub(crate) struct PromiseAllState {
    pub(crate) result: Rc<RefCell<PromiseValue>>,
    pub(crate) remaining: usize,
    pub(crate) values: Vec<Option<Value>>,
    pub(crate) settled: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct PromiseAllSettledState {
    pub(crate) result: Rc<RefCell<PromiseValue>>,
    pub(crate) remaining: usize,
    pub(crate) values: Vec<Option<Value>>,
}

#[derive(Debug, Clone)]
pub(crate) struct PromiseAnyState {
    pub(crate) result: Rc<RefCell<PromiseValue>>,
    pub(crate) remaining: usize,
    pub(crate) reasons: Vec<Option<Value>>,
    pub(crate) settled: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct PromiseRaceState {
    pub(crate) result: Rc<RefCell<PromiseValue>>,
    pub(crate) settled: bool,
}

/// First-class settlement capability. The `already_called` flag is shared
/// between the resolve/reject pair so only the first call across both wins.
#[derive(Debug, Clone)]
pub struct PromiseCapabilityFunction {
    pub(crate) promise: Rc<RefCell<PromiseValue>>,
    pub(crate) reject: bool,
    pub(crate) already_called: Rc<RefCell<bool>>,
}

impl PartialEq for PromiseCapabilityFunction {
    fn eq(&self, other: &Self) -> bool {
        self.reject == other.reject
            && self.promise.borrow().id == other.promise.borrow().id
            && Rc::ptr_eq(&self.already_called, &other.already_called)
    }
}
