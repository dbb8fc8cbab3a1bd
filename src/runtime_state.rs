use super::*;

#[derive(Debug)]
pub(crate) struct SchedulerState {
    pub(crate) microtask_queue: VecDeque<ScheduledMicrotask>,
    pub(crate) microtask_step_limit: usize,
    pub(crate) task_depth: usize,
}

impl Default for SchedulerState {
    fn default() -> Self {
        Self {
            microtask_queue: VecDeque::new(),
            microtask_step_limit: 10_000,
            task_depth: 0,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum ScheduledMicrotask {
    Callback {
        callback: Value,
    },
    Promise {
        reaction: PromiseReactionKind,
        settled: PromiseSettledValue,
    },
}

#[derive(Debug)]
pub(crate) struct PromiseRuntimeState {
    pub(crate) next_promise_id: usize,
}

impl Default for PromiseRuntimeState {
    fn default() -> Self {
        Self { next_promise_id: 1 }
    }
}

impl PromiseRuntimeState {
    pub(crate) fn allocate_promise_id(&mut self) -> usize {
        let id = self.next_promise_id;
        self.next_promise_id = self.next_promise_id.saturating_add(1);
        id
    }
}
