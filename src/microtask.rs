use super::*;

impl Runtime {
    /// Enqueues a plain callable to run on the next drain, after everything
    /// already queued.
    pub fn queue_microtask(&mut self, callback: Value) -> Result<()> {
        if !callback.is_callable() {
            return Err(Error::Runtime(
                "queued microtask callback must be a function".into(),
            ));
        }
        self.scheduler
            .microtask_queue
            .push_back(ScheduledMicrotask::Callback { callback });
        Ok(())
    }

    pub(crate) fn queue_promise_reaction_microtask(
        &mut self,
        reaction: PromiseReactionKind,
        settled: PromiseSettledValue,
    ) {
        self.scheduler
            .microtask_queue
            .push_back(ScheduledMicrotask::Promise { reaction, settled });
    }

    pub fn pending_microtasks(&self) -> usize {
        self.scheduler.microtask_queue.len()
    }

    /// Drains the queue FIFO, including tasks queued while draining, and
    /// returns how many ran. Fails once the step limit is exceeded. Calling
    /// this from inside a running microtask is an error; the outer drain
    /// already covers anything the task queues.
    pub fn run_microtask_queue(&mut self) -> Result<usize> {
        if self.scheduler.task_depth > 0 {
            return Err(Error::Runtime(
                "microtask queue is already draining".into(),
            ));
        }
        self.with_task_depth(|this| {
            let mut steps = 0usize;
            loop {
                let Some(task) = this.scheduler.microtask_queue.pop_front() else {
                    return Ok(steps);
                };
                steps += 1;
                if steps > this.scheduler.microtask_step_limit {
                    return Err(
                        this.microtask_step_limit_error(this.scheduler.microtask_step_limit, steps)
                    );
                }

                match task {
                    ScheduledMicrotask::Callback { callback } => {
                        this.call_function(&callback, &[])?;
                    }
                    ScheduledMicrotask::Promise { reaction, settled } => {
                        this.run_promise_reaction_task(reaction, settled)?;
                    }
                }
            }
        })
    }

    /// Drains microtasks until `target` settles. Fails if the queue empties
    /// while the target is still pending, since nothing else can settle it.
    pub fn run_until_settled(&mut self, target: &Value) -> Result<PromiseSettledValue> {
        loop {
            if let Some(settled) = self.promise_settled_value(target)? {
                return Ok(settled);
            }
            if self.scheduler.microtask_queue.is_empty() {
                return Err(Error::Runtime(
                    "promise cannot settle: microtask queue is empty".into(),
                ));
            }
            self.run_microtask_queue()?;
        }
    }

    fn microtask_step_limit_error(&self, max_steps: usize, steps: usize) -> Error {
        Error::Runtime(format!(
            "microtask step limit exceeded: limit {max_steps}, ran {steps}, still queued {}",
            self.scheduler.microtask_queue.len()
        ))
    }

    fn with_task_depth<T>(&mut self, run: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.scheduler.task_depth += 1;
        let run_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| run(self)));
        self.scheduler.task_depth = self.scheduler.task_depth.saturating_sub(1);
        match run_result {
            Ok(result) => result,
            Err(payload) => std::panic::resume_unwind(payload),
        }
    }
}
