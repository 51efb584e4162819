pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs blocking work (network calls) off the view's thread. Results travel back to the
/// view as messages, never by touching view state.
pub trait TaskRunner {
    fn spawn(&self, task: Task);
}

/// Runs tasks on the global rayon pool.
#[derive(Debug, Default, Clone, Copy)]
pub struct RayonTaskRunner;

impl TaskRunner for RayonTaskRunner {
    fn spawn(&self, task: Task) {
        rayon::spawn(task);
    }
}

/// Queues tasks until the test runs them, which makes "in flight" observable.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct ManualTaskRunner {
    queue: std::sync::Arc<std::sync::Mutex<std::collections::VecDeque<Task>>>,
}

#[cfg(test)]
impl ManualTaskRunner {
    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// Run queued tasks, including any they queue themselves. Returns how many ran.
    pub fn run_all(&self) -> usize {
        let mut ran = 0;
        loop {
            let task = self.queue.lock().unwrap().pop_front();
            match task {
                Some(task) => {
                    task();
                    ran += 1;
                }
                None => return ran,
            }
        }
    }
}

#[cfg(test)]
impl TaskRunner for ManualTaskRunner {
    fn spawn(&self, task: Task) {
        self.queue.lock().unwrap().push_back(task);
    }
}
