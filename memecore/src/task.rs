//! One-shot background work polled from the UI thread

use std::sync::mpsc::{self, Receiver, TryRecvError};

#[derive(Debug, PartialEq, Eq)]
pub enum TaskState<T> {
    Running,
    Done(T),
    /// The worker panicked or dropped its sender.
    Lost,
}

pub struct Task<T> {
    rx: Receiver<T>,
}

impl<T: Send + 'static> Task<T> {
    pub fn spawn(work: impl FnOnce() -> T + Send + 'static) -> Self {
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(work());
        });
        Self { rx }
    }

    pub fn poll(&self) -> TaskState<T> {
        match self.rx.try_recv() {
            Ok(value) => TaskState::Done(value),
            Err(TryRecvError::Empty) => TaskState::Running,
            Err(TryRecvError::Disconnected) => TaskState::Lost,
        }
    }

    /// Block for the result. `None` if the worker died.
    pub fn wait(self) -> Option<T> {
        self.rx.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_result() {
        let task = Task::spawn(|| 6 * 7);
        assert_eq!(task.wait(), Some(42));
    }

    #[test]
    fn test_panicking_task_is_lost() {
        let task: Task<u8> = Task::spawn(|| panic!("boom"));
        assert_eq!(task.wait(), None);
    }
}
