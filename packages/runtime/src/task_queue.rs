//! Cooperative task queue.
//!
//! Engines park their asynchronous work here and advance it from
//! [`Engine::drive_pending`](crate::Engine::drive_pending). Nothing runs
//! between calls to [`TaskQueue::drive`].

use std::future::Future;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::task::noop_waker_ref;
use futures::FutureExt;
use tokio::sync::mpsc;

/// Submits futures to a [`TaskQueue`] from anywhere.
#[derive(Clone)]
pub struct TaskSender {
    tx: mpsc::UnboundedSender<BoxFuture<'static, ()>>,
}

impl TaskSender {
    /// Queue `task`. Returns `false` if the queue is gone.
    pub fn spawn<F>(&self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tx.send(task.boxed()).is_ok()
    }
}

pub struct TaskQueue {
    tasks: FuturesUnordered<BoxFuture<'static, ()>>,
    incoming: mpsc::UnboundedReceiver<BoxFuture<'static, ()>>,
    sender: TaskSender,
}

impl TaskQueue {
    pub fn new() -> Self {
        let (tx, incoming) = mpsc::unbounded_channel();
        Self {
            tasks: FuturesUnordered::new(),
            incoming,
            sender: TaskSender { tx },
        }
    }

    pub fn sender(&self) -> TaskSender {
        self.sender.clone()
    }

    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.push(task.boxed());
    }

    /// Tasks not yet completed, including submitted ones not yet polled.
    pub fn len(&self) -> usize {
        self.tasks.len() + self.incoming.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Poll every task that can make progress, once, without waiting.
    /// Returns the number of tasks that completed.
    pub fn drive(&mut self) -> usize {
        while let Ok(task) = self.incoming.try_recv() {
            self.tasks.push(task);
        }

        let mut cx = Context::from_waker(noop_waker_ref());
        let mut completed = 0;
        while let Poll::Ready(Some(())) = self.tasks.poll_next_unpin(&mut cx) {
            completed += 1;
        }
        completed
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::sync::oneshot;

    #[test]
    fn ready_tasks_complete_in_one_drive() {
        let mut queue = TaskQueue::new();
        let hits = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let hits = hits.clone();
            queue.spawn(async move {
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(queue.len(), 3);
        assert_eq!(queue.drive(), 3);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert!(queue.is_empty());
        assert_eq!(queue.drive(), 0);
    }

    #[test]
    fn blocked_tasks_wait_for_a_later_drive() {
        let mut queue = TaskQueue::new();
        let (tx, rx) = oneshot::channel::<u32>();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_by_task = seen.clone();
        queue.spawn(async move {
            if let Ok(v) = rx.await {
                seen_by_task.store(v as usize, Ordering::SeqCst);
            }
        });

        assert_eq!(queue.drive(), 0);
        assert_eq!(queue.len(), 1);

        tx.send(42).unwrap();
        assert_eq!(queue.drive(), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn sender_submissions_run_on_next_drive() {
        let mut queue = TaskQueue::new();
        let sender = queue.sender();
        let hits = Arc::new(AtomicUsize::new(0));
        let task_hits = hits.clone();
        assert!(sender.spawn(async move {
            task_hits.fetch_add(1, Ordering::SeqCst);
        }));

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.drive(), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
