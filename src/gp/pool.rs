//! A fixed-size worker pool with ticketed results and poll timeouts.
//!
//! Submitters get a ticket per job and poll for `(ticket, result)` pairs
//! with a timeout. A poll that times out simply returns `None`; the job
//! keeps running and its result is delivered to a later poll, where the
//! caller can match or ignore it by ticket. Slow work is abandoned,
//! never joined.

use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

type Job<R> = Box<dyn FnOnce() -> R + Send + 'static>;

/// Fixed pool of worker threads processing boxed jobs.
pub struct TaskPool<R: Send + 'static> {
    job_tx: Option<Sender<(u64, Job<R>)>>,
    result_rx: Receiver<(u64, R)>,
    workers: Vec<JoinHandle<()>>,
    next_ticket: u64,
    in_flight: usize,
    capacity: usize,
}

impl<R: Send + 'static> TaskPool<R> {
    /// Spawns `threads` workers. Admission is bounded at two jobs per
    /// worker; check [`TaskPool::has_capacity`] before submitting.
    #[must_use]
    pub fn new(threads: usize) -> Self {
        let threads = threads.max(1);
        let (job_tx, job_rx) = mpsc::channel::<(u64, Job<R>)>();
        let (result_tx, result_rx) = mpsc::channel();
        let job_rx = Arc::new(Mutex::new(job_rx));

        let workers = (0..threads)
            .map(|_| {
                let rx = Arc::clone(&job_rx);
                let tx = result_tx.clone();
                std::thread::spawn(move || loop {
                    let job = {
                        let Ok(guard) = rx.lock() else { return };
                        guard.recv()
                    };
                    match job {
                        Ok((ticket, work)) => {
                            // a dead submitter just means nobody polls
                            let _ = tx.send((ticket, work()));
                        }
                        Err(_) => return,
                    }
                })
            })
            .collect();

        Self {
            job_tx: Some(job_tx),
            result_rx,
            workers,
            next_ticket: 0,
            in_flight: 0,
            capacity: threads * 2,
        }
    }

    /// Whether another job may be submitted right now.
    #[must_use]
    pub fn has_capacity(&self) -> bool {
        self.in_flight < self.capacity
    }

    /// Jobs submitted but not yet polled out.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Submits a job and returns its ticket.
    pub fn submit(&mut self, job: impl FnOnce() -> R + Send + 'static) -> u64 {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.in_flight += 1;
        if let Some(tx) = &self.job_tx {
            // workers only die when the pool drops, so this cannot fail
            // while we hold the sender
            let _ = tx.send((ticket, Box::new(job)));
        }
        ticket
    }

    /// Waits up to `timeout` for one finished job. `None` means nothing
    /// finished in time; the pending jobs are unaffected.
    pub fn poll(&mut self, timeout: Duration) -> Option<(u64, R)> {
        match self.result_rx.recv_timeout(timeout) {
            Ok(pair) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                Some(pair)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Drains every already-finished result without blocking.
    pub fn drain_ready(&mut self) -> VecDeque<(u64, R)> {
        let mut out = VecDeque::new();
        while let Ok(pair) = self.result_rx.try_recv() {
            self.in_flight = self.in_flight.saturating_sub(1);
            out.push_back(pair);
        }
        out
    }
}

impl<R: Send + 'static> Drop for TaskPool<R> {
    fn drop(&mut self) {
        self.job_tx.take();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

impl<R: Send + 'static> std::fmt::Debug for TaskPool<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskPool")
            .field("workers", &self.workers.len())
            .field("in_flight", &self.in_flight)
            .field("capacity", &self.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn results_come_back_with_their_tickets() {
        let mut pool: TaskPool<u64> = TaskPool::new(2);
        let t1 = pool.submit(|| 10);
        let t2 = pool.submit(|| 20);
        let mut seen = std::collections::HashMap::new();
        for _ in 0..2 {
            let (ticket, value) = pool
                .poll(Duration::from_secs(5))
                .expect("job should finish quickly");
            seen.insert(ticket, value);
        }
        assert_eq!(seen.get(&t1), Some(&10));
        assert_eq!(seen.get(&t2), Some(&20));
        assert_eq!(pool.in_flight(), 0);
    }

    #[test]
    fn slow_jobs_time_out_without_being_lost() {
        let mut pool: TaskPool<u8> = TaskPool::new(1);
        let ticket = pool.submit(|| {
            std::thread::sleep(Duration::from_millis(100));
            7
        });
        assert!(pool.poll(Duration::from_millis(1)).is_none());
        let (late_ticket, value) = pool
            .poll(Duration::from_secs(5))
            .expect("late result still arrives");
        assert_eq!(late_ticket, ticket);
        assert_eq!(value, 7);
    }

    #[test]
    fn capacity_is_two_per_worker() {
        let mut pool: TaskPool<()> = TaskPool::new(2);
        for _ in 0..4 {
            assert!(pool.has_capacity());
            pool.submit(|| std::thread::sleep(Duration::from_millis(20)));
        }
        assert!(!pool.has_capacity());
        while pool.in_flight() > 0 {
            let _ = pool.poll(Duration::from_secs(5));
        }
        assert!(pool.has_capacity());
    }
}
