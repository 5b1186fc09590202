//! Background worker pool for frame decode jobs.
//!
//! Work-stealing deques: jobs land in a global injector, workers keep local
//! queues and steal from each other when idle, so a burst of 30 decode jobs
//! spreads across cores without lock contention.

use crossbeam::deque::{Injector, Stealer, Worker};
use log::trace;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Shared worker pool. Jobs are fire-and-forget closures; results travel
/// back through whatever channel the submitter baked into the closure.
pub struct Workers {
    injector: Arc<Injector<Job>>,
    handles: Vec<thread::JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl Workers {
    /// Spawn `num_threads` workers. Recommended: `num_cpus::get() * 3 / 4`
    /// (leave headroom for the UI thread).
    pub fn new(num_threads: usize) -> Self {
        let num_threads = num_threads.max(1);
        let injector: Arc<Injector<Job>> = Arc::new(Injector::new());
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut locals: Vec<Worker<Job>> = Vec::new();
        let mut stealers: Vec<Stealer<Job>> = Vec::new();
        for _ in 0..num_threads {
            let w: Worker<Job> = Worker::new_fifo();
            stealers.push(w.stealer());
            locals.push(w);
        }

        let mut handles = Vec::new();
        for (worker_id, local) in locals.into_iter().enumerate() {
            let injector = Arc::clone(&injector);
            let shutdown = Arc::clone(&shutdown);
            let stealers = stealers.clone();

            let handle = thread::Builder::new()
                .name(format!("peak-worker-{}", worker_id))
                .spawn(move || {
                    trace!("Worker {} started", worker_id);
                    loop {
                        if let Some(job) = local.pop() {
                            job();
                            continue;
                        }
                        if let Some(job) = injector.steal().success() {
                            job();
                            continue;
                        }
                        let mut stole = false;
                        for stealer in &stealers {
                            if let Some(job) = stealer.steal().success() {
                                job();
                                stole = true;
                                break;
                            }
                        }
                        if stole {
                            continue;
                        }
                        if shutdown.load(Ordering::Relaxed) {
                            break;
                        }
                        // Idle: short sleep instead of spinning.
                        thread::sleep(std::time::Duration::from_millis(1));
                    }
                    trace!("Worker {} stopped", worker_id);
                })
                .expect("Failed to spawn worker thread");

            handles.push(handle);
        }

        trace!("Workers initialized: {} threads", num_threads);
        Self { injector, handles, shutdown }
    }

    /// Enqueue a job. Runs asynchronously on some worker, no return value.
    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.injector.push(Box::new(f));
    }

    pub fn thread_count(&self) -> usize {
        self.handles.len()
    }
}

impl Drop for Workers {
    fn drop(&mut self) {
        use std::time::{Duration, Instant};

        self.shutdown.store(true, Ordering::SeqCst);

        // Bounded wait: workers finish their current job and see the flag.
        let deadline = Instant::now() + Duration::from_millis(500);
        for handle in std::mem::take(&mut self.handles) {
            while !handle.is_finished() {
                if Instant::now() >= deadline {
                    trace!("Worker shutdown timeout, detaching");
                    return;
                }
                thread::sleep(Duration::from_millis(1));
            }
            let _ = handle.join();
        }
    }
}
