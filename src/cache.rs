//! Per-stage frame cache and loader.
//!
//! Write-once semantics: the first request for a stage fans `frame_count`
//! decode jobs out to the worker pool and publishes the finished sequence;
//! entries are never evicted (five stages bound the cache for the session).
//! A second request while a stage is still in flight joins the existing load
//! instead of issuing duplicate fetches - the slot map tracks an in-flight
//! marker, not just presence after completion.
//!
//! Progress is reported over a channel after every individual image settles,
//! success or failure alike; a failed decode settles as a placeholder frame
//! so the batch always completes. Background preload chains stages strictly
//! in order so foreground loads are never starved by prefetch.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use crossbeam_channel::{Receiver, Sender, unbounded};
use log::{debug, info};

use crate::config::frame_path;
use crate::frame::{FrameFetcher, fetch_or_placeholder};
use crate::sequence::Sequence;
use crate::stage::Stage;
use crate::workers::Workers;

/// Cache -> UI notifications.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CacheEvent {
    /// One more image settled for `stage` (loaded or placeholder).
    Progress { stage: Stage, settled: usize, total: usize },
    /// The full sequence for `stage` is published.
    StageReady { stage: Stage },
}

/// Outcome of a non-blocking `request`.
#[derive(Debug, Clone)]
pub enum LoadState {
    Ready(Arc<Sequence>),
    Loading,
}

/// Tracks one stage load from first enqueue to publication.
struct InFlight {
    total: usize,
    results: Mutex<Vec<Option<crate::frame::Frame>>>,
    settled: AtomicUsize,
    done: Mutex<bool>,
    cond: Condvar,
}

impl InFlight {
    fn new(total: usize) -> Self {
        Self {
            total,
            results: Mutex::new(vec![None; total]),
            settled: AtomicUsize::new(0),
            done: Mutex::new(false),
            cond: Condvar::new(),
        }
    }

    fn mark_done(&self) {
        *self.done.lock().expect("lock") = true;
        self.cond.notify_all();
    }

    fn wait_done(&self) {
        let mut done = self.done.lock().expect("lock");
        while !*done {
            done = self.cond.wait(done).expect("lock");
        }
    }
}

enum Slot {
    Loading(Arc<InFlight>),
    Ready(Arc<Sequence>),
}

/// Session-scoped frame cache. Shared between the UI thread, the worker pool
/// and the preload thread; the slot map is the only synchronized state.
pub struct FrameCache {
    root: PathBuf,
    ext: String,
    fetcher: Arc<dyn FrameFetcher>,
    workers: Arc<Workers>,
    slots: Arc<Mutex<HashMap<Stage, Slot>>>,
    events: Sender<CacheEvent>,
}

impl FrameCache {
    /// Create the cache and the receiving end of its notification channel.
    pub fn new(
        root: PathBuf,
        ext: impl Into<String>,
        fetcher: Arc<dyn FrameFetcher>,
        workers: Arc<Workers>,
    ) -> (Arc<Self>, Receiver<CacheEvent>) {
        let (tx, rx) = unbounded();
        let cache = Arc::new(Self {
            root,
            ext: ext.into(),
            fetcher,
            workers,
            slots: Arc::new(Mutex::new(HashMap::new())),
            events: tx,
        });
        (cache, rx)
    }

    /// Idempotent, non-blocking load. Returns `None` for the terminal stage,
    /// which has no sequence.
    ///
    /// Cached stages come back immediately and re-report complete progress;
    /// in-flight stages are joined without new fetches; unseen stages get
    /// their decode jobs enqueued.
    pub fn request(&self, stage: Stage) -> Option<LoadState> {
        let cfg = stage.config()?;
        let total = cfg.frame_count;

        let inflight = {
            let mut slots = self.slots.lock().expect("lock");
            match slots.get(&stage) {
                Some(Slot::Ready(seq)) => {
                    let _ = self.events.send(CacheEvent::Progress { stage, settled: total, total });
                    return Some(LoadState::Ready(Arc::clone(seq)));
                }
                Some(Slot::Loading(_)) => return Some(LoadState::Loading),
                None => {
                    let inflight = Arc::new(InFlight::new(total));
                    slots.insert(stage, Slot::Loading(Arc::clone(&inflight)));
                    inflight
                }
            }
        };

        info!("Loading stage {} ({} frames)", stage.index(), total);

        for i in 0..total {
            let path = frame_path(&self.root, cfg, i, &self.ext);
            let fetcher = Arc::clone(&self.fetcher);
            let inflight = Arc::clone(&inflight);
            let slots = Arc::clone(&self.slots);
            let events = self.events.clone();

            self.workers.execute(move || {
                let frame = fetch_or_placeholder(&*fetcher, &path);
                inflight.results.lock().expect("lock")[i] = Some(frame);

                let settled = inflight.settled.fetch_add(1, Ordering::SeqCst) + 1;
                let _ = events.send(CacheEvent::Progress { stage, settled, total: inflight.total });

                if settled == inflight.total {
                    let frames = inflight
                        .results
                        .lock()
                        .expect("lock")
                        .iter_mut()
                        .map(|f| f.take().expect("settled frame present"))
                        .collect();
                    let seq = Arc::new(Sequence::new(stage, frames));
                    debug!(
                        "Stage {} ready ({}/{} frames decoded)",
                        stage.index(),
                        seq.loaded_count(),
                        seq.len()
                    );
                    slots.lock().expect("lock").insert(stage, Slot::Ready(seq));
                    // Publish before waking waiters so a caller returning from
                    // `wait` observes both the slot and the notification.
                    let _ = events.send(CacheEvent::StageReady { stage });
                    inflight.mark_done();
                }
            });
        }

        Some(LoadState::Loading)
    }

    /// Cached sequence, if published.
    pub fn get(&self, stage: Stage) -> Option<Arc<Sequence>> {
        match self.slots.lock().expect("lock").get(&stage) {
            Some(Slot::Ready(seq)) => Some(Arc::clone(seq)),
            _ => None,
        }
    }

    /// `request` + block the caller until every image for `stage` settled.
    pub fn wait(&self, stage: Stage) -> Option<Arc<Sequence>> {
        match self.request(stage)? {
            LoadState::Ready(seq) => Some(seq),
            LoadState::Loading => {
                let inflight = {
                    let slots = self.slots.lock().expect("lock");
                    match slots.get(&stage) {
                        Some(Slot::Loading(inflight)) => Arc::clone(inflight),
                        // Published between request() and here.
                        Some(Slot::Ready(seq)) => return Some(Arc::clone(seq)),
                        None => return None,
                    }
                };
                inflight.wait_done();
                self.get(stage)
            }
        }
    }

    /// Fraction of `stage` that has settled: 0.0 before any request, 1.0 once
    /// ready (and for the sequence-less terminal stage).
    pub fn progress(&self, stage: Stage) -> f32 {
        if stage.config().is_none() {
            return 1.0;
        }
        match self.slots.lock().expect("lock").get(&stage) {
            Some(Slot::Ready(_)) => 1.0,
            Some(Slot::Loading(inflight)) => {
                inflight.settled.load(Ordering::SeqCst) as f32 / inflight.total as f32
            }
            None => 0.0,
        }
    }

    /// Load `stages` in the background, strictly serialized: stage N+1 is not
    /// requested until stage N has fully settled. Cached stages short-circuit.
    pub fn preload_all(self: &Arc<Self>, stages: Vec<Stage>) -> thread::JoinHandle<()> {
        let cache = Arc::clone(self);
        thread::Builder::new()
            .name("peak-preload".into())
            .spawn(move || {
                for stage in stages {
                    if cache.get(stage).is_some() {
                        continue;
                    }
                    debug!("Preloading stage {}", stage.index());
                    cache.wait(stage);
                }
                info!("Background preload complete");
            })
            .expect("Failed to spawn preload thread")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameError;
    use image::{Rgba, RgbaImage};
    use std::path::Path;

    /// Counts fetches per path and records their order; fails requested
    /// file names.
    struct TestFetcher {
        calls: Mutex<Vec<PathBuf>>,
        fail_names: Vec<String>,
        delay_ms: u64,
    }

    impl TestFetcher {
        fn new() -> Self {
            Self { calls: Mutex::new(Vec::new()), fail_names: Vec::new(), delay_ms: 0 }
        }

        fn failing(names: &[&str]) -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                fail_names: names.iter().map(|s| s.to_string()).collect(),
                delay_ms: 0,
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn calls(&self) -> Vec<PathBuf> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl FrameFetcher for TestFetcher {
        fn fetch(&self, path: &Path) -> Result<RgbaImage, FrameError> {
            self.calls.lock().unwrap().push(path.to_path_buf());
            if self.delay_ms > 0 {
                thread::sleep(std::time::Duration::from_millis(self.delay_ms));
            }
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            if self.fail_names.contains(&name) {
                return Err(FrameError::Io(format!("synthetic failure: {}", name)));
            }
            Ok(RgbaImage::from_pixel(2, 2, Rgba([1, 2, 3, 255])))
        }
    }

    fn cache_with(fetcher: TestFetcher) -> (Arc<FrameCache>, Receiver<CacheEvent>, Arc<TestFetcher>) {
        let fetcher = Arc::new(fetcher);
        let shared: Arc<dyn FrameFetcher> = fetcher.clone();
        let workers = Arc::new(Workers::new(4));
        let (cache, rx) = FrameCache::new(PathBuf::from("frames"), "webp", shared, workers);
        (cache, rx, fetcher)
    }

    #[test]
    fn load_is_idempotent_no_refetch() {
        let (cache, _rx, fetcher) = cache_with(TestFetcher::new());
        let total = Stage::Begin.config().unwrap().frame_count;

        let first = cache.wait(Stage::Begin).expect("sequence");
        assert_eq!(first.len(), total);
        assert_eq!(fetcher.call_count(), total);

        // Second call: cached, same content, no new fetches.
        let second = cache.wait(Stage::Begin).expect("sequence");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(fetcher.call_count(), total);
        assert_eq!(cache.progress(Stage::Begin), 1.0);
    }

    #[test]
    fn inflight_request_joins_without_duplicate_fetches() {
        let (cache, _rx, fetcher) = cache_with(TestFetcher { delay_ms: 2, ..TestFetcher::new() });
        let total = Stage::Vision.config().unwrap().frame_count;

        // Two rapid requests: second sees the in-flight marker.
        assert!(matches!(cache.request(Stage::Vision), Some(LoadState::Loading)));
        assert!(matches!(cache.request(Stage::Vision), Some(LoadState::Loading)));

        cache.wait(Stage::Vision).expect("sequence");
        assert_eq!(fetcher.call_count(), total);
    }

    #[test]
    fn failed_frame_degrades_to_placeholder_and_full_progress() {
        // Frame index 3 of the stage is file 0004.webp.
        let (cache, rx, _fetcher) = cache_with(TestFetcher::failing(&["0004.webp"]));
        let total = Stage::Growth.config().unwrap().frame_count;

        let seq = cache.wait(Stage::Growth).expect("sequence");
        assert_eq!(seq.len(), total);
        assert_eq!(seq.loaded_count(), total - 1);
        assert!(seq.get(3).unwrap().is_placeholder());
        assert_eq!(cache.progress(Stage::Growth), 1.0);

        // Progress reaches 100% and the ready event fires despite the failure.
        let events: Vec<CacheEvent> = rx.try_iter().collect();
        assert!(events.contains(&CacheEvent::Progress { stage: Stage::Growth, settled: total, total }));
        assert!(events.contains(&CacheEvent::StageReady { stage: Stage::Growth }));
    }

    #[test]
    fn cached_request_rereports_complete_progress() {
        let (cache, rx, _fetcher) = cache_with(TestFetcher::new());
        let total = Stage::Begin.config().unwrap().frame_count;

        cache.wait(Stage::Begin);
        let _ = rx.try_iter().count(); // drain load-time events

        assert!(matches!(cache.request(Stage::Begin), Some(LoadState::Ready(_))));
        let events: Vec<CacheEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![CacheEvent::Progress { stage: Stage::Begin, settled: total, total }]
        );
    }

    #[test]
    fn terminal_stage_has_no_sequence() {
        let (cache, _rx, fetcher) = cache_with(TestFetcher::new());
        assert!(cache.request(Stage::Cta).is_none());
        assert!(cache.wait(Stage::Cta).is_none());
        assert_eq!(cache.progress(Stage::Cta), 1.0);
        assert_eq!(fetcher.call_count(), 0);
    }

    #[test]
    fn preload_runs_strictly_in_stage_order() {
        let (cache, _rx, fetcher) = cache_with(TestFetcher::new());

        let handle = cache.preload_all(vec![Stage::Vision, Stage::Growth, Stage::Launch]);
        handle.join().unwrap();

        // Stage N+1 jobs are not even enqueued until stage N settled, so all
        // of a stage's fetches precede every fetch of the next stage.
        let stages: Vec<String> = fetcher
            .calls()
            .iter()
            .map(|p| p.parent().unwrap().file_name().unwrap().to_string_lossy().to_string())
            .collect();
        let last_vision = stages.iter().rposition(|s| s == "stage-1").unwrap();
        let first_growth = stages.iter().position(|s| s == "stage-2").unwrap();
        let last_growth = stages.iter().rposition(|s| s == "stage-2").unwrap();
        let first_launch = stages.iter().position(|s| s == "stage-3").unwrap();
        assert!(last_vision < first_growth);
        assert!(last_growth < first_launch);
    }
}
