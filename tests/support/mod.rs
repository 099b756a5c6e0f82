//! Shared test doubles for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use playlist_dl_core::backend::{ProbedCollection, ProbedEntry, ProbedItem};
use playlist_dl_core::{BackendError, FetchBackend, FetchRequest, MetadataProbe, ProbeResult};

/// Probe returning a canned result.
pub struct MockProbe {
    result: Result<ProbeResult, String>,
    calls: AtomicUsize,
}

impl MockProbe {
    pub fn returning(result: ProbeResult) -> Self {
        Self {
            result: Ok(result),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            result: Err(reason.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataProbe for MockProbe {
    async fn probe(&self, _reference: &str) -> Result<ProbeResult, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone().map_err(BackendError::failed)
    }
}

/// Collection with `count` entries whose urls are `https://v/<n>`.
pub fn collection(title: &str, count: usize) -> ProbeResult {
    ProbeResult::Collection(ProbedCollection {
        title: Some(title.to_string()),
        entries: (1..=count)
            .map(|n| ProbedEntry {
                url: Some(format!("https://v/{n}")),
                id: Some(format!("id{n}")),
                title: Some(format!("Video {n}")),
                completion_key: None,
            })
            .collect(),
    })
}

pub fn single(title: &str, url: &str, heights: &[u32]) -> ProbeResult {
    ProbeResult::Single(ProbedItem {
        title: Some(title.to_string()),
        webpage_url: Some(url.to_string()),
        available_heights: heights.to_vec(),
        completion_key: None,
    })
}

/// Fetch backend that records calls and tracks peak concurrency.
pub struct MockBackend {
    delay: Duration,
    delays: HashMap<String, Duration>,
    failing: HashSet<String>,
    keyed: bool,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
    requests: Mutex<Vec<FetchRequest>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            delay: Duration::from_millis(0),
            delays: HashMap::new(),
            failing: HashSet::new(),
            keyed: true,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Overrides the delay for one reference.
    pub fn with_delay_for(mut self, reference: &str, delay: Duration) -> Self {
        self.delays.insert(reference.to_string(), delay);
        self
    }

    /// Fails every fetch of `reference` with `"mock failure for <reference>"`.
    pub fn failing_on(mut self, reference: &str) -> Self {
        self.failing.insert(reference.to_string());
        self
    }

    /// Leaves skip detection to the backend, like an unrecognized site.
    pub fn without_keys(mut self) -> Self {
        self.keyed = false;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

/// Ledger key the mock backend assigns to `reference`.
pub fn mock_key(reference: &str) -> String {
    format!("mock {reference}")
}

#[async_trait]
impl FetchBackend for MockBackend {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn completion_key(&self, reference: &str) -> Option<String> {
        self.keyed.then(|| mock_key(reference))
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<(), BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let delay = self
            .delays
            .get(&request.reference)
            .copied()
            .unwrap_or(self.delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&request.reference) {
            Err(BackendError::failed(format!(
                "mock failure for {}",
                request.reference
            )))
        } else {
            Ok(())
        }
    }
}
