#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use sky_catalog::adapters::{AdapterError, AdapterPage, AdapterResult, CatalogAdapter};
use sky_catalog::models::{BoundingBox, Category, ObjectSummary};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// Restores variables on unwind and serializes access to the process
/// environment across parallel tests.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

pub fn star(id: &str, name: &str, ra: f64, dec: f64, source: &str) -> ObjectSummary {
    ObjectSummary::new(id, name, Category::Stars, ra, dec, source)
}

enum Behaviour {
    Items(Vec<ObjectSummary>),
    Fail(AdapterError),
}

/// Adapter with canned answers, an optional delay and call counters.
pub struct ScriptedAdapter {
    id: String,
    behaviour: Behaviour,
    delay: Option<Duration>,
    total: Option<usize>,
    search_calls: AtomicUsize,
    lookup_calls: AtomicUsize,
}

impl ScriptedAdapter {
    pub fn with_items(id: &str, items: Vec<ObjectSummary>) -> Self {
        Self {
            id: id.to_string(),
            behaviour: Behaviour::Items(items),
            delay: None,
            total: None,
            search_calls: AtomicUsize::new(0),
            lookup_calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(id: &str, error: AdapterError) -> Self {
        Self {
            behaviour: Behaviour::Fail(error),
            ..Self::with_items(id, Vec::new())
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Report a fixed upstream total instead of the number of items.
    pub fn reporting_total(mut self, total: usize) -> Self {
        self.total = Some(total);
        self
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl CatalogAdapter for ScriptedAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    async fn search_by_category(
        &self,
        category: Category,
        _bbox: Option<BoundingBox>,
        page: u32,
        limit: u32,
    ) -> AdapterResult<AdapterPage> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        match &self.behaviour {
            Behaviour::Fail(error) => Err(error.clone()),
            Behaviour::Items(items) => {
                let matching: Vec<_> = items
                    .iter()
                    .filter(|item| item.category == category)
                    .cloned()
                    .collect();
                let total = self.total.unwrap_or(matching.len());
                let start = (page.max(1) as usize - 1) * limit as usize;
                let items = matching
                    .into_iter()
                    .skip(start)
                    .take(limit as usize)
                    .collect();
                Ok(AdapterPage::new(items, Some(total)))
            }
        }
    }

    async fn get_by_id(&self, id: &str) -> AdapterResult<Option<ObjectSummary>> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        match &self.behaviour {
            Behaviour::Fail(error) => Err(error.clone()),
            Behaviour::Items(items) => Ok(items.iter().find(|item| item.id == id).cloned()),
        }
    }
}
