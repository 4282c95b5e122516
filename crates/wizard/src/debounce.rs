//! Per-key debounce timers for auto-save.

use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

pub const DEFAULT_DELAY: Duration = Duration::from_millis(1000);

type Timers<K> = Arc<Mutex<HashMap<K, (u64, JoinHandle<()>)>>>;

/// One timer per key. Scheduling a key again aborts and restarts its timer;
/// other keys are unaffected.
pub struct Debouncer<K> {
    delay: Duration,
    timers: Timers<K>,
    generation: Arc<Mutex<u64>>,
}

impl<K> Default for Debouncer<K> {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<K> Debouncer<K> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            timers: Arc::new(Mutex::new(HashMap::new())),
            generation: Arc::new(Mutex::new(0)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Timers still waiting to fire.
    pub fn pending(&self) -> usize {
        lock(&self.timers).len()
    }

    pub fn cancel_all(&self) {
        for (_, (_, handle)) in lock(&self.timers).drain() {
            handle.abort();
        }
    }
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + Clone + Debug + Send + 'static,
{
    /// Run `task` once `key` has been quiet for the delay.
    pub fn schedule<F, Fut>(&self, key: K, task: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = {
            let mut counter = lock(&self.generation);
            *counter += 1;
            *counter
        };

        let timers = Arc::clone(&self.timers);
        let delay = self.delay;
        let fired = key.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut timers = lock(&timers);
                if timers.get(&fired).is_some_and(|(g, _)| *g == generation) {
                    timers.remove(&fired);
                }
            }
            debug!("Debounce timer for {:?} fired", fired);
            task().await;
        });

        if let Some((_, previous)) = lock(&self.timers).insert(key.clone(), (generation, handle)) {
            previous.abort();
            debug!("Debounce timer for {:?} restarted", key);
        }
    }

    /// `true` when a pending timer was dropped.
    pub fn cancel(&self, key: &K) -> bool {
        match lock(&self.timers).remove(key) {
            Some((_, handle)) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self, key: &K) -> bool {
        lock(&self.timers).contains_key(key)
    }
}

impl<K> Drop for Debouncer<K> {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
