//! Bounded worker pool for batch probes
//!
//! A [`WorkerPool`] runs a transform over a stream of batches on a fixed
//! number of OS threads. Batches travel through a bounded inbound queue
//! and results come back through a bounded outbound queue, both sized
//! `4 × concurrency`, so a slow consumer stalls the producer instead of
//! letting work pile up in memory.
//!
//! The first transform error is handed to the consumer and cancels the
//! pool: no further batch is started and the result iterator ends after
//! yielding that error.

use crate::panic_message;
use crossbeam::channel::{bounded, Receiver};
use pkgcruft_errors::{ConfigError, Error, ResourceError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::debug;

/// Allowed range for the number of workers
pub const MAX_WORKERS: usize = 32;

/// Queue capacity per worker, for both directions
const QUEUE_FACTOR: usize = 4;

/// Fixed-size pool of probe threads
#[derive(Debug, Clone)]
pub struct WorkerPool {
    concurrency: usize,
    name: String,
}

impl WorkerPool {
    /// Create a pool with `concurrency` workers
    ///
    /// # Errors
    ///
    /// Returns an error if `concurrency` is outside 1–32.
    pub fn new(concurrency: usize) -> Result<Self, Error> {
        if !(1..=MAX_WORKERS).contains(&concurrency) {
            return Err(ConfigError::InvalidValue {
                field: "concurrency".to_string(),
                value: concurrency.to_string(),
            }
            .into());
        }
        Ok(Self {
            concurrency,
            name: "pool".to_string(),
        })
    }

    /// Name used for worker threads and log lines
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Capacity of each of the inbound and outbound queues
    #[must_use]
    pub fn queue_capacity(&self) -> usize {
        self.concurrency * QUEUE_FACTOR
    }

    /// Map every non-empty batch through `transform`
    ///
    /// Results arrive in completion order, not input order. The batch
    /// source is drained lazily on a feeder thread.
    ///
    /// # Errors
    ///
    /// Returns an error if a thread cannot be spawned. Transform errors are
    /// delivered through the returned iterator.
    pub fn map<I, T, R, F>(&self, batches: I, transform: F) -> Result<PoolResults<R>, Error>
    where
        I: IntoIterator<Item = Vec<T>>,
        I::IntoIter: Send + 'static,
        T: Send + 'static,
        R: Send + 'static,
        F: Fn(Vec<T>) -> Result<R, Error> + Send + Sync + 'static,
    {
        let capacity = self.queue_capacity();
        let (batch_tx, batch_rx) = bounded::<Vec<T>>(capacity);
        let (result_tx, result_rx) = bounded::<Result<R, Error>>(capacity);
        let cancel = Arc::new(AtomicBool::new(false));
        let transform = Arc::new(transform);

        debug!(
            pool = %self.name,
            workers = self.concurrency,
            capacity,
            "starting worker pool"
        );

        let mut results = PoolResults {
            results: Some(result_rx),
            cancel: Arc::clone(&cancel),
            handles: Vec::with_capacity(self.concurrency + 1),
            finished: false,
        };

        for worker_id in 0..self.concurrency {
            let rx = batch_rx.clone();
            let tx = result_tx.clone();
            let cancel = Arc::clone(&cancel);
            let transform = Arc::clone(&transform);

            let handle = thread::Builder::new()
                .name(format!("{}-{worker_id}", self.name))
                .spawn(move || {
                    let _guard = CancelOnPanic(Arc::clone(&cancel));
                    while let Ok(batch) = rx.recv() {
                        if cancel.load(Ordering::Acquire) {
                            break;
                        }
                        let result = transform(batch);
                        let failed = result.is_err();
                        if failed {
                            cancel.store(true, Ordering::Release);
                        }
                        if tx.send(result).is_err() || failed {
                            break;
                        }
                    }
                });
            match handle {
                Ok(handle) => results.handles.push(handle),
                Err(e) => {
                    // Idle workers block on the batch queue until it disconnects
                    drop(batch_tx);
                    return Err(results.abort(&e));
                }
            }
        }

        // Only the workers hold these; disconnection then means "all done"
        drop(batch_rx);
        drop(result_tx);

        let batches = batches.into_iter();
        let feeder_cancel = Arc::clone(&cancel);
        let feeder = thread::Builder::new()
            .name(format!("{}-feed", self.name))
            .spawn(move || {
                let _guard = CancelOnPanic(Arc::clone(&feeder_cancel));
                for batch in batches {
                    if feeder_cancel.load(Ordering::Acquire) {
                        break;
                    }
                    if batch.is_empty() {
                        continue;
                    }
                    if batch_tx.send(batch).is_err() {
                        break;
                    }
                }
            });
        match feeder {
            Ok(handle) => results.handles.push(handle),
            Err(e) => return Err(results.abort(&e)),
        }

        Ok(results)
    }
}

/// Sets the cancel flag if the owning thread unwinds
struct CancelOnPanic(Arc<AtomicBool>);

impl Drop for CancelOnPanic {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.store(true, Ordering::Release);
        }
    }
}

/// Lazily consumed results of [`WorkerPool::map`]
///
/// Ends only after every worker has exited. Dropping it early cancels the
/// pool and joins the threads.
pub struct PoolResults<R> {
    results: Option<Receiver<Result<R, Error>>>,
    cancel: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
    finished: bool,
}

impl<R> PoolResults<R> {
    fn abort(&mut self, error: &std::io::Error) -> Error {
        self.shutdown();
        ResourceError::SpawnFailed {
            message: error.to_string(),
        }
        .into()
    }

    /// Cancel outstanding work and wait for every thread
    fn shutdown(&mut self) {
        self.finished = true;
        self.cancel.store(true, Ordering::Release);
        self.results = None;
        let _ = self.join_all();
    }

    fn join_all(&mut self) -> Result<(), Error> {
        let mut outcome = Ok(());
        for handle in self.handles.drain(..) {
            if let Err(payload) = handle.join() {
                if outcome.is_ok() {
                    outcome = Err(ResourceError::WorkerPanicked {
                        message: panic_message(payload.as_ref()),
                    }
                    .into());
                }
            }
        }
        outcome
    }

    /// Drain every result, stopping at the first error
    ///
    /// # Errors
    ///
    /// Returns the first transform error or worker panic.
    pub fn collect_all(self) -> Result<Vec<R>, Error> {
        self.collect()
    }
}

impl<R> Iterator for PoolResults<R> {
    type Item = Result<R, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let received = self.results.as_ref()?.recv();
        match received {
            Ok(Ok(value)) => Some(Ok(value)),
            Ok(Err(e)) => {
                self.shutdown();
                Some(Err(e))
            }
            Err(_) => {
                // Every worker dropped its sender: the queues are drained
                self.finished = true;
                self.results = None;
                self.join_all().err().map(Err)
            }
        }
    }
}

impl<R> Drop for PoolResults<R> {
    fn drop(&mut self) {
        if !self.handles.is_empty() {
            self.shutdown();
        }
    }
}

/// Partition an iterator into batches of at most `size` items
pub fn batched<I: IntoIterator>(items: I, size: usize) -> Batched<I::IntoIter> {
    Batched {
        inner: items.into_iter(),
        size: size.max(1),
    }
}

/// Iterator returned by [`batched`]
pub struct Batched<I> {
    inner: I,
    size: usize,
}

impl<I: Iterator> Iterator for Batched<I> {
    type Item = Vec<I::Item>;

    fn next(&mut self) -> Option<Self::Item> {
        let batch: Vec<_> = self.inner.by_ref().take(self.size).collect();
        if batch.is_empty() {
            None
        } else {
            Some(batch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn test_concurrency_range() {
        assert!(WorkerPool::new(0).is_err());
        assert!(WorkerPool::new(33).is_err());
        assert_eq!(WorkerPool::new(1).unwrap().queue_capacity(), 4);
        assert_eq!(WorkerPool::new(32).unwrap().queue_capacity(), 128);
    }

    #[test]
    fn test_every_batch_processed_once() {
        let pool = WorkerPool::new(4).unwrap();
        let batches: Vec<Vec<u64>> = (0..100).map(|i| vec![i, i + 1000]).collect();

        let results = pool
            .map(batches, |batch| Ok(batch.iter().sum::<u64>()))
            .unwrap()
            .collect_all()
            .unwrap();

        assert_eq!(results.len(), 100);
        let expected: u64 = (0..100).map(|i| 2 * i + 1000).sum();
        assert_eq!(results.iter().sum::<u64>(), expected);
    }

    /// Batch source that stays on the calling thread; only its iterator moves
    struct LocalBatches {
        _local: std::rc::Rc<()>,
        batches: Vec<Vec<u32>>,
    }

    impl IntoIterator for LocalBatches {
        type Item = Vec<u32>;
        type IntoIter = std::vec::IntoIter<Vec<u32>>;

        fn into_iter(self) -> Self::IntoIter {
            self.batches.into_iter()
        }
    }

    #[test]
    fn test_source_need_not_be_send() {
        let pool = WorkerPool::new(2).unwrap();
        let source = LocalBatches {
            _local: std::rc::Rc::new(()),
            batches: vec![vec![1, 2], vec![3]],
        };

        let mut sums = pool
            .map(source, |batch| Ok(batch.iter().sum::<u32>()))
            .unwrap()
            .collect_all()
            .unwrap();
        sums.sort_unstable();

        assert_eq!(sums, vec![3, 3]);
    }

    #[test]
    fn test_empty_batches_skipped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let pool = WorkerPool::new(2).unwrap();
        let batches = vec![vec![1], Vec::new(), vec![2, 3], Vec::new()];

        let results = pool
            .map(batches, move |batch: Vec<i32>| {
                seen.fetch_add(1, Ordering::SeqCst);
                assert!(!batch.is_empty());
                Ok(batch.len())
            })
            .unwrap()
            .collect_all()
            .unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrency_is_bounded() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (a, p) = (Arc::clone(&active), Arc::clone(&peak));
        let pool = WorkerPool::new(3).unwrap();

        let count = pool
            .map(batched(0..60, 2), move |_batch: Vec<i32>| {
                let now = a.fetch_add(1, Ordering::SeqCst) + 1;
                p.fetch_max(now, Ordering::SeqCst);
                thread::sleep(Duration::from_millis(5));
                a.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            })
            .unwrap()
            .count();

        assert_eq!(count, 30);
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert!(peak.load(Ordering::SeqCst) >= 1);
    }

    #[test]
    fn test_slow_consumer_throttles_producer() {
        let produced = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&produced);
        let pool = WorkerPool::new(2).unwrap();
        let source = (0..10_000).map(move |i| {
            counter.fetch_add(1, Ordering::SeqCst);
            vec![i]
        });

        let mut results = pool.map(source, |batch: Vec<i32>| Ok(batch[0])).unwrap();
        thread::sleep(Duration::from_millis(100));

        // inbound + outbound queues, one batch per worker, one held by the feeder
        let bound = 2 * pool.queue_capacity() + pool.concurrency() + 1;
        assert!(produced.load(Ordering::SeqCst) <= bound);

        assert!(results.next().is_some());
        drop(results);
    }

    #[test]
    fn test_error_surfaces_exactly_once() {
        let pool = WorkerPool::new(4).unwrap();
        let batches: Vec<Vec<i32>> = (0..50).map(|i| vec![i]).collect();

        let results: Vec<_> = pool
            .map(batches, |batch| {
                if batch[0] % 7 == 3 {
                    Err(Error::internal(format!("probe failed for {}", batch[0])))
                } else {
                    Ok(batch[0])
                }
            })
            .unwrap()
            .collect();

        let errors = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(errors, 1);
        assert!(results.last().unwrap().is_err());

        let mut successes: Vec<i32> = results.into_iter().filter_map(Result::ok).collect();
        let before = successes.len();
        successes.dedup();
        assert_eq!(before, successes.len());
    }

    #[test]
    fn test_worker_panic_is_reported() {
        let pool = WorkerPool::new(2).unwrap();
        let outcome = pool
            .map(vec![vec![1], vec![2], vec![3]], |batch: Vec<i32>| {
                if batch[0] == 2 {
                    panic!("ldd exploded");
                }
                Ok(batch[0])
            })
            .unwrap()
            .collect_all();

        match outcome {
            Err(Error::Resource(ResourceError::WorkerPanicked { message })) => {
                assert!(message.contains("ldd exploded"));
            }
            other => panic!("expected a worker panic, got {other:?}"),
        }
    }

    #[test]
    fn test_early_drop_does_not_hang() {
        let pool = WorkerPool::new(2).unwrap();
        let mut results = pool
            .map((0..1000).map(|i| vec![i]), |batch: Vec<i32>| Ok(batch[0]))
            .unwrap();
        assert!(results.next().unwrap().is_ok());
        drop(results);
    }

    #[test]
    fn test_batched() {
        let batches: Vec<Vec<i32>> = batched(1..=7, 3).collect();
        assert_eq!(batches, vec![vec![1, 2, 3], vec![4, 5, 6], vec![7]]);
        assert_eq!(batched(Vec::<i32>::new(), 3).count(), 0);
        assert_eq!(batched(0..4, 0).count(), 4);
    }
}
