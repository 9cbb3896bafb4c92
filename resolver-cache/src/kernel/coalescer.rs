use {
    super::entities::{
        CanonicalHash,
        ContentHash,
    },
    axum_prometheus::metrics,
    dashmap::{
        mapref::entry::Entry,
        DashMap,
    },
    futures::future::{
        BoxFuture,
        FutureExt,
        Shared,
    },
    std::{
        fmt,
        future::Future,
        sync::Arc,
    },
};

type PendingOperation<T> = Shared<BoxFuture<'static, Result<T, ExecutionAborted>>>;

/// The operation panicked or its task was cancelled before producing an output.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionAborted {
    pub reason: String,
}

impl fmt::Display for ExecutionAborted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Operation aborted: {}", self.reason)
    }
}

impl std::error::Error for ExecutionAborted {}

// Clears the pending entry when the operation's task finishes, panics or is dropped.
struct PendingGuard<T: Clone> {
    pending: Arc<DashMap<ContentHash, PendingOperation<T>>>,
    hash:    ContentHash,
}

impl<T: Clone> Drop for PendingGuard<T> {
    fn drop(&mut self) {
        self.pending.remove(&self.hash);
    }
}

/// Collapses concurrent executions of an operation with identical input into one.
///
/// One coalescer should wrap one logical operation: inputs are identified only by their
/// content hash, so two different operations sharing a coalescer would also share results.
/// Failures are ordinary outputs (`T` is usually a `Result`) and are never retained once the
/// operation settles.
///
/// Each operation runs on its own task, so it settles and leaves the map even when every
/// caller waiting on it has gone away.
pub struct Coalescer<T: Clone> {
    name:    &'static str,
    pending: Arc<DashMap<ContentHash, PendingOperation<T>>>,
}

impl<T> Coalescer<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            pending: Arc::new(DashMap::new()),
        }
    }

    /// Runs `op(input)`, or joins the execution already in flight for an equal input.
    pub async fn execute<I, F, Fut>(&self, input: I, op: F) -> Result<T, ExecutionAborted>
    where
        I: CanonicalHash,
        F: FnOnce(I) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let hash = input.content_hash();
        let operation = match self.pending.entry(hash) {
            Entry::Occupied(entry) => {
                tracing::debug!(coalescer = self.name, hash = ?hash, "Joining in-flight operation");
                metrics::counter!(
                    "coalescer_executions_total",
                    &[("coalescer", self.name), ("result", "joined")]
                )
                .increment(1);
                entry.get().clone()
            }
            Entry::Vacant(entry) => {
                tracing::debug!(coalescer = self.name, hash = ?hash, "Starting operation");
                metrics::counter!(
                    "coalescer_executions_total",
                    &[("coalescer", self.name), ("result", "started")]
                )
                .increment(1);
                let future = op(input);
                let guard = PendingGuard {
                    pending: self.pending.clone(),
                    hash,
                };
                let task = tokio::spawn(async move {
                    // Dropped before the task's output is observable, so a caller arriving
                    // after settlement always starts a fresh execution.
                    let _guard = guard;
                    future.await
                });
                let operation = task
                    .map(|result| {
                        result.map_err(|err| ExecutionAborted {
                            reason: err.to_string(),
                        })
                    })
                    .boxed()
                    .shared();
                entry.insert(operation.clone());
                operation
            }
        };
        operation.await
    }

    /// Number of distinct operations currently in flight.
    pub fn in_flight(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::{
            sync::atomic::{
                AtomicUsize,
                Ordering,
            },
            time::Duration,
        },
    };

    async fn slow_double(calls: Arc<AtomicUsize>, input: u64) -> Result<u64, String> {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(input * 2)
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_identical_calls_run_once() {
        let coalescer = Coalescer::<Result<u64, String>>::new("test");
        let calls = Arc::new(AtomicUsize::new(0));

        let results = futures::future::join_all((0..10).map(|_| {
            let calls = calls.clone();
            coalescer.execute(21_u64, move |input| slow_double(calls, input))
        }))
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(results.iter().all(|result| result == &Ok(Ok(42))));
        assert_eq!(coalescer.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_inputs_are_not_coalesced() {
        let coalescer = Coalescer::<Result<u64, String>>::new("test");
        let calls = Arc::new(AtomicUsize::new(0));

        let (first, second) = tokio::join!(
            coalescer.execute(1_u64, {
                let calls = calls.clone();
                move |input| slow_double(calls, input)
            }),
            coalescer.execute(2_u64, {
                let calls = calls.clone();
                move |input| slow_double(calls, input)
            }),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(first, Ok(Ok(2)));
        assert_eq!(second, Ok(Ok(4)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_is_shared_and_not_cached() {
        let coalescer = Coalescer::<Result<u64, String>>::new("test");
        let calls = Arc::new(AtomicUsize::new(0));
        let failing = |calls: Arc<AtomicUsize>| {
            move |_: u64| async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                Err::<u64, String>("upstream unavailable".to_string())
            }
        };

        let (first, second) = tokio::join!(
            coalescer.execute(7_u64, failing(calls.clone())),
            coalescer.execute(7_u64, failing(calls.clone())),
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first, Ok(Err("upstream unavailable".to_string())));
        assert_eq!(first, second);
        assert_eq!(coalescer.in_flight(), 0);

        let retried = coalescer
            .execute(7_u64, {
                let calls = calls.clone();
                move |input| slow_double(calls, input)
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(retried, Ok(Ok(14)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_calls_execute_again() {
        let coalescer = Coalescer::<Result<u64, String>>::new("test");
        let calls = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let calls = calls.clone();
            coalescer
                .execute(3_u64, move |input| slow_double(calls, input))
                .await
                .unwrap()
                .unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_operation_is_cleared() {
        let coalescer = Coalescer::<Result<u64, String>>::new("test");
        let result = coalescer
            .execute(1_u64, |input| async move {
                if input == 1 {
                    panic!("operation failed");
                }
                Ok(input)
            })
            .await;
        assert!(result.is_err());
        assert_eq!(coalescer.in_flight(), 0);

        let calls = Arc::new(AtomicUsize::new(0));
        let retried = coalescer
            .execute(1_u64, {
                let calls = calls.clone();
                move |input| slow_double(calls, input)
            })
            .await;
        assert_eq!(retried, Ok(Ok(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_operations_settle() {
        let coalescer = Coalescer::<Result<u64, String>>::new("test");
        let calls = Arc::new(AtomicUsize::new(0));
        for input in 0..100_u64 {
            let calls = calls.clone();
            let execution = coalescer.execute(input, move |input| slow_double(calls, input));
            let _ = tokio::time::timeout(Duration::from_millis(1), execution).await;
        }

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(coalescer.in_flight(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 100);
    }
}
