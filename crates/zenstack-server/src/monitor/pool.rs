use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Bounded worker pool over a job channel and a result channel.
///
/// `workers` tasks pull jobs from a shared queue, run `job`, and push
/// results. Closing the job queue (the feeder finishing) drains the
/// workers; dropping the returned receiver cancels the whole pool on the
/// next send. Result order follows completion, not submission.
pub fn spawn_workers<T, R, F, Fut>(items: Vec<T>, workers: usize, job: F) -> mpsc::Receiver<R>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = R> + Send,
{
    let capacity = items.len().max(1);
    let (job_tx, job_rx) = mpsc::channel::<T>(capacity);
    let job_rx = Arc::new(Mutex::new(job_rx));
    let (result_tx, result_rx) = mpsc::channel::<R>(capacity);

    for _ in 0..workers.max(1) {
        let job_rx = job_rx.clone();
        let result_tx = result_tx.clone();
        let job = job.clone();
        tokio::spawn(async move {
            loop {
                // Hold the lock only for the dequeue, not the probe.
                let item = { job_rx.lock().await.recv().await };
                let Some(item) = item else { break };
                let result = job(item).await;
                if result_tx.send(result).await.is_err() {
                    break;
                }
            }
        });
    }
    drop(result_tx);

    tokio::spawn(async move {
        for item in items {
            if job_tx.send(item).await.is_err() {
                break;
            }
        }
        // job_tx drops here, closing the queue; workers drain and exit.
    });

    result_rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_pool_processes_every_item_once() {
        let items: Vec<u32> = (0..50).collect();
        let mut rx = spawn_workers(items, 5, |n: u32| async move { n * 2 });

        let mut results = Vec::new();
        while let Some(r) = rx.recv().await {
            results.push(r);
        }
        results.sort_unstable();
        assert_eq!(results, (0..50).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_pool_bounds_concurrency() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let items: Vec<u32> = (0..20).collect();
        let in_flight_c = in_flight.clone();
        let peak_c = peak.clone();
        let mut rx = spawn_workers(items, 3, move |_n: u32| {
            let in_flight = in_flight_c.clone();
            let peak = peak_c.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }
        });

        while rx.recv().await.is_some() {}
        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_pool_with_empty_input_closes_immediately() {
        let mut rx = spawn_workers(Vec::<u32>::new(), 4, |n: u32| async move { n });
        assert!(rx.recv().await.is_none());
    }
}
