//! Unit tests for the job scheduler

use futures_util::FutureExt;
use stalker::core::scheduler::{cron_expression, Job, JobScheduler};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn counting_job(counter: Arc<AtomicUsize>) -> Job {
    Arc::new(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
        .boxed()
    })
}

#[test]
fn test_zero_interval_is_rejected() {
    let counter = Arc::new(AtomicUsize::new(0));
    assert!(JobScheduler::new("disabled", 0, counting_job(counter)).is_err());
}

#[test]
fn test_cron_expression_format() {
    assert_eq!(cron_expression(1), "*/1 * * * * *");
    assert_eq!(cron_expression(120), "0 */2 * * * *");
}

#[tokio::test]
async fn test_start_runs_job_until_stopped() {
    let counter = Arc::new(AtomicUsize::new(0));
    let scheduler = JobScheduler::new("every-second", 1, counting_job(counter.clone())).unwrap();
    assert_eq!(scheduler.name(), "every-second");
    assert!(!scheduler.is_running().await);

    scheduler.start().await;
    assert!(scheduler.is_running().await);

    tokio::time::sleep(Duration::from_millis(2_200)).await;
    scheduler.stop().await;
    assert!(!scheduler.is_running().await);

    let ticks = counter.load(Ordering::SeqCst);
    assert!(ticks >= 1, "expected at least one tick, got {}", ticks);

    tokio::time::sleep(Duration::from_millis(1_200)).await;
    assert_eq!(counter.load(Ordering::SeqCst), ticks);
}
