//! Cron-based scheduler driving a periodic async job

use cron::Schedule;
use futures_util::future::BoxFuture;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::ConfigError;

/// Work run on every scheduler tick.
pub type Job = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// Cron expression firing every `interval_seconds`.
///
/// Cron format: second minute hour day month weekday
pub fn cron_expression(interval_seconds: u64) -> String {
    if interval_seconds >= 60 {
        format!("0 */{} * * * *", interval_seconds / 60)
    } else {
        format!("*/{} * * * * *", interval_seconds)
    }
}

pub struct JobScheduler {
    name: String,
    schedule: Schedule,
    job: Job,
    handle: Arc<RwLock<Option<tokio::task::JoinHandle<()>>>>,
}

impl JobScheduler {
    /// `interval_seconds == 0` disables the scheduler and is rejected.
    pub fn new(name: impl Into<String>, interval_seconds: u64, job: Job) -> Result<Self, ConfigError> {
        let name = name.into();
        if interval_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                key: format!("{} interval", name),
                value: "0".to_string(),
            });
        }

        let cron_expr = cron_expression(interval_seconds);
        let schedule = Schedule::from_str(&cron_expr).map_err(|e| ConfigError::InvalidValue {
            key: format!("{} cron", name),
            value: format!("{} ({})", cron_expr, e),
        })?;

        info!(
            scheduler = %name,
            interval = interval_seconds,
            cron = %cron_expr,
            "JobScheduler: {} created with interval {}s (cron: {})",
            name,
            interval_seconds,
            cron_expr
        );

        Ok(Self {
            name,
            schedule,
            job,
            handle: Arc::new(RwLock::new(None)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn start(&self) {
        let mut handle = self.handle.write().await;
        if handle.is_some() {
            debug!(scheduler = %self.name, "JobScheduler: {} already running", self.name);
            return;
        }

        let name = self.name.clone();
        let schedule = self.schedule.clone();
        let job = self.job.clone();

        *handle = Some(tokio::spawn(async move {
            loop {
                let mut upcoming = schedule.upcoming(chrono::Utc);
                match upcoming.next() {
                    Some(next_tick) => {
                        let now = chrono::Utc::now();
                        if next_tick > now {
                            let duration = (next_tick - now).to_std().unwrap_or_default();
                            tokio::time::sleep(duration).await;
                        }
                    }
                    None => {
                        tokio::time::sleep(tokio::time::Duration::from_secs(60)).await;
                        continue;
                    }
                }

                debug!(scheduler = %name, "JobScheduler: {} tick", name);
                job().await;
            }
        }));

        info!(scheduler = %self.name, "JobScheduler: {} started", self.name);
    }

    pub async fn stop(&self) {
        let mut handle = self.handle.write().await;
        if let Some(h) = handle.take() {
            h.abort();
            info!(scheduler = %self.name, "JobScheduler: {} stopped", self.name);
        }
    }

    pub async fn is_running(&self) -> bool {
        self.handle.read().await.is_some()
    }
}
