use crate::context::AppContext;
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{debug, info};

/// Job scheduler for background tasks
pub struct JobScheduler {
    context: Arc<AppContext>,
}

impl JobScheduler {
    pub fn new(context: Arc<AppContext>) -> Self {
        Self { context }
    }

    /// Start all background jobs
    pub fn start(self: Arc<Self>) {
        info!("Starting background job scheduler");

        tokio::spawn(Self::login_state_cleanup_job(Arc::clone(&self)));

        info!("Background jobs started");
    }

    /// Drop expired PKCE states (runs every minute)
    async fn login_state_cleanup_job(scheduler: Arc<Self>) {
        let mut interval = interval(Duration::from_secs(60));

        loop {
            interval.tick().await;

            let purged = scheduler.context.mfa.states().purge_expired().await;
            if purged > 0 {
                debug!("Purged {} expired login states", purged);
            }
        }
    }
}
