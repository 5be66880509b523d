//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! housekeeping jobs.

use std::sync::Arc;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

/// Every day at 03:30 UTC.
const CART_PURGE_SCHEDULE: &str = "0 30 3 * * *";

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive for
/// the lifetime of the process. Dropping it shuts down all scheduled jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<flowershop_core::AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_cart_purge_job(&scheduler, pool, config.cart_ttl_days).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the daily purge of cart sessions idle for longer than `ttl_days`.
async fn register_cart_purge_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    ttl_days: u32,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async(CART_PURGE_SCHEDULE, move |_uuid, _lock| {
        let pool = Arc::clone(&pool);

        Box::pin(async move {
            run_cart_purge(&pool, ttl_days).await;
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

async fn run_cart_purge(pool: &PgPool, ttl_days: u32) {
    match flowershop_db::purge_idle_carts(pool, ttl_days).await {
        Ok(removed) => {
            tracing::info!(removed, ttl_days, "scheduler: purged idle cart sessions");
        }
        Err(e) => {
            tracing::error!(error = %e, "scheduler: cart purge failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn purge_schedule_is_a_valid_cron_expression() {
        let job = Job::new_async(CART_PURGE_SCHEDULE, |_uuid, _lock| Box::pin(async {}));
        assert!(job.is_ok());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn purge_keeps_recent_sessions(pool: PgPool) {
        let stale = uuid::Uuid::new_v4();
        let fresh = uuid::Uuid::new_v4();
        sqlx::query(
            "INSERT INTO cart_sessions (session_id, updated_at) \
             VALUES ($1, NOW() - INTERVAL '40 days'), ($2, NOW())",
        )
        .bind(stale)
        .bind(fresh)
        .execute(&pool)
        .await
        .expect("insert sessions");

        run_cart_purge(&pool, 30).await;

        let left: Vec<uuid::Uuid> =
            sqlx::query_scalar("SELECT session_id FROM cart_sessions ORDER BY created_at")
                .fetch_all(&pool)
                .await
                .expect("remaining sessions");
        assert_eq!(left, vec![fresh]);
    }
}
