use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use tokio::time::sleep;
use tracing::{error, info, warn, info_span, Instrument};
use crate::state::AppState;
use crate::domain::models::job::{Job, JOB_BOOKING_CANCELLATION, JOB_BOOKING_CONFIRMATION};
use crate::domain::services::discount::format_amount;
use crate::error::AppError;
use crate::infra::factory::{CANCELLATION_TEMPLATE, CONFIRMATION_TEMPLATE};

const BATCH_SIZE: i32 = 10;

pub async fn start_background_worker(state: Arc<AppState>) {
    info!("Starting background job worker...");

    loop {
        if let Err(e) = run_pending_jobs(&state).await {
            error!("Failed to fetch pending jobs: {:?}", e);
        }
        sleep(Duration::from_secs(5)).await;
    }
}

/// Claims one batch of due jobs and runs each to completion, retry or failure.
/// Returns how many jobs were claimed.
pub async fn run_pending_jobs(state: &Arc<AppState>) -> Result<usize, AppError> {
    let jobs = state.job_repo.find_pending(BATCH_SIZE).await?;
    let claimed = jobs.len();

    for job in jobs {
        let span = info_span!(
            "background_job",
            job_id = %job.id,
            job_type = %job.job_type,
            booking_id = %job.payload.booking_id
        );

        async {
            info!("Processing job: {}", job.job_type);
            match process_job(state, &job).await {
                Ok(_) => {
                    info!("Job completed successfully");
                    if let Err(e) = state.job_repo.mark_completed(&job.id).await {
                        error!("Failed to mark job as completed: {:?}", e);
                    }
                }
                Err(e) => {
                    let err_msg = format!("{}", e);
                    let attempts = job.attempts + 1;
                    let outcome = match job.next_retry_at(Utc::now()) {
                        Some(retry_at) => {
                            warn!("Job attempt {} failed: {}. Retrying at {}", attempts, err_msg, retry_at);
                            state.job_repo.reschedule(&job.id, attempts, retry_at, &err_msg).await
                        }
                        None => {
                            error!("Job failed permanently after {} attempts: {}", attempts, err_msg);
                            state.job_repo.mark_failed(&job.id, attempts, &err_msg).await
                        }
                    };
                    if let Err(up_err) = outcome {
                        error!("Failed to record job failure: {:?}", up_err);
                    }
                }
            }
        }
            .instrument(span)
            .await;
    }

    Ok(claimed)
}

async fn process_job(state: &Arc<AppState>, job: &Job) -> Result<(), AppError> {
    let booking_id = &job.payload.booking_id;

    let (template, subject_prefix) = match job.job_type.as_str() {
        JOB_BOOKING_CONFIRMATION => (CONFIRMATION_TEMPLATE, "Booking confirmed"),
        JOB_BOOKING_CANCELLATION => (CANCELLATION_TEMPLATE, "Booking cancelled"),
        other => return Err(AppError::InternalWithMsg(format!("Unknown job type {}", other))),
    };

    let booking = state.booking_repo.find_by_id(booking_id).await?
        .ok_or(AppError::NotFound(format!("Booking {} not found", booking_id)))?;

    if booking.is_manual_block() {
        info!("Skipping notification for manual block {}", booking.id);
        return Ok(());
    }

    let chalet = state.chalet_repo.find_by_id(&booking.chalet_id).await?
        .ok_or(AppError::NotFound(format!("Chalet {} not found", booking.chalet_id)))?;

    let mut context = tera::Context::new();
    context.insert("guest_name", &booking.guest_name);
    context.insert("chalet_name", &chalet.name);
    context.insert("start_date", &booking.start_date.format("%Y-%m-%d").to_string());
    context.insert("end_date", &booking.end_date.format("%Y-%m-%d").to_string());
    context.insert("nights", &booking.nights);
    context.insert("guest_count", &booking.guest_count);
    context.insert("discount", &format_amount(booking.discount_cents));
    context.insert("total", &format_amount(booking.total_price_cents));
    context.insert("booking_id", &booking.id);
    let booking_link = format!("{}/bookings/{}", state.config.frontend_url, booking.id);
    context.insert("booking_link", &booking_link);

    let html = state.templates.render(template, &context).map_err(|e| {
        error!("Tera render error: {:?}", e);
        AppError::InternalWithMsg(format!("Tera render error: {:?}", e))
    })?;
    let subject = format!("{}: {}", subject_prefix, chalet.name);

    info!("Sending {} email to {}", job.job_type, booking.guest_email);
    state.email_service.send(&booking.guest_email, &subject, &html).await
}
