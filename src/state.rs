use std::sync::Arc;
use crate::domain::ports::{
    BookingRepository, ChaletRepository, DiscountRepository, EmailService, GroupRepository,
    JobRepository, ReviewRepository,
};
use crate::domain::services::{
    availability::AvailabilityService, booking_service::BookingService, discount::DiscountService,
    rewards::RewardService,
};
use crate::config::Config;
use tera::Tera;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub chalet_repo: Arc<dyn ChaletRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub group_repo: Arc<dyn GroupRepository>,
    pub discount_repo: Arc<dyn DiscountRepository>,
    pub review_repo: Arc<dyn ReviewRepository>,
    pub job_repo: Arc<dyn JobRepository>,
    pub availability_service: Arc<AvailabilityService>,
    pub booking_service: Arc<BookingService>,
    pub discount_service: Arc<DiscountService>,
    pub reward_service: Arc<RewardService>,
    pub email_service: Arc<dyn EmailService>,
    pub templates: Arc<Tera>,
}

/// Repository handles for one backend, before services are wired on top.
pub struct Repositories {
    pub chalet_repo: Arc<dyn ChaletRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub group_repo: Arc<dyn GroupRepository>,
    pub discount_repo: Arc<dyn DiscountRepository>,
    pub review_repo: Arc<dyn ReviewRepository>,
    pub job_repo: Arc<dyn JobRepository>,
}

impl AppState {
    pub fn new(
        config: Config,
        repos: Repositories,
        email_service: Arc<dyn EmailService>,
        templates: Arc<Tera>,
    ) -> Self {
        let availability_service = Arc::new(AvailabilityService::new(
            repos.booking_repo.clone(),
            repos.chalet_repo.clone(),
        ));
        let discount_service = Arc::new(DiscountService::new(repos.discount_repo.clone()));
        let booking_service = Arc::new(BookingService::new(
            repos.booking_repo.clone(),
            repos.job_repo.clone(),
            availability_service.clone(),
            discount_service.clone(),
        ));
        let reward_service = Arc::new(RewardService::new(
            repos.group_repo.clone(),
            repos.review_repo.clone(),
            repos.chalet_repo.clone(),
            discount_service.clone(),
            config.zad_window_days,
        ));

        Self {
            config,
            chalet_repo: repos.chalet_repo,
            booking_repo: repos.booking_repo,
            group_repo: repos.group_repo,
            discount_repo: repos.discount_repo,
            review_repo: repos.review_repo,
            job_repo: repos.job_repo,
            availability_service,
            booking_service,
            discount_service,
            reward_service,
            email_service,
            templates,
        }
    }
}
