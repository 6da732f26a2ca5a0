pub mod sqlite_booking_repo;
pub mod sqlite_chalet_repo;
pub mod sqlite_discount_repo;
pub mod sqlite_group_repo;
pub mod sqlite_job_repo;
pub mod sqlite_review_repo;

pub mod postgres_booking_repo;
pub mod postgres_chalet_repo;
pub mod postgres_discount_repo;
pub mod postgres_group_repo;
pub mod postgres_job_repo;
pub mod postgres_review_repo;
