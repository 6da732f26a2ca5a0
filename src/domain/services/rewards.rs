use std::sync::Arc;
use chrono::{Days, NaiveDate, Utc};
use serde::Serialize;
use tracing::info;

use crate::domain::models::{
    booking::{parse_stored_status, BookingStatus},
    discount::{Discount, DiscountType},
    group::MemberStay,
    identity::Identity,
    review::{Review, SubmittedReview, MAX_COMMENT_LEN},
};
use crate::domain::ports::{ChaletRepository, GroupRepository, ReviewRepository};
use crate::domain::services::discount::DiscountService;
use crate::error::AppError;

/// Golden Card phase. Derived on every read, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RewardPhase {
    Locked,
    Waiting,
    Zad,
    Chilling,
    Passed,
}

/// Everything the phase depends on, for one traveler and one stay.
#[derive(Debug, Clone, Copy)]
pub struct PhaseInput {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: BookingStatus,
    pub has_rated: bool,
    pub can_use_kaif: bool,
    /// An earlier completed stay still waits for its review.
    pub outstanding_review: bool,
}

impl PhaseInput {
    fn from_stay(stay: &MemberStay, outstanding_review: bool) -> Self {
        Self {
            start_date: stay.start_date,
            end_date: stay.end_date,
            status: parse_stored_status(&stay.status, &stay.booking_id),
            has_rated: stay.has_rated,
            can_use_kaif: stay.can_use_kaif,
            outstanding_review,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RewardState {
    pub phase: RewardPhase,
    pub zad_unlocked: bool,
    pub kaif_unlocked: bool,
    pub rate_prompt: bool,
}

/// The single place reward phases are computed.
pub fn derive_reward_state(today: NaiveDate, input: &PhaseInput, zad_window_days: u32) -> RewardState {
    let zad_opens = input.start_date
        .checked_sub_days(Days::new(u64::from(zad_window_days)))
        .unwrap_or(NaiveDate::MIN);
    let phase = match input.status {
        BookingStatus::Confirmed if today >= input.end_date => RewardPhase::Passed,
        BookingStatus::Cancelled | BookingStatus::Rejected => RewardPhase::Locked,
        _ if today >= input.end_date => RewardPhase::Locked,
        _ if input.outstanding_review => RewardPhase::Locked,
        _ if today >= input.start_date => RewardPhase::Chilling,
        _ if today >= zad_opens => RewardPhase::Zad,
        _ => RewardPhase::Waiting,
    };

    let zad_unlocked = matches!(phase, RewardPhase::Zad | RewardPhase::Chilling | RewardPhase::Passed);
    let kaif_unlocked = phase != RewardPhase::Locked && input.has_rated && input.can_use_kaif;
    let rate_prompt = phase == RewardPhase::Passed && !input.has_rated;

    RewardState { phase, zad_unlocked, kaif_unlocked, rate_prompt }
}

fn is_unrated_completed(stay: &MemberStay, today: NaiveDate) -> bool {
    stay.status == BookingStatus::Confirmed.as_str() && stay.end_date <= today && !stay.has_rated
}

/// Whether any stay other than `current` is completed and still unrated.
fn has_outstanding_review(stays: &[MemberStay], current: &MemberStay, today: NaiveDate) -> bool {
    if current.end_date <= today {
        return false;
    }
    stays.iter()
        .filter(|s| s.group_id != current.group_id)
        .any(|s| is_unrated_completed(s, today))
}

/// Current or next confirmed stay, else the most recently finished one.
fn pick_relevant_stay(stays: &[MemberStay], today: NaiveDate) -> Option<&MemberStay> {
    let confirmed = || stays.iter().filter(|s| s.status == BookingStatus::Confirmed.as_str());
    confirmed()
        .filter(|s| s.end_date > today)
        .min_by_key(|s| s.start_date)
        .or_else(|| confirmed().max_by_key(|s| s.end_date))
}

#[derive(Debug, Serialize)]
pub struct RewardCard {
    pub group_id: String,
    pub booking_id: String,
    pub chalet_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub has_rated: bool,
    pub can_use_kaif: bool,
    #[serde(flatten)]
    pub state: RewardState,
    pub zad_offers: Vec<Discount>,
    pub kaif_offers: Vec<Discount>,
}

pub struct SubmitReview {
    pub chalet_id: String,
    pub rating: i32,
    pub comment: String,
    pub group_id: Option<String>,
}

pub struct RewardService {
    group_repo: Arc<dyn GroupRepository>,
    review_repo: Arc<dyn ReviewRepository>,
    chalet_repo: Arc<dyn ChaletRepository>,
    discounts: Arc<DiscountService>,
    zad_window_days: u32,
}

impl RewardService {
    pub fn new(
        group_repo: Arc<dyn GroupRepository>,
        review_repo: Arc<dyn ReviewRepository>,
        chalet_repo: Arc<dyn ChaletRepository>,
        discounts: Arc<DiscountService>,
        zad_window_days: u32,
    ) -> Self {
        Self { group_repo, review_repo, chalet_repo, discounts, zad_window_days }
    }

    pub async fn card_for_traveler(&self, actor: &Identity) -> Result<RewardCard, AppError> {
        let today = Utc::now().date_naive();
        let stays = self.group_repo.list_stays_for_user(&actor.user_id).await?;
        let stay = pick_relevant_stay(&stays, today)
            .ok_or(AppError::NotFound("No stay found for this traveler".into()))?;
        let outstanding = has_outstanding_review(&stays, stay, today);
        self.build_card(stay, outstanding, today).await
    }

    pub async fn card_for_group(&self, actor: &Identity, group_id: &str) -> Result<RewardCard, AppError> {
        let today = Utc::now().date_naive();
        let stay = self.find_member_stay(actor, group_id).await?;
        let stays = self.group_repo.list_stays_for_user(&actor.user_id).await?;
        let outstanding = has_outstanding_review(&stays, &stay, today);
        self.build_card(&stay, outstanding, today).await
    }

    async fn find_member_stay(&self, actor: &Identity, group_id: &str) -> Result<MemberStay, AppError> {
        if let Some(stay) = self.group_repo.find_stay(group_id, &actor.user_id).await? {
            return Ok(stay);
        }
        match self.group_repo.find_group(group_id).await? {
            Some(_) => Err(AppError::Forbidden("Not a member of this group".into())),
            None => Err(AppError::NotFound("Group not found".into())),
        }
    }

    async fn build_card(&self, stay: &MemberStay, outstanding: bool, today: NaiveDate) -> Result<RewardCard, AppError> {
        let state = derive_reward_state(today, &PhaseInput::from_stay(stay, outstanding), self.zad_window_days);

        let zad_offers = if state.zad_unlocked { self.discounts.offers(DiscountType::Zad).await? } else { Vec::new() };
        let kaif_offers = if state.kaif_unlocked { self.discounts.offers(DiscountType::Kaif).await? } else { Vec::new() };

        Ok(RewardCard {
            group_id: stay.group_id.clone(),
            booking_id: stay.booking_id.clone(),
            chalet_id: stay.chalet_id.clone(),
            start_date: stay.start_date,
            end_date: stay.end_date,
            has_rated: stay.has_rated,
            can_use_kaif: stay.can_use_kaif,
            state,
            zad_offers,
            kaif_offers,
        })
    }

    /// One review per completed stay; a group review is what unlocks KAIF.
    pub async fn submit_review(&self, actor: &Identity, input: SubmitReview) -> Result<SubmittedReview, AppError> {
        if !(1..=5).contains(&input.rating) {
            return Err(AppError::Validation("Rating must be between 1 and 5".into()));
        }
        let comment = input.comment.trim().to_string();
        if comment.chars().count() > MAX_COMMENT_LEN {
            return Err(AppError::Validation(format!("Comment must be at most {} characters", MAX_COMMENT_LEN)));
        }

        self.chalet_repo.find_by_id(&input.chalet_id).await?
            .ok_or(AppError::NotFound("Chalet not found".into()))?;

        let group_id = input.group_id.filter(|g| !g.is_empty());
        if let Some(group_id) = &group_id {
            let stay = self.find_member_stay(actor, group_id).await?;
            if stay.chalet_id != input.chalet_id {
                return Err(AppError::Validation("This group's booking is for another chalet".into()));
            }
            if !is_unrated_completed(&stay, Utc::now().date_naive()) {
                if stay.has_rated {
                    return Err(AppError::Conflict("This stay has already been reviewed".into()));
                }
                return Err(AppError::Validation("Reviews open once a confirmed stay has ended".into()));
            }
        }

        let review = Review::new(input.chalet_id, actor.user_id.clone(), input.rating, comment, group_id);
        let chalet_rating = self.review_repo.create_with_rating(&review).await?;

        info!(
            review_id = %review.id,
            chalet_id = %review.chalet_id,
            rating = review.rating,
            chalet_rating = chalet_rating.rating,
            "Review submitted"
        );

        Ok(SubmittedReview { review, chalet_rating })
    }

    pub async fn list_reviews(&self, chalet_id: &str) -> Result<Vec<Review>, AppError> {
        self.review_repo.list_by_chalet(chalet_id).await
    }
}
