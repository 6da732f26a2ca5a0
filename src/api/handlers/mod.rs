pub mod booking;
pub mod chalet;
pub mod discount;
pub mod health;
pub mod payment;
pub mod reward;
