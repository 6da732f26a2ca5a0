pub mod booking;
pub mod chalet;
pub mod discount;
pub mod group;
pub mod identity;
pub mod job;
pub mod review;
