//! Data access adapters.
//!
//! Adapters speak SeaORM directly and return `sea_orm::DbErr`; the repos
//! layer above them translates into `DomainError`.

pub mod match_locks_sea;
pub mod matches_sea;
pub mod users_sea;
