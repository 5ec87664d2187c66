//! Repository layer - domain models plus free query functions.
//!
//! Repos call adapters and translate `sea_orm::DbErr` into `DomainError`.
//! Services above this layer never see SeaORM entity models.

pub mod locks;
pub mod matches;
pub mod users;
