//! User repository functions for the domain layer.

use sea_orm::ConnectionTrait;

use crate::adapters::users_sea as users_adapter;
use crate::entities::users;
use crate::errors::domain::{DomainError, NotFoundKind};

/// User domain model.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub sub: String,
    pub username: String,
    pub created_at: time::OffsetDateTime,
    pub updated_at: time::OffsetDateTime,
}

impl From<users::Model> for User {
    fn from(m: users::Model) -> Self {
        Self {
            id: m.id,
            sub: m.sub,
            username: m.username,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

pub async fn find_by_id<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    id: i64,
) -> Result<Option<User>, DomainError> {
    let user = users_adapter::find_by_id(conn, id).await?;
    Ok(user.map(User::from))
}

/// Find user by ID or return a NotFound domain error.
pub async fn require_user<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    id: i64,
) -> Result<User, DomainError> {
    let user = users_adapter::find_by_id(conn, id).await?;
    user.map(User::from).ok_or_else(|| {
        DomainError::not_found(NotFoundKind::User, format!("User {id} not found"))
    })
}

pub async fn find_by_sub<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    sub: &str,
) -> Result<Option<User>, DomainError> {
    let user = users_adapter::find_by_sub(conn, sub).await?;
    Ok(user.map(User::from))
}

pub async fn insert_user<C: ConnectionTrait + Send + Sync>(
    conn: &C,
    sub: &str,
    username: &str,
) -> Result<User, DomainError> {
    let user = users_adapter::insert_user(conn, sub, username).await?;
    Ok(User::from(user))
}
