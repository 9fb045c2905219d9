use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use tracing::{info, instrument, warn};

use crate::{
    auth::{hash_password, verify_password},
    entities::user,
    errors::ServiceError,
};

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
pub const DEFAULT_ADMIN_FULL_NAME: &str = "مدير النظام";

pub async fn find_by_username<C: ConnectionTrait>(
    db: &C,
    username: &str,
) -> Result<Option<user::Model>, ServiceError> {
    Ok(user::Entity::find()
        .filter(user::Column::Username.eq(username))
        .one(db)
        .await?)
}

pub async fn create_user<C: ConnectionTrait>(
    db: &C,
    username: &str,
    password: &str,
    full_name: &str,
) -> Result<user::Model, ServiceError> {
    let password_hash =
        hash_password(password).map_err(|e| ServiceError::HashError(e.to_string()))?;

    Ok(user::ActiveModel {
        username: Set(username.to_string()),
        password_hash: Set(password_hash),
        full_name: Set(full_name.to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?)
}

/// Creates the default administrator when it does not exist yet.
///
/// Returns `true` when a user was created.
#[instrument(skip(db))]
pub async fn ensure_default_admin<C: ConnectionTrait>(db: &C) -> Result<bool, ServiceError> {
    if find_by_username(db, DEFAULT_ADMIN_USERNAME).await?.is_some() {
        return Ok(false);
    }

    create_user(
        db,
        DEFAULT_ADMIN_USERNAME,
        DEFAULT_ADMIN_PASSWORD,
        DEFAULT_ADMIN_FULL_NAME,
    )
    .await?;
    info!(username = DEFAULT_ADMIN_USERNAME, "default administrator created");
    Ok(true)
}

/// Checks a username/password pair; `None` means the credentials are wrong
#[instrument(skip(db, password))]
pub async fn authenticate<C: ConnectionTrait>(
    db: &C,
    username: &str,
    password: &str,
) -> Result<Option<user::Model>, ServiceError> {
    let Some(found) = find_by_username(db, username.trim()).await? else {
        return Ok(None);
    };

    match verify_password(password, &found.password_hash) {
        Ok(true) => Ok(Some(found)),
        Ok(false) => Ok(None),
        Err(e) => {
            warn!(user_id = found.id, error = %e, "stored password hash is unreadable");
            Ok(None)
        }
    }
}
