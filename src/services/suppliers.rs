use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::Deserialize;
use tracing::{info, instrument};
use validator::Validate;

use super::{non_empty, validate, Page};
use crate::{db::DbPool, entities::supplier, errors::ServiceError};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewSupplier {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "اسم المورد مطلوب"))]
    pub name: String,
    #[validate(length(max = 200, message = "بيانات الاتصال طويلة جداً"))]
    pub contact_info: Option<String>,
}

impl NewSupplier {
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            contact_info: non_empty(self.contact_info),
        }
    }
}

pub async fn insert<C: ConnectionTrait>(
    db: &C,
    input: &NewSupplier,
) -> Result<supplier::Model, sea_orm::DbErr> {
    supplier::ActiveModel {
        name: Set(input.name.clone()),
        contact_info: Set(input.contact_info.clone()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn find_by_name<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> Result<Option<supplier::Model>, sea_orm::DbErr> {
    supplier::Entity::find()
        .filter(supplier::Column::Name.eq(name))
        .one(db)
        .await
}

/// Service for managing suppliers
#[derive(Clone)]
pub struct SupplierService {
    db_pool: Arc<DbPool>,
}

impl SupplierService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: NewSupplier) -> Result<supplier::Model, ServiceError> {
        let input = input.normalized();
        validate(&input)?;
        let created = insert(&*self.db_pool, &input).await?;
        info!(supplier_id = created.id, "supplier created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<supplier::Model, ServiceError> {
        supplier::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("supplier {} not found", id)))
    }

    pub async fn all(&self) -> Result<Vec<supplier::Model>, ServiceError> {
        Ok(supplier::Entity::find()
            .order_by_asc(supplier::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn list(&self, page: u64, per_page: u64) -> Result<Page<supplier::Model>, ServiceError> {
        let paginator = supplier::Entity::find()
            .order_by_desc(supplier::Column::Id)
            .paginate(&*self.db_pool, per_page.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok(Page {
            items,
            total,
            page,
            per_page,
        })
    }

    pub async fn count(&self) -> Result<u64, ServiceError> {
        Ok(supplier::Entity::find().count(&*self.db_pool).await?)
    }
}
