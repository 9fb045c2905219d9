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
use crate::{db::DbPool, entities::customer, errors::ServiceError};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewCustomer {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "اسم العميل مطلوب"))]
    pub name: String,
    #[validate(email(message = "البريد الإلكتروني غير صالح"))]
    pub email: Option<String>,
    #[validate(length(max = 20, message = "رقم الهاتف طويل جداً"))]
    pub phone: Option<String>,
}

impl NewCustomer {
    pub fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: non_empty(self.email),
            phone: non_empty(self.phone),
        }
    }
}

/// Inserts a customer without validation; used by the web service and the seeder.
pub async fn insert<C: ConnectionTrait>(
    db: &C,
    input: &NewCustomer,
) -> Result<customer::Model, sea_orm::DbErr> {
    customer::ActiveModel {
        name: Set(input.name.clone()),
        email: Set(input.email.clone()),
        phone: Set(input.phone.clone()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn find_by_name<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> Result<Option<customer::Model>, sea_orm::DbErr> {
    customer::Entity::find()
        .filter(customer::Column::Name.eq(name))
        .one(db)
        .await
}

/// Service for managing customers
#[derive(Clone)]
pub struct CustomerService {
    db_pool: Arc<DbPool>,
}

impl CustomerService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Creates a customer; a duplicate email is a conflict
    #[instrument(skip(self))]
    pub async fn create(&self, input: NewCustomer) -> Result<customer::Model, ServiceError> {
        let input = input.normalized();
        validate(&input)?;
        let db = &*self.db_pool;

        if let Some(email) = &input.email {
            let taken = customer::Entity::find()
                .filter(customer::Column::Email.eq(email.as_str()))
                .one(db)
                .await?;
            if taken.is_some() {
                return Err(ServiceError::Conflict(
                    "البريد الإلكتروني مستخدم لعميل آخر".to_string(),
                ));
            }
        }

        let created = insert(db, &input).await?;
        info!(customer_id = created.id, "customer created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: i32) -> Result<customer::Model, ServiceError> {
        customer::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("customer {} not found", id)))
    }

    /// All customers ordered by name, for tables and select boxes
    pub async fn all(&self) -> Result<Vec<customer::Model>, ServiceError> {
        Ok(customer::Entity::find()
            .order_by_asc(customer::Column::Name)
            .all(&*self.db_pool)
            .await?)
    }

    pub async fn list(&self, page: u64, per_page: u64) -> Result<Page<customer::Model>, ServiceError> {
        let paginator = customer::Entity::find()
            .order_by_desc(customer::Column::Id)
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
        Ok(customer::Entity::find().count(&*self.db_pool).await?)
    }
}
