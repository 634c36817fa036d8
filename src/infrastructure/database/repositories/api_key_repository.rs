//! SeaORM implementation of ApiKeyRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use sea_orm::prelude::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr, Statement,
};

use crate::domain::{ApiKey, ApiKeyRepository, DomainError, DomainResult, NewApiKey};
use crate::infrastructure::database::entities::api_key;

pub struct SeaOrmApiKeyRepository {
    db: DatabaseConnection,
}

impl SeaOrmApiKeyRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn db_err(e: sea_orm::DbErr) -> DomainError {
    DomainError::Database(e.to_string())
}

#[async_trait]
impl ApiKeyRepository for SeaOrmApiKeyRepository {
    async fn list(&self) -> DomainResult<Vec<ApiKey>> {
        let keys = api_key::Entity::find()
            .order_by_desc(api_key::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(keys.into_iter().map(ApiKey::from).collect())
    }

    async fn find_by_key(&self, key: &str) -> DomainResult<Option<ApiKey>> {
        let found = api_key::Entity::find()
            .filter(api_key::Column::Key.eq(key))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(found.map(ApiKey::from))
    }

    async fn insert(&self, new_key: NewApiKey) -> DomainResult<ApiKey> {
        let model = api_key::ActiveModel {
            id: Set(uuid::Uuid::new_v4().to_string()),
            name: Set(new_key.name),
            key: Set(new_key.key),
            created_at: Set(new_key.created_at),
            last_used: Set(None),
        };

        match model.insert(&self.db).await {
            Ok(created) => Ok(created.into()),
            Err(e) => match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(detail)) => {
                    debug!("api_keys unique violation: {}", detail);
                    Err(DomainError::Conflict("API key token".to_string()))
                }
                _ => Err(db_err(e)),
            },
        }
    }

    async fn rename(&self, id: &str, name: &str) -> DomainResult<Option<ApiKey>> {
        let result = api_key::Entity::update_many()
            .col_expr(api_key::Column::Name, Expr::value(name))
            .filter(api_key::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            debug!("ApiKey '{}' not found for rename", id);
            return Ok(None);
        }

        // A delete racing this read leaves nothing to return
        let renamed = api_key::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(renamed.map(ApiKey::from))
    }

    async fn touch_last_used(&self, id: &str, at: DateTime<Utc>) -> DomainResult<()> {
        api_key::Entity::update_many()
            .col_expr(api_key::Column::LastUsed, Expr::value(at))
            .filter(api_key::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> DomainResult<bool> {
        let result = api_key::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected > 0)
    }

    async fn ping(&self) -> DomainResult<()> {
        self.db
            .execute(Statement::from_string(
                self.db.get_database_backend(),
                "SELECT 1".to_string(),
            ))
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
