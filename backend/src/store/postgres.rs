//! PostgreSQL JSONB document store

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{types::Json, PgPool};

use super::{DocumentStore, StoreError};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(Clone)]
pub struct PgDocumentStore {
    db: PgPool,
}

impl PgDocumentStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create the document table if it does not exist yet
    pub async fn migrate(&self) -> Result<(), StoreError> {
        MIGRATOR.run(&self.db).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, id: &str) -> Result<Option<Value>, StoreError> {
        let document = sqlx::query_scalar::<_, Json<Value>>(
            r#"
            SELECT document
            FROM district_data
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(document.map(|Json(value)| value))
    }

    async fn put(&self, id: &str, document: &Value) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO district_data (id, document, updated_at)
            VALUES ($1, $2, now())
            ON CONFLICT (id) DO UPDATE
            SET document = EXCLUDED.document, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(id)
        .bind(Json(document))
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}
