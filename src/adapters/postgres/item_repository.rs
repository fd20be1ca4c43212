use crate::domain::{Item, ItemId, ItemStatus, UserId};
use crate::ports::item_repository::{ItemRepository as ItemRepositoryTrait, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use std::str::FromStr;

use super::invalid_data;

/// PostgreSQLの行データをItemに変換する
fn map_row_to_item(row: &PgRow) -> Result<Item> {
    let status_str: &str = row.get("status");
    let status = ItemStatus::from_str(status_str).map_err(invalid_data)?;

    Ok(Item {
        item_id: ItemId::from_uuid(row.get("id")),
        owner_id: UserId::new(row.get::<String, _>("owner_id")),
        title: row.get("title"),
        description: row.get("description"),
        category: row.get("category"),
        image_url: row.get("image_url"),
        requires_approval: row.get("requires_approval"),
        status,
        is_listed: row.get("is_listed"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// ItemRepositoryのPostgreSQL実装
pub struct ItemRepository {
    pool: PgPool,
}

impl ItemRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemRepositoryTrait for ItemRepository {
    async fn insert(&self, item: &Item) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO items (
                id,
                owner_id,
                title,
                description,
                category,
                image_url,
                requires_approval,
                status,
                is_listed,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(item.item_id.value())
        .bind(item.owner_id.as_str())
        .bind(&item.title)
        .bind(&item.description)
        .bind(&item.category)
        .bind(&item.image_url)
        .bind(item.requires_approval)
        .bind(item.status.as_str())
        .bind(item.is_listed)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// 所有者は変更しない
    async fn update(&self, item: &Item) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE items
            SET
                title = $2,
                description = $3,
                category = $4,
                image_url = $5,
                requires_approval = $6,
                status = $7,
                is_listed = $8,
                updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(item.item_id.value())
        .bind(&item.title)
        .bind(&item.description)
        .bind(&item.category)
        .bind(&item.image_url)
        .bind(item.requires_approval)
        .bind(item.status.as_str())
        .bind(item.is_listed)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn get_by_id(&self, item_id: ItemId) -> Result<Option<Item>> {
        let row = sqlx::query(
            r#"
            SELECT
                id,
                owner_id,
                title,
                description,
                category,
                image_url,
                requires_approval,
                status,
                is_listed,
                created_at,
                updated_at
            FROM items
            WHERE id = $1
            "#,
        )
        .bind(item_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_item).transpose()
    }

    /// 部分インデックス（is_listed）を使用
    async fn find_listed(&self) -> Result<Vec<Item>> {
        let rows = sqlx::query(
            r#"
            SELECT
                id,
                owner_id,
                title,
                description,
                category,
                image_url,
                requires_approval,
                status,
                is_listed,
                created_at,
                updated_at
            FROM items
            WHERE is_listed
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_item).collect()
    }

    async fn find_by_owner(&self, owner_id: &UserId) -> Result<Vec<Item>> {
        let rows = sqlx::query(
            r#"
            SELECT
                id,
                owner_id,
                title,
                description,
                category,
                image_url,
                requires_approval,
                status,
                is_listed,
                created_at,
                updated_at
            FROM items
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_item).collect()
    }
}
