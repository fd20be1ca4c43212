use crate::domain::{Item, ItemId, UserId};
use crate::ports::item_repository::{ItemRepository, Result};
use async_trait::async_trait;

use super::InMemoryStore;

/// ItemRepositoryのインメモリ実装
#[derive(Debug, Clone)]
pub struct InMemoryItemRepository {
    store: InMemoryStore,
}

impl InMemoryItemRepository {
    pub fn new(store: InMemoryStore) -> Self {
        Self { store }
    }
}

fn newest_first(mut items: Vec<Item>) -> Vec<Item> {
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    items
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn insert(&self, item: &Item) -> Result<()> {
        let mut tables = self.store.lock().await;
        if tables.items.contains_key(&item.item_id) {
            return Err(format!("item {} already exists", item.item_id.value()).into());
        }
        tables.items.insert(item.item_id, item.clone());
        Ok(())
    }

    async fn update(&self, item: &Item) -> Result<bool> {
        let mut tables = self.store.lock().await;
        match tables.items.get_mut(&item.item_id) {
            Some(stored) => {
                // 所有者と作成日時は変更しない
                let owner_id = stored.owner_id.clone();
                let created_at = stored.created_at;
                *stored = Item {
                    owner_id,
                    created_at,
                    ..item.clone()
                };
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_by_id(&self, item_id: ItemId) -> Result<Option<Item>> {
        let tables = self.store.lock().await;
        Ok(tables.items.get(&item_id).cloned())
    }

    async fn find_listed(&self) -> Result<Vec<Item>> {
        let tables = self.store.lock().await;
        Ok(newest_first(
            tables
                .items
                .values()
                .filter(|item| item.is_listed)
                .cloned()
                .collect(),
        ))
    }

    async fn find_by_owner(&self, owner_id: &UserId) -> Result<Vec<Item>> {
        let tables = self.store.lock().await;
        Ok(newest_first(
            tables
                .items
                .values()
                .filter(|item| item.is_owned_by(owner_id))
                .cloned()
                .collect(),
        ))
    }
}
