use crate::domain::{Item, ItemId, UserId};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// アイテムリポジトリポート
///
/// アイテムは削除されない。掲載の停止は`is_listed`で表現する。
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// 新しいアイテムを保存する
    async fn insert(&self, item: &Item) -> Result<()>;

    /// アイテムを更新する
    ///
    /// 対象が存在しない場合は`false`を返す。
    async fn update(&self, item: &Item) -> Result<bool>;

    /// IDでアイテムを取得する
    async fn get_by_id(&self, item_id: ItemId) -> Result<Option<Item>>;

    /// 掲載中のアイテムを新しい順に取得する
    async fn find_listed(&self) -> Result<Vec<Item>>;

    /// 所有者のアイテムを新しい順に取得する
    async fn find_by_owner(&self, owner_id: &UserId) -> Result<Vec<Item>>;
}
