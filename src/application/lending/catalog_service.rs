use crate::domain::{
    self, Item, ItemId, ItemStatus, UserId,
    commands::{ListItem, UpdateItem},
};
use futures::future::try_join_all;
use serde::Serialize;

use super::errors::{LendingApplicationError, Result};
use super::reservation_service::{ServiceDependencies, load_item};

/// 実効ステータス付きのアイテム
///
/// 実効ステータスはリクエストごとに計算し、保存しない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemWithStatus {
    #[serde(flatten)]
    pub item: Item,
    pub effective_status: ItemStatus,
}

/// アイテムの実効ステータスを計算する
///
/// 終端以外の予約を読み込み、注入された時計の「今日」で判定する。
pub async fn effective_status(deps: &ServiceDependencies, item: &Item) -> Result<ItemStatus> {
    let loans = deps
        .reservation_repository
        .find_holding_by_item(item.item_id)
        .await
        .map_err(LendingApplicationError::ReservationRepositoryError)?;

    let bookings: Vec<_> = loans.iter().map(|loan| loan.booking()).collect();

    Ok(domain::effective_status(
        item.status,
        &bookings,
        deps.clock.today(),
    ))
}

async fn with_effective_status(deps: &ServiceDependencies, item: Item) -> Result<ItemWithStatus> {
    let effective_status = effective_status(deps, &item).await?;
    Ok(ItemWithStatus {
        item,
        effective_status,
    })
}

/// アイテムを出品する
#[tracing::instrument(skip(deps))]
pub async fn list_item(deps: &ServiceDependencies, cmd: ListItem) -> Result<Item> {
    let item = domain::item::create_item(cmd.owner_id, cmd.item, deps.clock.now())?;

    deps.item_repository
        .insert(&item)
        .await
        .map_err(LendingApplicationError::ItemRepositoryError)?;

    tracing::info!(item_id = %item.item_id.value(), owner_id = %item.owner_id, "Item listed");

    Ok(item)
}

/// アイテムを更新する（所有者のみ）
///
/// 掲載の切り替え（is_listed）や粗いステータスの変更もここで行う。
#[tracing::instrument(skip(deps))]
pub async fn update_item(deps: &ServiceDependencies, cmd: UpdateItem) -> Result<Item> {
    let item = load_item(deps, cmd.item_id).await?;

    if !item.is_owned_by(&cmd.actor) {
        return Err(LendingApplicationError::Forbidden(
            "You can only update your own items".to_string(),
        ));
    }

    let updated = domain::item::update_item(&item, cmd.update, deps.clock.now())?;

    let found = deps
        .item_repository
        .update(&updated)
        .await
        .map_err(LendingApplicationError::ItemRepositoryError)?;

    if !found {
        return Err(LendingApplicationError::ItemNotFound);
    }

    Ok(updated)
}

/// アイテムを実効ステータス付きで取得する
pub async fn get_item(deps: &ServiceDependencies, item_id: ItemId) -> Result<ItemWithStatus> {
    let item = load_item(deps, item_id).await?;
    with_effective_status(deps, item).await
}

/// 掲載中のアイテム一覧（新しい順）
pub async fn list_listed_items(deps: &ServiceDependencies) -> Result<Vec<ItemWithStatus>> {
    let items = deps
        .item_repository
        .find_listed()
        .await
        .map_err(LendingApplicationError::ItemRepositoryError)?;

    try_join_all(items.into_iter().map(|item| with_effective_status(deps, item))).await
}

/// 所有者のアイテム一覧（新しい順、非掲載を含む）
pub async fn list_items_by_owner(
    deps: &ServiceDependencies,
    owner_id: &UserId,
) -> Result<Vec<ItemWithStatus>> {
    let items = deps
        .item_repository
        .find_by_owner(owner_id)
        .await
        .map_err(LendingApplicationError::ItemRepositoryError)?;

    try_join_all(items.into_iter().map(|item| with_effective_status(deps, item))).await
}
