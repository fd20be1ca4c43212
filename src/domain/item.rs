use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ItemId, ItemStatus, ItemValidationError, UserId};

/// タイトルの最大文字数
pub const MAX_TITLE_LENGTH: usize = 256;

/// カテゴリの最大文字数
pub const MAX_CATEGORY_LENGTH: usize = 100;

/// Item集約 - 所有者が出品する1つの物品
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub item_id: ItemId,
    pub owner_id: UserId,

    pub title: String,
    pub description: String,
    /// カンマ区切りのタグ
    pub category: Option<String>,
    pub image_url: Option<String>,

    pub requires_approval: bool,
    /// 所有者が設定する粗いステータス（今日の予約状況は含まない）
    pub status: ItemStatus,
    pub is_listed: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// カテゴリをタグに分解する
    pub fn tags(&self) -> Vec<&str> {
        self.category
            .as_deref()
            .map(|category| {
                category
                    .split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.owner_id == user_id
    }
}

/// 出品時の入力
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct NewItem {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub requires_approval: Option<bool>,
    pub status: Option<ItemStatus>,
}

/// 所有者による部分更新
///
/// `Some(None)` は値の消去を表す（category, image_url）。
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ItemUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
    pub requires_approval: Option<bool>,
    pub status: Option<ItemStatus>,
    pub is_listed: Option<bool>,
}

fn validate_title(title: &str) -> Result<(), ItemValidationError> {
    if title.trim().is_empty() {
        return Err(ItemValidationError::EmptyTitle);
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ItemValidationError::TitleTooLong {
            max: MAX_TITLE_LENGTH,
        });
    }
    Ok(())
}

fn validate_category(category: Option<&str>) -> Result<(), ItemValidationError> {
    match category {
        Some(c) if c.chars().count() > MAX_CATEGORY_LENGTH => {
            Err(ItemValidationError::CategoryTooLong {
                max: MAX_CATEGORY_LENGTH,
            })
        }
        _ => Ok(()),
    }
}

/// 空文字列はURLなしとして扱う
fn normalize_image_url(url: Option<String>) -> Result<Option<String>, ItemValidationError> {
    match url {
        None => Ok(None),
        Some(u) if u.trim().is_empty() => Ok(None),
        Some(u) if u.starts_with("http://") || u.starts_with("https://") => Ok(Some(u)),
        Some(_) => Err(ItemValidationError::InvalidImageUrl),
    }
}

/// 純粋関数：アイテムを出品する
///
/// デフォルト：承認必要、available、掲載中
pub fn create_item(
    owner_id: UserId,
    input: NewItem,
    now: DateTime<Utc>,
) -> Result<Item, ItemValidationError> {
    validate_title(&input.title)?;
    validate_category(input.category.as_deref())?;
    let image_url = normalize_image_url(input.image_url)?;

    Ok(Item {
        item_id: ItemId::new(),
        owner_id,
        title: input.title,
        description: input.description,
        category: input.category.filter(|c| !c.trim().is_empty()),
        image_url,
        requires_approval: input.requires_approval.unwrap_or(true),
        status: input.status.unwrap_or(ItemStatus::Available),
        is_listed: true,
        created_at: now,
        updated_at: now,
    })
}

/// 純粋関数：アイテムを部分更新する
///
/// 所有者確認は呼び出し側の責務。
pub fn update_item(
    item: &Item,
    update: ItemUpdate,
    now: DateTime<Utc>,
) -> Result<Item, ItemValidationError> {
    if let Some(title) = &update.title {
        validate_title(title)?;
    }
    if let Some(category) = &update.category {
        validate_category(category.as_deref())?;
    }
    let image_url = match update.image_url {
        Some(url) => normalize_image_url(url)?,
        None => item.image_url.clone(),
    };

    Ok(Item {
        title: update.title.unwrap_or_else(|| item.title.clone()),
        description: update
            .description
            .unwrap_or_else(|| item.description.clone()),
        category: update
            .category
            .unwrap_or_else(|| item.category.clone())
            .filter(|c| !c.trim().is_empty()),
        image_url,
        requires_approval: update.requires_approval.unwrap_or(item.requires_approval),
        status: update.status.unwrap_or(item.status),
        is_listed: update.is_listed.unwrap_or(item.is_listed),
        updated_at: now,
        ..item.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_item(title: &str) -> NewItem {
        NewItem {
            title: title.to_string(),
            description: "A sturdy drill".to_string(),
            ..NewItem::default()
        }
    }

    #[test]
    fn test_create_item_defaults() {
        let now = Utc::now();
        let item = create_item(UserId::new("owner"), new_item("Drill"), now).unwrap();

        assert!(item.requires_approval);
        assert_eq!(item.status, ItemStatus::Available);
        assert!(item.is_listed);
        assert_eq!(item.created_at, now);
        assert!(item.is_owned_by(&UserId::new("owner")));
    }

    #[test]
    fn test_create_item_rejects_long_title() {
        let title = "x".repeat(MAX_TITLE_LENGTH + 1);
        let result = create_item(UserId::new("owner"), new_item(&title), Utc::now());
        assert_eq!(
            result.unwrap_err(),
            ItemValidationError::TitleTooLong {
                max: MAX_TITLE_LENGTH
            }
        );
    }

    #[test]
    fn test_create_item_image_url_rules() {
        let mut input = new_item("Drill");
        input.image_url = Some(String::new());
        let item = create_item(UserId::new("owner"), input, Utc::now()).unwrap();
        assert_eq!(item.image_url, None);

        let mut input = new_item("Drill");
        input.image_url = Some("ftp://example.com/a.png".to_string());
        assert_eq!(
            create_item(UserId::new("owner"), input, Utc::now()).unwrap_err(),
            ItemValidationError::InvalidImageUrl
        );
    }

    #[test]
    fn test_tags_split_category() {
        let mut input = new_item("Tent");
        input.category = Some("camping, outdoor,,  family ".to_string());
        let item = create_item(UserId::new("owner"), input, Utc::now()).unwrap();
        assert_eq!(item.tags(), vec!["camping", "outdoor", "family"]);
    }

    #[test]
    fn test_update_item_toggles_listing_and_status() {
        let created_at = Utc::now();
        let item = create_item(UserId::new("owner"), new_item("Drill"), created_at).unwrap();
        let later = created_at + chrono::Duration::minutes(5);

        let updated = update_item(
            &item,
            ItemUpdate {
                is_listed: Some(false),
                status: Some(ItemStatus::Unavailable),
                ..ItemUpdate::default()
            },
            later,
        )
        .unwrap();

        assert!(!updated.is_listed);
        assert_eq!(updated.status, ItemStatus::Unavailable);
        assert_eq!(updated.title, "Drill");
        assert_eq!(updated.created_at, created_at);
        assert_eq!(updated.updated_at, later);
    }

    #[test]
    fn test_update_item_clears_category() {
        let mut input = new_item("Drill");
        input.category = Some("tools".to_string());
        let item = create_item(UserId::new("owner"), input, Utc::now()).unwrap();

        let updated = update_item(
            &item,
            ItemUpdate {
                category: Some(None),
                ..ItemUpdate::default()
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(updated.category, None);
    }
}
