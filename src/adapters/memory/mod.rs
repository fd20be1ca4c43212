//! インメモリアダプター
//!
//! データベースなしで動かすためのリポジトリ実装。
//! 2つのリポジトリは同じ`InMemoryStore`を共有し、
//! 1つのロックの下で重複確認と挿入を行う。

pub mod item_repository;
pub mod reservation_repository;

pub use item_repository::InMemoryItemRepository;
pub use reservation_repository::InMemoryReservationRepository;

use crate::domain::{Item, ItemId, Loan, LoanEvent, LoanId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub(crate) items: HashMap<ItemId, Item>,
    pub(crate) loans: HashMap<LoanId, Loan>,
    pub(crate) events: Vec<LoanEvent>,
}

/// 共有ストア
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn item_repository(&self) -> InMemoryItemRepository {
        InMemoryItemRepository::new(self.clone())
    }

    pub fn reservation_repository(&self) -> InMemoryReservationRepository {
        InMemoryReservationRepository::new(self.clone())
    }

    pub(crate) async fn lock(&self) -> tokio::sync::MutexGuard<'_, Tables> {
        self.tables.lock().await
    }
}
