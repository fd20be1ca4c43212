pub mod item_repository;
pub mod reservation_repository;

// パブリックに型を再エクスポート
pub use item_repository::ItemRepository as PostgresItemRepository;
pub use reservation_repository::ReservationRepository as PostgresReservationRepository;

/// 行データの変換失敗をリポジトリのエラー型に包む
pub(crate) fn invalid_data(message: impl Into<String>) -> Box<dyn std::error::Error + Send + Sync> {
    Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        message.into(),
    ))
}
