pub mod clock;
pub mod item_repository;
pub mod reservation_repository;

pub use clock::Clock;
pub use item_repository::ItemRepository;
pub use reservation_repository::{ReservationRepository, ReserveOutcome};
