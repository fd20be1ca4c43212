mod catalog_service;
mod errors;
mod reservation_service;

pub use catalog_service::{
    ItemWithStatus, effective_status, get_item, list_item, list_items_by_owner,
    list_listed_items, update_item,
};
pub use errors::{ErrorKind, LendingApplicationError, Result};
pub use reservation_service::{
    ServiceDependencies, approve, cancel, create_reservation, current_reservation_for, get_loan,
    list_future_reservations, list_loans_for_borrower, list_loans_for_owner, loan_history,
    mark_as_borrowed, mark_as_returned, reject,
};
