pub mod authorization;
pub mod availability;
pub mod commands;
pub mod errors;
pub mod events;
pub mod interval;
pub mod item;
pub mod loan;
pub mod value_objects;

pub use authorization::*;
pub use availability::*;
pub use errors::*;
pub use events::*;
pub use interval::*;
pub use item::{Item, ItemUpdate, NewItem};
pub use loan::Loan;
pub use value_objects::*;
