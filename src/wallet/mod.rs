pub mod balance;
pub mod selection;
pub mod sync;
pub mod types;

pub use sync::SyncCoordinator;
pub use types::*;
