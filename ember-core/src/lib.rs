pub mod clock;
pub mod config;
pub mod error;
pub mod retry;
pub mod store;
pub mod types;
pub mod wal;

pub use config::StoreConfig;
pub use error::{Error, Result};
pub use store::{PasteStore, StoreStatus, Transaction};
pub use types::*;
