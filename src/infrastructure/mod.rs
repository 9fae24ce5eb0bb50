pub mod config;
pub mod identity;
pub mod memory_store;
pub mod postgres_store;
pub mod store;

pub use self::config::*;
pub use self::identity::*;
pub use self::memory_store::*;
pub use self::postgres_store::*;
pub use self::store::*;
