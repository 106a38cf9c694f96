pub mod events;
pub mod manager;
pub mod memory;
pub mod postgres;
pub mod store;

pub use events::{EventSink, RegistryEvent};
pub use manager::{Isolation, RegistryError, TenantConnection, TenantRegistry};
pub use store::{Collection, Connection, Document, FindOptions, StoreConnector, StoreError, WriteOptions};
