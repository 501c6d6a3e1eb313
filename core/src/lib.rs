pub mod codec;
pub mod error;
mod integrity;
pub mod models;
pub mod persist;
pub mod recovery;
pub mod store;
