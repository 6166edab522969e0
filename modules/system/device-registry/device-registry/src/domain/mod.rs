pub mod credentials;
pub mod device_store;
pub mod error;
pub mod service;
