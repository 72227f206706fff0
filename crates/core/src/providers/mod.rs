pub mod payload;
pub mod registry;
pub mod traits;

// API provider implementations
pub mod goldapi;
pub mod metals_dev;
