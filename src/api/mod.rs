pub mod routes;

// Re-export route handlers for convenience
pub use routes::alerts;
pub use routes::app;
pub use routes::fetch;
pub use routes::state;
