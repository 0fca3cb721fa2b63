// Handler modules
pub mod analyze;
pub mod filters;

// Re-export all handler functions
pub use analyze::handle_analyze;
pub use filters::handle_filters;
