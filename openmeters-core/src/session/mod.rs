pub mod capture_source;
pub mod engine;
pub mod registry;
pub mod stop_signal;
