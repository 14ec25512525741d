/// Operations against the live streaming platform and their HTTP implementation
pub mod api;
/// Stream category taxonomy and its search rules
pub mod catalog;
/// Error types shared by the whole crate
pub mod error;
/// QR login workflow, session credentials and broadcast state
pub mod session;
/// Flat file persistence of sessions, preferences and the category cache
pub mod store;
