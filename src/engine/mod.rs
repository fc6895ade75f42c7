pub mod core;
pub mod errors;
pub mod replay;
pub mod schema;
pub mod sink;
pub mod types;

pub use errors::*;
