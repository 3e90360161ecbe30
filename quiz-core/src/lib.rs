pub mod catalog;
pub mod errors;
pub mod host;
pub mod memory_store;
pub mod player;
pub mod scoring;
pub mod store;
pub mod transitions;

// Re-export main components
pub use catalog::*;
pub use errors::*;
pub use host::*;
pub use memory_store::*;
pub use player::*;
pub use scoring::*;
pub use store::*;
pub use transitions::{HostAction, next_index};
