pub mod errors;
pub mod messages;
pub mod question;
pub mod records;
pub mod state;

// Re-export all types
pub use errors::*;
pub use messages::*;
pub use question::*;
pub use records::*;
pub use state::*;
