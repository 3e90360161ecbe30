pub mod prelude;

pub mod game_state;
pub mod participants;
pub mod questions;
pub mod responses;
