pub use super::game_state::Entity as GameStates;
pub use super::participants::Entity as Participants;
pub use super::questions::Entity as Questions;
pub use super::responses::Entity as Responses;
