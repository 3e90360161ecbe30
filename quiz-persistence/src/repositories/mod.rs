pub mod participant_repository;
pub mod question_repository;
pub mod response_repository;
pub mod state_repository;

pub use participant_repository::ParticipantRepository;
pub use question_repository::QuestionRepository;
pub use response_repository::ResponseRepository;
pub use state_repository::{GameStateRepository, SwapResult};
