pub mod quiz_api;

pub use quiz_api::QuizApiClient;
