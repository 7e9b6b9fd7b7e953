pub mod loaders;
pub mod page;
pub mod password_reset;
pub mod profile;
pub mod quiz;
pub mod result;
pub mod user;

pub use loaders::{load_all_quiz_drafts, load_quiz_draft};
pub use page::{Listing, PageMeta};
pub use profile::{Profile, ProfileField};
pub use quiz::{CreateQuizRequest, Question, Quiz, QuizDraft, QuizPage};
pub use result::{QuizResult, ResultFilter, ResultPage, ResultSubmission, ScoreBand};
pub use user::{Role, User};
