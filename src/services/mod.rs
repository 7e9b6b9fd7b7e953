pub mod auth;
pub mod incident_log;
pub mod local_store;
pub mod password_reset;
pub mod profile;
pub mod quiz;
pub mod results;

pub use auth::{AuthApi, AuthSession, RegistrationForm, SessionCache};
pub use incident_log::IncidentLog;
pub use local_store::JsonStore;
pub use password_reset::{PasswordReset, PasswordResetApi, ResetStep};
pub use profile::{ProfileApi, ProfileCache, ProfileService, ProfileSource, SaveOutcome};
pub use quiz::{publish_drafts, Dashboard, PublishReport, QuizCatalog};
pub use results::{ResultsApi, ResultsService};
