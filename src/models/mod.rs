pub mod course;
pub mod credential;
pub mod endpoints;
pub mod form;
pub mod markers;
pub mod questionnaire;

pub use course::{CourseRecord, CourseResult, CourseToken, Outcome, SeatStatus};
pub use credential::Credential;
pub use endpoints::{Endpoint, PortalUrls};
pub use form::FormData;
pub use questionnaire::{FillingPolicy, Questionnaire, TaForm, TaQuestionnaire};
