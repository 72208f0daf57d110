pub mod course_flow;
pub mod questionnaire_flow;
pub mod state;
pub mod step;

pub use course_flow::CourseFlow;
pub use questionnaire_flow::QuestionnaireFlow;
pub use state::{WorkflowRun, WorkflowState};
pub use step::{Check, Method, Step, Target};
