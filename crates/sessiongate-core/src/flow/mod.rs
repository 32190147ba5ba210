//! Credential submission: validation rules and the login/signup state machine.

pub mod request;
pub mod submission;
pub mod validation;

pub use request::SubmissionRequest;
pub use submission::{Dispatch, DispatchId, FlowError, FlowState, SubmissionFlow, SuccessCallback};
pub use validation::{validate, AcceptAny, MinLength, PasswordPolicy, ValidationError};
