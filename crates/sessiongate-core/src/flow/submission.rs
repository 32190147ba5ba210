//! The login/signup submission state machine.
//!
//! `SubmissionFlow` owns the form fields, the active view mode and the error
//! slots. A submit is split in two steps so an event-driven shell can keep
//! handling input while the remote call runs:
//!
//! ```text
//! Idle --begin_submit--> Validating --invalid--> Failed
//!                                   --valid----> AwaitingRemote --complete(Ok)--> Success
//!                                                               --complete(Err)-> Failed
//! any state --toggle / edit--> Idle
//! AwaitingRemote --abandon / close / dropped submit--> Idle
//! ```
//!
//! [`SubmissionFlow::submit`] runs both steps in a single await.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api::{ApiError, AuthApi};
use crate::auth::SessionStore;
use crate::models::{Session, ViewMode};

use super::validation::{validate, AcceptAny, PasswordPolicy, ValidationError};
use super::SubmissionRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    Validating,
    AwaitingRemote,
    Success,
    Failed,
}

#[derive(Error, Debug)]
pub enum FlowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Remote(#[from] ApiError),

    #[error("A submission is already in progress")]
    SubmissionPending,

    #[error("No submission in progress matches this response")]
    UnknownDispatch,
}

/// Identifies one dispatched remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchId {
    seq: u64,
    mode: ViewMode,
}

impl DispatchId {
    pub fn mode(&self) -> ViewMode {
        self.mode
    }
}

/// A validated request whose remote call the caller must run and then report
/// back with [`SubmissionFlow::complete`].
#[derive(Debug)]
pub struct Dispatch {
    id: DispatchId,
    request: SubmissionRequest,
}

impl Dispatch {
    pub fn id(&self) -> DispatchId {
        self.id
    }

    pub fn request(&self) -> &SubmissionRequest {
        &self.request
    }

    /// Run the one remote operation selected by the request's mode.
    pub async fn call<A: AuthApi>(&self, api: &A) -> Result<Session, ApiError> {
        let req = &self.request;
        match req.mode {
            ViewMode::Login => api.login(&req.username, &req.password).await,
            ViewMode::Signup => {
                api.signup(&req.username, &req.password, &req.confirm_password)
                    .await
            }
        }
    }
}

pub type SuccessCallback = Box<dyn FnMut(&Session) + Send>;

pub struct SubmissionFlow {
    store: Arc<SessionStore>,
    policy: Box<dyn PasswordPolicy>,
    on_success: Option<SuccessCallback>,

    mode: ViewMode,
    username: String,
    password: String,
    confirm_password: String,

    state: FlowState,
    validation_error: Option<ValidationError>,
    login_error: Option<String>,
    signup_error: Option<String>,
    close_on_success: bool,

    in_flight: Option<DispatchId>,
    next_seq: u64,
}

impl SubmissionFlow {
    pub fn new(store: Arc<SessionStore>, mode: ViewMode) -> Self {
        Self {
            store,
            policy: Box::new(AcceptAny),
            on_success: None,
            mode,
            username: String::new(),
            password: String::new(),
            confirm_password: String::new(),
            state: FlowState::Idle,
            validation_error: None,
            login_error: None,
            signup_error: None,
            close_on_success: false,
            in_flight: None,
            next_seq: 0,
        }
    }

    pub fn with_policy(mut self, policy: impl PasswordPolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn with_boxed_policy(mut self, policy: Box<dyn PasswordPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Called once for every submission that produces a session.
    pub fn on_success(mut self, callback: impl FnMut(&Session) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(callback));
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn validation_error(&self) -> Option<&ValidationError> {
        self.validation_error.as_ref()
    }

    pub fn login_error(&self) -> Option<&str> {
        self.login_error.as_deref()
    }

    pub fn signup_error(&self) -> Option<&str> {
        self.signup_error.as_deref()
    }

    /// The message the view should show right now, if any: a validation
    /// failure first, else the remote error for the active mode.
    pub fn displayed_error(&self) -> Option<String> {
        if let Some(ref e) = self.validation_error {
            return Some(e.to_string());
        }
        match self.mode {
            ViewMode::Login => self.login_error.clone(),
            ViewMode::Signup => self.signup_error.clone(),
        }
    }

    /// Whether a successful submission asked the view to close.
    pub fn close_requested(&self) -> bool {
        self.close_on_success
    }

    pub fn is_pending(&self) -> bool {
        self.in_flight.is_some()
    }

    // =========================================================================
    // Input events
    // =========================================================================

    pub fn set_username(&mut self, value: impl Into<String>) {
        self.username = value.into();
        self.reset_to_idle();
    }

    pub fn set_password(&mut self, value: impl Into<String>) {
        self.password = value.into();
        self.reset_to_idle();
    }

    pub fn set_confirm_password(&mut self, value: impl Into<String>) {
        self.confirm_password = value.into();
        self.reset_to_idle();
    }

    pub fn toggle_view(&mut self) {
        self.set_view(self.mode.toggled());
    }

    pub fn set_view(&mut self, mode: ViewMode) {
        debug!(from = %self.mode, to = %mode, "View mode changed");
        self.mode = mode;
        self.reset_to_idle();
    }

    /// Close the form: forget typed values, messages and any outstanding
    /// dispatch. A response for that dispatch is then ignored.
    pub fn close(&mut self) {
        if let Some(id) = self.in_flight {
            self.abandon(id);
        }
        self.username.clear();
        self.password.clear();
        self.confirm_password.clear();
        self.reset_to_idle();
    }

    fn reset_to_idle(&mut self) {
        self.state = FlowState::Idle;
        self.validation_error = None;
        self.login_error = None;
        self.signup_error = None;
        self.close_on_success = false;
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Snapshot the fields, validate, and hand back the remote call to run.
    pub fn begin_submit(&mut self) -> Result<Dispatch, FlowError> {
        if self.in_flight.is_some() {
            debug!("Submit ignored, a remote call is still outstanding");
            return Err(FlowError::SubmissionPending);
        }

        let request = SubmissionRequest {
            mode: self.mode,
            username: self.username.clone(),
            password: self.password.clone(),
            confirm_password: self.confirm_password.clone(),
        };

        self.state = FlowState::Validating;
        self.validation_error = None;
        self.login_error = None;
        self.signup_error = None;
        self.close_on_success = false;

        if let Err(e) = validate(&request, self.policy.as_ref()) {
            debug!(mode = %request.mode, error = %e, "Validation failed");
            self.validation_error = Some(e.clone());
            self.state = FlowState::Failed;
            return Err(e.into());
        }

        let id = DispatchId {
            seq: self.next_seq,
            mode: request.mode,
        };
        self.next_seq += 1;
        self.in_flight = Some(id);
        self.state = FlowState::AwaitingRemote;
        debug!(mode = %request.mode, username = %request.username, "Submission dispatched");

        Ok(Dispatch { id, request })
    }

    /// Apply the result of a dispatched call.
    ///
    /// A session is always stored and reported, even if the user toggled or
    /// edited meanwhile. An error is only displayed if the view has not
    /// changed since the dispatch.
    pub fn complete(
        &mut self,
        id: DispatchId,
        result: Result<Session, ApiError>,
    ) -> Result<Session, FlowError> {
        if self.in_flight != Some(id) {
            warn!(seq = id.seq, "Response for unknown submission ignored");
            return Err(FlowError::UnknownDispatch);
        }
        self.in_flight = None;

        match result {
            Ok(session) => {
                info!(mode = %id.mode, username = %session.username(), "Submission succeeded");
                self.store.add(session.clone());
                self.password.clear();
                self.confirm_password.clear();
                self.state = FlowState::Success;
                self.close_on_success = true;
                if let Some(ref mut callback) = self.on_success {
                    callback(&session);
                }
                Ok(session)
            }
            Err(e) => {
                if self.state != FlowState::AwaitingRemote || self.mode != id.mode {
                    debug!(mode = %id.mode, error = %e, "Remote error for a stale view dropped");
                } else {
                    warn!(mode = %id.mode, error = %e, "Submission failed");
                    let message = e.to_string();
                    match id.mode {
                        ViewMode::Login => self.login_error = Some(message),
                        ViewMode::Signup => self.signup_error = Some(message),
                    }
                    self.state = FlowState::Failed;
                }
                Err(e.into())
            }
        }
    }

    /// Give up on a dispatch whose result will never be reported, e.g. after
    /// a caller-side timeout. Returns whether `id` was the outstanding one.
    pub fn abandon(&mut self, id: DispatchId) -> bool {
        if self.in_flight != Some(id) {
            return false;
        }
        self.in_flight = None;
        if self.state == FlowState::AwaitingRemote {
            self.state = FlowState::Idle;
        }
        warn!(seq = id.seq, mode = %id.mode, "Submission abandoned before a response arrived");
        true
    }

    /// Validate, call the API and apply the result.
    ///
    /// Dropping the returned future before it resolves abandons the dispatch,
    /// so the flow accepts a new submit afterwards.
    pub async fn submit<A: AuthApi>(&mut self, api: &A) -> Result<Session, FlowError> {
        let dispatch = self.begin_submit()?;
        let guard = AbandonOnDrop {
            flow: self,
            id: dispatch.id(),
        };
        let result = dispatch.call(api).await;
        guard.flow.complete(dispatch.id(), result)
    }
}

/// Abandons the dispatch when `submit` is cancelled mid-call. A no-op once
/// `complete` has cleared the outstanding dispatch.
struct AbandonOnDrop<'a> {
    flow: &'a mut SubmissionFlow,
    id: DispatchId,
}

impl Drop for AbandonOnDrop<'_> {
    fn drop(&mut self) {
        self.flow.abandon(self.id);
    }
}
