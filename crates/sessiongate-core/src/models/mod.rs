//! Data models shared across sessiongate.
//!
//! - `Session`: the authenticated identity held after login or signup
//! - `ViewMode`: which credential form is active

pub mod session;
pub mod view;

pub use session::{Session, SessionError};
pub use view::ViewMode;
