use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which credential form is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewMode {
    #[default]
    Login,
    Signup,
}

impl ViewMode {
    /// The other form.
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Login => ViewMode::Signup,
            ViewMode::Signup => ViewMode::Login,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ViewMode::Login => "Login",
            ViewMode::Signup => "Signup",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "login" => Ok(ViewMode::Login),
            "signup" | "sign-up" => Ok(ViewMode::Signup),
            other => Err(format!("Unknown view mode: {}", other)),
        }
    }
}
