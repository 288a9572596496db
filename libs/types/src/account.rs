//! Account collaborator request bodies
//!
//! Bodies for `POST /login` and `POST /create-account`. Construction trims
//! every field; `validate` applies the same checks the account forms run
//! before anything is sent.

use crate::errors::ValidationError;
use serde::{Deserialize, Serialize};

/// Default privilege marker for new accounts
pub const DEFAULT_ADMIN_STATUS: &str = "user";

/// Body of `POST /login`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into().trim().to_string(),
            password: password.into().trim().to_string(),
        }
    }

    /// Both fields are required
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("username", &self.username)?;
        require("password", &self.password)
    }
}

/// Body of `POST /create-account`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub fname: String,
    pub lname: String,
    pub username: String,
    pub password: String,
    pub admsts: String,
}

impl CreateAccountRequest {
    pub fn new(
        fname: impl Into<String>,
        lname: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            fname: fname.into().trim().to_string(),
            lname: lname.into().trim().to_string(),
            username: username.into().trim().to_string(),
            password: password.into().trim().to_string(),
            admsts: DEFAULT_ADMIN_STATUS.to_string(),
        }
    }

    /// All fields are required and the password must mix letters, digits
    /// and at least one non-alphanumeric character.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("fname", &self.fname)?;
        require("lname", &self.lname)?;
        require("username", &self.username)?;
        require("password", &self.password)?;
        if !is_strong_password(&self.password) {
            return Err(ValidationError::WeakPassword);
        }
        Ok(())
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(())
    }
}

/// Letter + digit + non-alphanumeric.
pub fn is_strong_password(password: &str) -> bool {
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| !c.is_ascii_alphanumeric());
    has_letter && has_digit && has_special
}
