//! Page forms and the checks they run before anything is sent.

use crate::api::{ActionError, Credentials, PostDraft, Registration};

use super::editor::TextBuffer;

const MIN_USERNAME_CHARS: usize = 3;
const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    Email,
    Password,
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub focus: LoginField,
    pub submitting: bool,
}

impl LoginForm {
    pub fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
        }
    }

    pub fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            LoginField::Email => LoginField::Password,
            LoginField::Password => LoginField::Email,
        };
    }

    pub fn credentials(&self) -> Result<Credentials, ActionError> {
        let email = self.email.trim();
        if email.is_empty() || self.password.is_empty() {
            return Err(ActionError::Validation(
                "Please fill in all fields correctly.".into(),
            ));
        }
        Ok(Credentials {
            email: email.to_string(),
            password: self.password.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignupField {
    #[default]
    Username,
    Email,
    Password,
}

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub focus: SignupField,
    pub submitting: bool,
}

impl SignupForm {
    pub fn focused_mut(&mut self) -> &mut String {
        match self.focus {
            SignupField::Username => &mut self.username,
            SignupField::Email => &mut self.email,
            SignupField::Password => &mut self.password,
        }
    }

    pub fn cycle_focus(&mut self, forward: bool) {
        use SignupField::*;
        self.focus = match (self.focus, forward) {
            (Username, true) | (Password, false) => Email,
            (Email, true) | (Username, false) => Password,
            (Password, true) | (Email, false) => Username,
        };
    }

    pub fn registration(&self) -> Result<Registration, ActionError> {
        let registration = Registration {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password.clone(),
        };
        validate_registration(&registration)?;
        Ok(registration)
    }
}

/// Account rules checked before any signup request leaves the client.
pub fn validate_registration(registration: &Registration) -> Result<(), ActionError> {
    if registration.username.trim().chars().count() < MIN_USERNAME_CHARS {
        return Err(ActionError::Validation(format!(
            "Username must be at least {MIN_USERNAME_CHARS} characters."
        )));
    }
    if !registration.email.contains('@') {
        return Err(ActionError::Validation(
            "Please enter a valid email address.".into(),
        ));
    }
    if registration.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ActionError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_CHARS} characters."
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DraftField {
    #[default]
    Title,
    Content,
}

impl DraftField {
    pub fn toggle(self) -> DraftField {
        match self {
            DraftField::Title => DraftField::Content,
            DraftField::Content => DraftField::Title,
        }
    }
}

/// Title plus HTML body, shared by the new-post page and dashboard edits.
#[derive(Debug, Clone, Default)]
pub struct PostForm {
    pub title: String,
    pub content: TextBuffer,
    pub focus: DraftField,
    pub submitting: bool,
}

impl PostForm {
    pub fn from_post(title: &str, content: &str) -> Self {
        Self {
            title: title.to_string(),
            content: TextBuffer::new(content),
            focus: DraftField::Title,
            submitting: false,
        }
    }

    /// Publishing needs both fields filled in.
    pub fn can_publish(&self) -> bool {
        !self.title.trim().is_empty() && !self.content.is_empty()
    }

    pub fn new_post_draft(&self) -> Result<PostDraft, ActionError> {
        if !self.can_publish() {
            return Err(ActionError::Validation(
                "Title and content are required.".into(),
            ));
        }
        Ok(self.draft())
    }

    /// Edits only insist on a title; an emptied body is allowed.
    pub fn edit_draft(&self) -> Result<PostDraft, ActionError> {
        if self.title.trim().is_empty() {
            return Err(ActionError::Validation("Title cannot be empty.".into()));
        }
        Ok(self.draft())
    }

    fn draft(&self) -> PostDraft {
        PostDraft {
            title: self.title.trim().to_string(),
            content: self.content.text().to_string(),
        }
    }
}
