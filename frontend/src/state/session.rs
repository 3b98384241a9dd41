use shared::User;

/// The signed-in user, as last reported by the auth service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    user: Option<User>,
    /// True until the startup session lookup has finished.
    checking: bool,
}

/// How a reported user differs from the one already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChange {
    Unchanged,
    /// Same account, new profile values.
    ProfileUpdated,
    SignedIn,
    SwitchedUser,
    SignedOut,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user: None,
            checking: true,
        }
    }
}

impl SessionState {
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn checking(&self) -> bool {
        self.checking
    }

    pub fn finish_check(&mut self) {
        self.checking = false;
    }

    pub fn apply(&mut self, user: Option<User>) -> SessionChange {
        let change = match (&self.user, &user) {
            (None, None) => SessionChange::Unchanged,
            (None, Some(_)) => SessionChange::SignedIn,
            (Some(_), None) => SessionChange::SignedOut,
            (Some(current), Some(next)) if current.id != next.id => SessionChange::SwitchedUser,
            (Some(current), Some(next)) if current == next => SessionChange::Unchanged,
            (Some(_), Some(_)) => SessionChange::ProfileUpdated,
        };
        self.user = user;
        change
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthMode {
    #[default]
    SignIn,
    SignUp,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthForm {
    pub mode: AuthMode,
    pub name: String,
    pub email: String,
    pub password: String,
    pub submitting: bool,
}

/// A validated submission of the auth form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    SignIn { email: String, password: String },
    SignUp { email: String, password: String, name: String },
}

impl AuthForm {
    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            AuthMode::SignIn => AuthMode::SignUp,
            AuthMode::SignUp => AuthMode::SignIn,
        };
    }

    /// Locks the form and returns what to send, or `None` when a field is
    /// missing or a submission is already in flight.
    pub fn submit(&mut self) -> Option<Credentials> {
        if self.submitting {
            return None;
        }
        let email = self.email.trim();
        let name = self.name.trim();
        if email.is_empty() || self.password.is_empty() {
            return None;
        }

        let credentials = match self.mode {
            AuthMode::SignIn => Credentials::SignIn {
                email: email.to_string(),
                password: self.password.clone(),
            },
            AuthMode::SignUp if name.is_empty() => return None,
            AuthMode::SignUp => Credentials::SignUp {
                email: email.to_string(),
                password: self.password.clone(),
                name: name.to_string(),
            },
        };
        self.submitting = true;
        Some(credentials)
    }

    pub fn finish(&mut self) {
        self.submitting = false;
    }

    /// Forgets everything typed, keeping the chosen mode.
    pub fn reset(&mut self) {
        *self = Self {
            mode: self.mode,
            ..Self::default()
        };
    }
}
