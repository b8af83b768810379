use anchor_lang::prelude::*;

use crate::error::CompetitionError;
use crate::state::Settings;

/// Shared-secret check the admin surface runs before create, update, delete
/// and winner-history commands. The registry itself does not enforce it.
#[derive(Debug, Clone)]
pub struct AdminGate {
    password: String,
}

impl AdminGate {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.admin_password.clone())
    }

    pub fn authorize(&self, attempt: &str) -> Result<()> {
        if attempt != self.password {
            msg!("Admin login rejected");
            return err!(CompetitionError::AdminPasswordRejected);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anchor_lang::error::Error;

    use super::*;
    use crate::error::{error_kind, ErrorKind};

    #[test]
    fn default_password_opens_the_gate() {
        let gate = AdminGate::from_settings(&Settings::default());
        assert!(gate.authorize("admin123").is_ok());
    }

    #[test]
    fn wrong_password_is_unauthorized() {
        let gate = AdminGate::new("s3cret");
        let err = gate.authorize("admin123").unwrap_err();
        assert_eq!(err, Error::from(CompetitionError::AdminPasswordRejected));
        assert_eq!(error_kind(&err), Some(ErrorKind::Unauthorized));
    }
}
