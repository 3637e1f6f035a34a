//! Field-scoped validation results shared by the step forms.

use std::collections::BTreeMap;
use std::fmt;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Field key → message mapping produced when a step refuses to advance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<&'static str, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.insert(field, message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Drops the message for a field once the user edits it.
    pub fn clear_field(&mut self, field: &str) {
        self.errors.remove(field);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.errors.iter().map(|(key, value)| (*key, value.as_str()))
    }

    /// `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

/// Loose email shape check: an `@` followed later by a `.`.
pub fn is_plausible_email(value: &str) -> bool {
    let trimmed = value.trim();
    match trimmed.find('@') {
        Some(at) if at > 0 => {
            let domain = &trimmed[at + 1..];
            match domain.rfind('.') {
                Some(dot) => dot > 0 && dot + 1 < domain.len(),
                None => false,
            }
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(is_plausible_email("b@x.com"));
        assert!(is_plausible_email(" first.last@mail.example.org "));
        assert!(!is_plausible_email("bob"));
        assert!(!is_plausible_email("bob@localhost"));
        assert!(!is_plausible_email("@x.com"));
        assert!(!is_plausible_email("bob@.com"));
        assert!(!is_plausible_email("bob@x."));
        assert!(!is_plausible_email("bob.smith@"));
    }

    #[test]
    fn errors_convert_to_result() {
        assert!(FieldErrors::new().into_result().is_ok());
        let mut errors = FieldErrors::new();
        errors.insert("email", "Email is required");
        let err = errors.into_result().unwrap_err();
        assert_eq!(err.get("email"), Some("Email is required"));
        assert_eq!(err.to_string(), "email: Email is required");
    }
}
