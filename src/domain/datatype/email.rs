use std::str::FromStr;

use crate::{
    base::ResourceID,
    error::resource::{ValidationErrorKind, ValidationFieldError},
};

/// Email address accepted by the user resources.
///
/// Only the shape is checked: a non-empty local part, a single `@` and a
/// domain made of at least two non-empty dot separated labels, without
/// whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Email(String);

impl Email {
    pub const MAX_LENGTH: usize = 254;

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_valid(s: &str) -> bool {
        if s.chars().any(char::is_whitespace) {
            return false;
        }

        let (local, domain) = match s.split_once('@') {
            Some(parts) => parts,
            None => return false,
        };

        if local.is_empty() || domain.contains('@') {
            return false;
        }

        let labels: Vec<&str> = domain.split('.').collect();
        labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
    }
}

impl ResourceID for Email {
    fn resource_id() -> &'static str {
        "base::email"
    }
}

impl FromStr for Email {
    type Err = ValidationFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() > Self::MAX_LENGTH {
            return Err(ValidationFieldError::from_resource::<Self>(
                s.into(),
                String::new(),
                vec![ValidationErrorKind::MaxLength(Self::MAX_LENGTH as u64)],
            ));
        }

        if !Self::is_valid(s) {
            return Err(ValidationFieldError::from_resource::<Self>(
                s.into(),
                String::new(),
                vec![ValidationErrorKind::Pattern("email".into())],
            ));
        }

        Ok(Self(s.into()))
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Email> for String {
    fn from(email: Email) -> Self {
        email.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_addresses() {
        for addr in ["test@example.com", "first.last+tag@mail.example.org", "a@b.co"] {
            let email: Email = addr.parse().unwrap();
            assert_eq!(email.as_str(), addr);
        }
    }

    #[test]
    fn rejects_malformed_addresses() {
        for addr in [
            "",
            "plain",
            "@example.com",
            "user@",
            "user@localhost",
            "user@@example.com",
            "user@exa mple.com",
            "user@example..com",
            "user@.com",
        ] {
            let err = addr.parse::<Email>().unwrap_err();
            assert_eq!(err.type_id, "base::email", "{addr:?}");
            assert_eq!(
                err.kinds,
                vec![ValidationErrorKind::Pattern("email".into())],
                "{addr:?}"
            );
        }
    }

    #[test]
    fn rejects_overlong_addresses() {
        let addr = format!("{}@example.com", "a".repeat(250));
        let err = addr.parse::<Email>().unwrap_err();
        assert_eq!(err.kinds, vec![ValidationErrorKind::MaxLength(254)]);
    }
}
