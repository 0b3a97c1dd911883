//! User identity capability for the handoff boundary.
//!
//! A user type carries a standard authentication identifier, and may
//! expose a custom handoff identifier instead (for installations where
//! the two applications share an external reference rather than a
//! primary key). The custom identifier, when present, takes precedence
//! on both the issuing and the verifying side.

/// Capability trait for user types that can cross the handoff boundary.
///
/// The default implementations model the common case: the user is
/// identified by its standard auth identifier (`id`). Types with a
/// shared external reference override the `handoff_identifier_*` pair.
///
/// # Example
///
/// ```
/// use handoff_core::{user_key, Authenticatable};
///
/// struct Member {
///     id: u64,
///     badge: String,
/// }
///
/// impl Authenticatable for Member {
///     fn auth_identifier(&self) -> String {
///         self.id.to_string()
///     }
///
///     fn handoff_identifier_name(&self) -> Option<&str> {
///         Some("badge")
///     }
///
///     fn handoff_identifier(&self) -> Option<String> {
///         Some(self.badge.clone())
///     }
/// }
///
/// let member = Member { id: 7, badge: "B-1041".to_string() };
/// assert_eq!(user_key(&member), "B-1041");
/// ```
pub trait Authenticatable {
    /// Field name of the standard authentication identifier.
    fn auth_identifier_name(&self) -> &str {
        "id"
    }

    /// Value of the standard authentication identifier, in string form.
    fn auth_identifier(&self) -> String;

    /// Field name of the custom handoff identifier, if the type has one.
    fn handoff_identifier_name(&self) -> Option<&str> {
        None
    }

    /// Value of the custom handoff identifier, if the type has one.
    fn handoff_identifier(&self) -> Option<String> {
        None
    }
}

/// The identifier value embedded in a signed handoff URL for `user`.
///
/// Prefers the custom handoff identifier when the type provides one.
#[must_use]
pub fn user_key(user: &dyn Authenticatable) -> String {
    user.handoff_identifier()
        .unwrap_or_else(|| user.auth_identifier())
}

/// The field name the verifying side must query for `user`.
#[must_use]
pub fn lookup_field(user: &dyn Authenticatable) -> &str {
    user.handoff_identifier_name()
        .unwrap_or_else(|| user.auth_identifier_name())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PlainUser {
        id: u64,
    }

    impl Authenticatable for PlainUser {
        fn auth_identifier(&self) -> String {
            self.id.to_string()
        }
    }

    struct BadgeUser {
        id: u64,
        badge: String,
    }

    impl Authenticatable for BadgeUser {
        fn auth_identifier(&self) -> String {
            self.id.to_string()
        }

        fn handoff_identifier_name(&self) -> Option<&str> {
            Some("badge")
        }

        fn handoff_identifier(&self) -> Option<String> {
            Some(self.badge.clone())
        }
    }

    #[test]
    fn plain_user_uses_standard_identifier() {
        let user = PlainUser { id: 42 };
        assert_eq!(user_key(&user), "42");
        assert_eq!(lookup_field(&user), "id");
    }

    #[test]
    fn custom_identifier_takes_precedence() {
        let user = BadgeUser {
            id: 42,
            badge: "B-1041".to_string(),
        };
        assert_eq!(user_key(&user), "B-1041");
        assert_eq!(lookup_field(&user), "badge");
    }
}
