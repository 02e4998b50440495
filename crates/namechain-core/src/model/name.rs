//! Fully-qualified name rules.
//!
//! A fully-qualified name is `<label>.<namespace_id>`. Labels draw from the
//! base-40 charset (`a-z`, `0-9`, `-`, `_`); the whole name is capped at 37
//! characters. Validation errors carry a coherent reason so callers can
//! surface them directly.

use crate::errors::{CoreError, CoreResult};

/// Maximum length of a fully-qualified name.
pub const MAX_NAME_LENGTH: usize = 37;

const B40_LABEL: &str = "abcdefghijklmnopqrstuvwxyz0123456789-_";

/// True if every character is in the base-40 label charset.
pub fn is_b40(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| B40_LABEL.contains(c))
}

/// Split a fully-qualified name into `(label, namespace_id)`.
///
/// The namespace is everything after the last dot, matching the on-chain
/// interpretation.
pub fn split_fqu(fqu: &str) -> CoreResult<(&str, &str)> {
    match fqu.rsplit_once('.') {
        Some((label, ns)) if !label.is_empty() && !ns.is_empty() => Ok((label, ns)),
        _ => Err(CoreError::invalid_name(
            "names must end with a period followed by a valid namespace",
        )),
    }
}

/// Verify that a fully-qualified name is valid.
pub fn check_name(fqu: &str) -> CoreResult<()> {
    if !fqu.contains('.') {
        return Err(CoreError::invalid_name(
            "names must end with a period followed by a valid namespace",
        ));
    }

    let (label, namespace_id) = split_fqu(fqu)?;

    if fqu.len() > MAX_NAME_LENGTH {
        return Err(CoreError::invalid_name(format!(
            "names may be at most {MAX_NAME_LENGTH} characters long"
        )));
    }

    if !is_b40(label) {
        return Err(CoreError::invalid_name(
            "names may only contain alphanumeric characters, dashes, and underscores",
        ));
    }

    if !is_b40(namespace_id) {
        return Err(CoreError::invalid_name(
            "namespace ids may only contain alphanumeric characters, dashes, and underscores",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_names() {
        assert!(check_name("alice.id").is_ok());
        assert!(check_name("a-b_c123.id").is_ok());
    }

    #[test]
    fn rejects_missing_namespace() {
        assert!(check_name("alice").is_err());
        assert!(check_name(".id").is_err());
        assert!(check_name("alice.").is_err());
    }

    #[test]
    fn rejects_bad_charset_and_length() {
        assert!(check_name("Alice.id").is_err());
        assert!(check_name("al ice.id").is_err());
        let long = format!("{}.id", "a".repeat(40));
        assert!(check_name(&long).is_err());
    }

    #[test]
    fn split_uses_last_dot() {
        let (label, ns) = split_fqu("foo.bar.id").unwrap();
        assert_eq!(label, "foo.bar");
        assert_eq!(ns, "id");
    }
}
