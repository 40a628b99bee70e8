//! Resource name rules shared by server and load-balancer creation.
//!
//! The provider only accepts names made of ASCII letters, digits and hyphens,
//! and treats names that differ only by case as the same resource.

use crate::error::{Error, Result};

/// Removes every character outside `[A-Za-z0-9-]`.
///
/// Applying it twice gives the same result as applying it once.
///
/// # Errors
///
/// Returns [`Error::ValidationError`] if nothing is left after stripping.
pub fn sanitize_name(raw: &str) -> Result<String> {
    let clean: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect();

    if clean.is_empty() {
        return Err(Error::ValidationError(format!(
            "Name `{raw}` has no allowed characters (A-Z, a-z, 0-9, -)"
        )));
    }

    Ok(clean)
}

/// Fails if `name` matches any of `existing`, ignoring case.
///
/// # Errors
///
/// Returns [`Error::DuplicateName`] on a match.
pub fn ensure_unique_name<I, S>(kind: &str, name: &str, existing: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let wanted = name.to_lowercase();
    if existing
        .into_iter()
        .any(|candidate| candidate.as_ref().to_lowercase() == wanted)
    {
        return Err(Error::DuplicateName {
            kind: kind.to_string(),
            name: name.to_string(),
        });
    }
    Ok(())
}
