//! Staging profile selection.
//!
//! Profiles are dot-separated namespaces. A profile applies to a package
//! group when its name equals the group or is a prefix of it ending at a
//! `.` boundary; the most specific (longest) applicable profile wins.

use crate::wire::StagingProfile;

/// Returns true if `profile_name` covers `package_group`.
///
/// # Examples
///
/// ```
/// use nexus_staging::profile_matches;
///
/// assert!(profile_matches("org.example", "org.example"));
/// assert!(profile_matches("org.example", "org.example.sub"));
/// assert!(!profile_matches("org.example", "org.example2"));
/// ```
#[must_use]
pub fn profile_matches(profile_name: &str, package_group: &str) -> bool {
    match package_group.strip_prefix(profile_name) {
        Some("") => !profile_name.is_empty(),
        Some(rest) => !profile_name.is_empty() && rest.starts_with('.'),
        None => false,
    }
}

/// Picks the most specific profile covering `package_group`.
#[must_use]
pub fn select_profile<'a>(
    profiles: &'a [StagingProfile],
    package_group: &str,
) -> Option<&'a StagingProfile> {
    profiles
        .iter()
        .filter(|profile| profile_matches(&profile.name, package_group))
        .max_by_key(|profile| profile.name.len())
}
