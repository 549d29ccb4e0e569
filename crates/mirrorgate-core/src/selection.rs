//! Mirror organization selection.

use serde::{Deserialize, Serialize};

/// Which mirror organization an image is routed through.
///
/// Most images go through the standard pull-through mirror. Repositories
/// matching a legacy prefix were removed upstream and only survive in a
/// separately maintained legacy mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorSelection {
    /// The standard mirror of the public registry.
    StandardMirror,
    /// The legacy mirror holding images no longer published upstream.
    LegacyMirror,
}

impl MirrorSelection {
    /// Selects the mirror for a repository given the legacy prefixes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use mirrorgate_core::MirrorSelection;
    ///
    /// let prefixes = ["kyleaure/"];
    /// assert_eq!(
    ///     MirrorSelection::for_repository("kyleaure/oracle-18.4.0-xe-prebuilt", &prefixes),
    ///     MirrorSelection::LegacyMirror
    /// );
    /// assert_eq!(
    ///     MirrorSelection::for_repository("library/postgres", &prefixes),
    ///     MirrorSelection::StandardMirror
    /// );
    /// ```
    #[must_use]
    pub fn for_repository<S: AsRef<str>>(repository: &str, legacy_prefixes: &[S]) -> Self {
        if legacy_prefixes
            .iter()
            .any(|prefix| repository.starts_with(prefix.as_ref()))
        {
            Self::LegacyMirror
        } else {
            Self::StandardMirror
        }
    }

    /// Picks the matching organization name.
    #[must_use]
    pub const fn mirror_name<'a>(self, standard: &'a str, legacy: &'a str) -> &'a str {
        match self {
            Self::StandardMirror => standard,
            Self::LegacyMirror => legacy,
        }
    }
}
