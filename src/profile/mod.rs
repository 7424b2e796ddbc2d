//! Mail client detection.
//!
//! The resolver maps the desktop's default `mailto:` handler to a
//! [`Profile`]. Only two clients get a dedicated profile, everything else
//! falls back to a generic `mailto:` URI.

pub mod handler;

use crate::model::profile::Profile;

pub use handler::{FixedHandler, HandlerSource, XdgMimeHandler};

/// Selects the message profile for the configured mail client.
pub struct ProfileResolver {
    source: Box<dyn HandlerSource>,
}

impl ProfileResolver {
    pub fn new(source: impl HandlerSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    /// Resolve the profile to use for the current environment.
    ///
    /// Never fails: an absent or unknown handler gives [`Profile::mailto`].
    pub fn resolve(&self) -> Profile {
        let handler = self.source.default_mail_handler();
        let profile = profile_for_handler(handler.as_deref());
        tracing::debug!(
            handler = handler.as_deref().unwrap_or("<none>"),
            profile = profile.name,
            "Resolved mail client profile"
        );
        profile
    }
}

impl Default for ProfileResolver {
    fn default() -> Self {
        Self::new(XdgMimeHandler)
    }
}

impl std::fmt::Debug for ProfileResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileResolver").finish_non_exhaustive()
    }
}

/// Map a handler string to its profile.
///
/// Matching ignores case so that desktop ids such as
/// `org.mozilla.Thunderbird.desktop` are recognized.
pub fn profile_for_handler(handler: Option<&str>) -> Profile {
    let handler = handler.map(str::to_lowercase).unwrap_or_default();
    if handler.contains("thunderbird") {
        Profile::thunderbird()
    } else if handler.contains("kmail") {
        Profile::kmail()
    } else {
        Profile::mailto()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognized_handlers() {
        let resolver = ProfileResolver::new(FixedHandler::new("/usr/bin/thunderbird %s"));
        assert_eq!(resolver.resolve(), Profile::thunderbird());

        let resolver = ProfileResolver::new(FixedHandler::new("kmail %s"));
        assert_eq!(resolver.resolve(), Profile::kmail());

        let resolver = ProfileResolver::new(FixedHandler::new("thunderbird.desktop"));
        assert_eq!(resolver.resolve().name, "thunderbird");

        let resolver = ProfileResolver::new(FixedHandler::new("org.mozilla.Thunderbird.desktop"));
        assert_eq!(resolver.resolve().name, "thunderbird");

        let resolver = ProfileResolver::new(FixedHandler::new("org.kde.kmail2.desktop"));
        assert_eq!(resolver.resolve().name, "kmail");
    }

    #[test]
    fn test_unknown_or_missing_handler_is_generic() {
        for handler in ["evolution --component=mail %s", "", "mutt", "geary", "   "] {
            let resolver = ProfileResolver::new(FixedHandler::new(handler));
            assert!(resolver.resolve().is_generic(), "handler: {handler:?}");
        }
        assert!(ProfileResolver::new(FixedHandler::none()).resolve().is_generic());
    }

    #[test]
    fn test_thunderbird_wins_over_kmail() {
        let profile = profile_for_handler(Some("thunderbird-kmail-wrapper"));
        assert_eq!(profile.name, "thunderbird");
    }
}
