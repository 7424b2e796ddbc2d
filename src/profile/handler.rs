//! Sources for the desktop's default `mailto:` handler.

use std::process::Command;

/// Reads the environment's default handler for the `mailto` scheme.
///
/// `None` means the environment expressed no preference.
pub trait HandlerSource: Send + Sync {
    fn default_mail_handler(&self) -> Option<String>;
}

/// A handler value known up front, e.g. from the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixedHandler(pub Option<String>);

impl FixedHandler {
    pub fn new(handler: impl Into<String>) -> Self {
        Self(Some(handler.into()))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl HandlerSource for FixedHandler {
    fn default_mail_handler(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Asks `xdg-mime` for the desktop entry handling `x-scheme-handler/mailto`.
///
/// Any failure (missing tool, non-zero exit, empty output) reads as no
/// preference.
#[derive(Debug, Clone, Copy, Default)]
pub struct XdgMimeHandler;

impl HandlerSource for XdgMimeHandler {
    fn default_mail_handler(&self) -> Option<String> {
        let output = Command::new("xdg-mime")
            .args(["query", "default", "x-scheme-handler/mailto"])
            .output();

        let output = match output {
            Ok(o) if o.status.success() => o,
            Ok(o) => {
                tracing::debug!(status = %o.status, "xdg-mime query failed");
                return None;
            }
            Err(e) => {
                tracing::debug!(error = %e, "xdg-mime not available");
                return None;
            }
        };

        let handler = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if handler.is_empty() {
            None
        } else {
            Some(handler)
        }
    }
}
