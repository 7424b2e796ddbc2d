//! Collaborators used when a batch is finalized.

use crate::compose::{compose, ComposedMessage};
use crate::error::Result;
use crate::launch::{LaunchHandle, Launcher, SystemLauncher};
use crate::metadata::{MetadataSource, NoMetadata};
use crate::model::attachment::AttachmentRecord;
use crate::model::profile::Profile;
use crate::profile::ProfileResolver;

/// Default mail subject.
pub const DEFAULT_SUBJECT: &str = "images exported from exportmail";

/// Resolves the mail client, composes the message and launches it.
pub struct Mailer {
    resolver: ProfileResolver,
    metadata: Box<dyn MetadataSource>,
    launcher: Box<dyn Launcher>,
    subject: String,
}

impl Mailer {
    pub fn new(resolver: ProfileResolver, launcher: impl Launcher + 'static) -> Self {
        Self {
            resolver,
            metadata: Box::new(NoMetadata),
            launcher: Box::new(launcher),
            subject: DEFAULT_SUBJECT.to_string(),
        }
    }

    pub fn with_metadata(mut self, metadata: impl MetadataSource + 'static) -> Self {
        self.metadata = Box::new(metadata);
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Resolve the profile and compose the message, without launching it.
    pub fn prepare(&self, records: &[AttachmentRecord]) -> Result<(Profile, ComposedMessage)> {
        let profile = self.resolver.resolve();
        let message = compose(&profile, &self.subject, records, self.metadata.as_ref())?;
        Ok((profile, message))
    }

    /// Compose the message for `records` and dispatch it.
    pub fn send(&self, records: &[AttachmentRecord]) -> Result<LaunchHandle> {
        let (profile, message) = self.prepare(records)?;
        tracing::info!(
            profile = profile.name,
            attachments = records.len(),
            "Sending batch to mail client"
        );
        self.launcher.dispatch(&message, profile.dispatch_mode)
    }
}

impl Default for Mailer {
    fn default() -> Self {
        Self::new(ProfileResolver::default(), SystemLauncher)
    }
}

impl std::fmt::Debug for Mailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mailer")
            .field("resolver", &self.resolver)
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}
