//! Build the final message handed to the mail client.
//!
//! The body lists one line per attachment (`<file name> <summary>`), the
//! attachment list renders every path through the profile's attachment
//! template, and both are substituted into the profile's message template.
//! Substituted values are escaped for the profile's dispatch mode.

pub mod escape;
pub mod mailto;

use std::borrow::Cow;

use crate::error::{Error, Result};
use crate::metadata::MetadataSource;
use crate::model::attachment::AttachmentRecord;
use crate::model::profile::{DispatchMode, Profile};

use self::escape::{escape_path, escape_text};

pub use mailto::{decode_mailto, MailtoParts};

/// Maximum size of a composed message, in bytes.
pub const MESSAGE_CAPACITY: usize = 4096;

/// A message ready to be dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposedMessage {
    text: String,
    mode: DispatchMode,
}

impl ComposedMessage {
    /// Wrap `text`, rejecting anything above [`MESSAGE_CAPACITY`].
    pub fn new(text: impl Into<String>, mode: DispatchMode) -> Result<Self> {
        let text = text.into();
        if text.len() > MESSAGE_CAPACITY {
            return Err(Error::BufferOverflow {
                len: text.len(),
                capacity: MESSAGE_CAPACITY,
            });
        }
        Ok(Self { text, mode })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn dispatch_mode(&self) -> DispatchMode {
        self.mode
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl std::fmt::Display for ComposedMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Compose the message for `records` using `profile`.
pub fn compose(
    profile: &Profile,
    subject: &str,
    records: &[AttachmentRecord],
    metadata: &dyn MetadataSource,
) -> Result<ComposedMessage> {
    let mode = profile.dispatch_mode;
    let subject = field_text(profile, subject);
    let body = field_text(profile, &body(records, metadata)).into_owned();
    let attachments = attachments(profile, records)?;

    let text = render(profile.template, |name| match name {
        "subject" => Some(escape_text(&subject, mode).into_owned()),
        "body" => Some(escape_text(&body, mode).into_owned()),
        "attachments" => Some(attachments.clone()),
        _ => None,
    });

    let message = ComposedMessage::new(text, mode)?;
    tracing::debug!(
        profile = profile.name,
        attachments = records.len(),
        bytes = message.as_str().len(),
        "Composed message"
    );
    Ok(message)
}

/// Unescaped mail body, one line per record.
pub fn body(records: &[AttachmentRecord], metadata: &dyn MetadataSource) -> String {
    records
        .iter()
        .map(|r| format!("{} {}\n", r.basename(), metadata.summary(r.image_id)))
        .collect()
}

/// Attachment list rendered and escaped for `profile`.
///
/// Fails with [`Error::InvalidPath`] for a path the client would split or
/// cut short: one containing the profile's field quote, or the attachment
/// separator once escaped.
pub fn attachments(profile: &Profile, records: &[AttachmentRecord]) -> Result<String> {
    let rendered = records
        .iter()
        .map(|r| {
            let raw = r.file.to_string_lossy();
            let path = escape_path(&raw, profile.dispatch_mode);

            let quoted = profile.field_quote.is_some_and(|q| raw.contains(q));
            let separated = !profile.attachment_separator.is_empty()
                && path.contains(profile.attachment_separator);
            if quoted || separated {
                tracing::warn!(
                    profile = profile.name,
                    file = %r.file.display(),
                    "Attachment path cannot be passed to this mail client"
                );
                return Err(Error::InvalidPath(format!(
                    "'{raw}' cannot be attached with {}",
                    profile.name
                )));
            }

            Ok(render(profile.attachment_template, |name| {
                (name == "path").then(|| path.to_string())
            }))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(rendered.join(profile.attachment_separator))
}

/// Replace the profile's field quote in free text by a typographic
/// apostrophe, which the client shows the same way.
fn field_text<'a>(profile: &Profile, text: &'a str) -> Cow<'a, str> {
    match profile.field_quote {
        Some(q) if text.contains(q) => Cow::Owned(text.replace(q, "\u{2019}")),
        _ => Cow::Borrowed(text),
    }
}

/// Replace `{name}` placeholders in a single pass.
///
/// Substituted text is never scanned again, and placeholders `lookup` does
/// not know are copied as-is.
fn render(template: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}').and_then(|close| {
            lookup(&after[..close]).map(|value| (close, value))
        }) {
            Some((close, value)) => {
                out.push_str(&value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
