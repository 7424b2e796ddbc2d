//! Parsing of generic `mailto:` messages.
//!
//! Used to check what a mail client will see when it receives a URI built
//! from [`Profile::mailto`](crate::model::profile::Profile::mailto).

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Decoded content of a `mailto:` URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailtoParts {
    pub subject: String,
    pub body: String,
    pub attachments: Vec<PathBuf>,
}

/// Decode a `mailto:` URI into its subject, body and attachment paths.
///
/// Unknown query fields are ignored. Attachments keep their order.
pub fn decode_mailto(uri: &str) -> Result<MailtoParts> {
    let rest = uri
        .strip_prefix("mailto:")
        .ok_or_else(|| Error::InvalidMailto(format!("missing scheme in '{uri}'")))?;

    let query = match rest.split_once('?') {
        Some((_to, query)) => query,
        None => return Ok(MailtoParts::default()),
    };

    let mut parts = MailtoParts::default();
    for field in query.split('&').filter(|f| !f.is_empty()) {
        let (key, value) = field
            .split_once('=')
            .ok_or_else(|| Error::InvalidMailto(format!("field without value: '{field}'")))?;
        let value = urlencoding::decode(value)
            .map_err(|e| Error::InvalidMailto(format!("{key}: {e}")))?
            .into_owned();

        match key {
            "subject" => parts.subject = value,
            "body" => parts.body = value,
            "attachment" => {
                let path = value.strip_prefix("file://").unwrap_or(&value);
                parts.attachments.push(PathBuf::from(path));
            }
            _ => tracing::trace!(key, "Ignoring mailto field"),
        }
    }

    Ok(parts)
}
