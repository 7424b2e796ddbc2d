//! Mail client profiles.
//!
//! A profile is a message template plus the rules used to fill it in. The
//! templates use `{subject}`, `{body}` and `{attachments}` placeholders, and
//! the attachment template uses `{path}`.

use serde::Serialize;

/// How a composed message is handed to the operating environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchMode {
    /// The message is a URI opened by the desktop's URI handler.
    UriHandler,
    /// The message is a shell command line run as a child process.
    Subprocess,
}

/// Template and dispatch configuration for one mail client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    /// Short name of the client (`"mailto"`, `"thunderbird"`, `"kmail"`).
    pub name: &'static str,

    /// Template of the whole message.
    pub template: &'static str,

    /// Template of a single attachment.
    pub attachment_template: &'static str,

    /// Inserted between two rendered attachments.
    pub attachment_separator: &'static str,

    /// How the final message is dispatched.
    pub dispatch_mode: DispatchMode,

    /// Quote delimiting the client's own fields inside the message, if any.
    ///
    /// Such a client has no escape for its quote: text values get the
    /// typographic apostrophe instead, and paths containing it are rejected.
    pub field_quote: Option<char>,
}

impl Profile {
    /// Generic `mailto:` URI understood by any mail client.
    pub const fn mailto() -> Self {
        Self {
            name: "mailto",
            template: "mailto:?subject={subject}&body={body}{attachments}",
            attachment_template: "&attachment=file://{path}",
            attachment_separator: "",
            dispatch_mode: DispatchMode::UriHandler,
            field_quote: None,
        }
    }

    /// Thunderbird, driven through its `-compose` command line option.
    pub const fn thunderbird() -> Self {
        Self {
            name: "thunderbird",
            template: "thunderbird -compose \"to='',subject='{subject}',body='{body}',attachment='{attachments}'\"",
            attachment_template: "{path}",
            attachment_separator: ",",
            dispatch_mode: DispatchMode::Subprocess,
            field_quote: Some('\''),
        }
    }

    /// KMail, launched directly since it drops attachments given as `mailto:`.
    pub const fn kmail() -> Self {
        Self {
            name: "kmail",
            template: "kmail --composer --subject \"{subject}\" --body \"{body}\" --attach \"{attachments}\"",
            attachment_template: "{path}",
            attachment_separator: "\" --attach \"",
            dispatch_mode: DispatchMode::Subprocess,
            field_quote: None,
        }
    }

    /// `true` for the generic mailto profile.
    pub fn is_generic(&self) -> bool {
        self.name == "mailto"
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::mailto()
    }
}
