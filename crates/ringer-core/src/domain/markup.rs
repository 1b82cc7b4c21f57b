//! Voice-markup payloads.
//!
//! The dispatcher never parses markup. It only wraps message text in a fixed
//! `<Response><Say>` envelope and hands the string to the backend as-is.

use quick_xml::escape::escape;
use serde::{Deserialize, Serialize};

use super::request::VoiceOptions;

/// What the backend should play once the call connects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum MessagePayload {
    /// Literal voice markup, passed through unmodified.
    Markup(String),

    /// URL the backend fetches markup from.
    Url(String),
}

impl MessagePayload {
    /// Wrap plain message text in the standard say-envelope.
    pub fn say(message: &str, voice: Option<&VoiceOptions>) -> Self {
        Self::Markup(VoiceMarkup::say(message, voice))
    }
}

/// Builder for the fixed wrapper markup.
pub struct VoiceMarkup;

impl VoiceMarkup {
    /// `<Response><Say voice=".." language="..">text</Say></Response>`
    pub fn say(message: &str, voice: Option<&VoiceOptions>) -> String {
        let mut attrs = String::new();
        if let Some(opts) = voice {
            if let Some(v) = opts.voice.as_deref() {
                attrs.push_str(&format!(" voice=\"{}\"", escape(v)));
            }
            if let Some(lang) = opts.language.as_deref() {
                attrs.push_str(&format!(" language=\"{}\"", escape(lang)));
            }
        }
        format!("<Response><Say{attrs}>{}</Say></Response>", escape(message))
    }
}
