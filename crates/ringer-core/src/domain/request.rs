//! Call requests and the batch they are prepared into.

use serde::{Deserialize, Serialize};
use url::Url;

use super::errors::ValidationError;
use super::markup::MessagePayload;
use super::phone::PhoneNumber;

/// Voice selection for the say-envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl VoiceOptions {
    pub fn new(voice: Option<&str>, language: Option<&str>) -> Self {
        Self {
            voice: voice.map(str::to_string),
            language: language.map(str::to_string),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.voice.is_none() && self.language.is_none()
    }
}

/// What a call says: the say-envelope around plain text, or markup fetched from a URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Message {
    Say {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        voice: Option<VoiceOptions>,
    },
    MarkupUrl { url: String },
}

impl Message {
    /// Plain text for the say-envelope. Blank text is rejected.
    pub fn say(text: impl Into<String>, voice: Option<VoiceOptions>) -> Result<Self, ValidationError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ValidationError::EmptyTemplate);
        }
        Ok(Self::Say {
            text,
            voice: voice.filter(|v| !v.is_empty()),
        })
    }

    /// Absolute http(s) URL the backend fetches markup from.
    pub fn markup_url(raw: &str) -> Result<Self, ValidationError> {
        let invalid = |reason: String| ValidationError::InvalidMarkupUrl {
            value: raw.to_string(),
            reason,
        };
        let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
        }
        Ok(Self::MarkupUrl { url: url.into() })
    }

    /// The payload sent to the backend.
    pub fn payload(&self) -> MessagePayload {
        match self {
            Self::Say { text, voice } => MessagePayload::say(text, voice.as_ref()),
            Self::MarkupUrl { url } => MessagePayload::Url(url.clone()),
        }
    }
}

/// One outbound call to place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRequest {
    pub destination: PhoneNumber,
    pub message: Message,
}

impl CallRequest {
    pub fn new(destination: PhoneNumber, message: Message) -> Self {
        Self {
            destination,
            message,
        }
    }

    pub fn payload(&self) -> MessagePayload {
        self.message.payload()
    }
}

/// Ordered requests for one dispatch, validated as a whole.
#[derive(Debug, Clone, Default)]
pub struct DispatchBatch {
    requests: Vec<CallRequest>,
}

impl DispatchBatch {
    /// Validate every destination up front: one malformed number rejects the batch.
    pub fn prepare<S: AsRef<str>>(
        message: &Message,
        destinations: &[S],
    ) -> Result<Self, ValidationError> {
        let mut requests = Vec::with_capacity(destinations.len());
        for (index, raw) in destinations.iter().enumerate() {
            let raw = raw.as_ref();
            let destination =
                PhoneNumber::parse(raw).map_err(|source| ValidationError::InvalidDestination {
                    index,
                    value: raw.to_string(),
                    source,
                })?;
            requests.push(CallRequest::new(destination, message.clone()));
        }
        Ok(Self { requests })
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn requests(&self) -> &[CallRequest] {
        &self.requests
    }
}

impl IntoIterator for DispatchBatch {
    type Item = CallRequest;
    type IntoIter = std::vec::IntoIter<CallRequest>;

    fn into_iter(self) -> Self::IntoIter {
        self.requests.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::phone::PhoneNumberError;
    use rstest::rstest;

    fn hello() -> Message {
        Message::say("hello", None).unwrap()
    }

    #[test]
    fn prepare_keeps_input_order_and_duplicates() {
        let batch = DispatchBatch::prepare(
            &hello(),
            &["+15550000001", "+15550000002", "+15550000001"],
        )
        .unwrap();
        let numbers: Vec<&str> = batch
            .requests()
            .iter()
            .map(|r| r.destination.as_str())
            .collect();
        assert_eq!(numbers, vec!["+15550000001", "+15550000002", "+15550000001"]);
    }

    #[test]
    fn prepare_rejects_whole_batch_on_one_bad_number() {
        let err = DispatchBatch::prepare(&hello(), &["+15550000001", "555-0102"]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidDestination {
                index: 1,
                value: "555-0102".to_string(),
                source: PhoneNumberError::MissingPlus,
            }
        );
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\n\t")]
    fn blank_text_is_rejected(#[case] text: &str) {
        assert_eq!(Message::say(text, None), Err(ValidationError::EmptyTemplate));
    }

    #[test]
    fn empty_destinations_make_an_empty_batch() {
        let empty: [&str; 0] = [];
        assert!(DispatchBatch::prepare(&hello(), &empty).unwrap().is_empty());
    }

    #[test]
    fn empty_voice_options_are_dropped() {
        let message = Message::say("hi", Some(VoiceOptions::default())).unwrap();
        assert_eq!(message, Message::Say { text: "hi".to_string(), voice: None });

        let dest = PhoneNumber::parse("+15550000001").unwrap();
        assert_eq!(
            CallRequest::new(dest, message).payload(),
            MessagePayload::Markup("<Response><Say>hi</Say></Response>".to_string())
        );
    }

    #[test]
    fn markup_url_becomes_url_payload() {
        let message = Message::markup_url("https://example.com/voice.xml").unwrap();
        assert_eq!(
            message.payload(),
            MessagePayload::Url("https://example.com/voice.xml".to_string())
        );
    }

    #[rstest]
    #[case("")]
    #[case("voice.xml")]
    #[case("ftp://example.com/voice.xml")]
    #[case("file:///etc/passwd")]
    fn unusable_markup_urls_are_rejected(#[case] raw: &str) {
        assert!(matches!(
            Message::markup_url(raw),
            Err(ValidationError::InvalidMarkupUrl { .. })
        ));
    }
}
