//! Domain model (phone numbers, requests, payloads, outcomes, call states, errors).

pub mod call_state;
pub mod errors;
pub mod ids;
pub mod markup;
pub mod outcome;
pub mod phone;
pub mod request;

pub use call_state::{BackendCallState, UnknownCallState};
pub use errors::{BackendError, BackendErrorKind, DispatchError, LookupError, ValidationError};
pub use ids::{BatchId, CallRef};
pub use markup::{MessagePayload, VoiceMarkup};
pub use outcome::{CallOutcome, FailureKind, SubmissionStatus};
pub use phone::{PhoneNumber, PhoneNumberError};
pub use request::{CallRequest, DispatchBatch, Message, VoiceOptions};
