//! Platform envelopes
//!
//! Typed views of the JSON the voice platform sends and expects back. Only
//! the fields the skill reads or writes are modelled; everything else in the
//! inbound document is ignored.

pub mod request;
pub mod response;

pub use request::{
    Context, Device, Intent, Request, RequestEnvelope, RequestType, Session, SessionEndedError,
    Slot, SystemState, User,
};
pub use response::{
    escape_ssml, strip_ssml, wrap_ssml, OutputSpeech, Reprompt, Response, ResponseBuilder,
    ResponseEnvelope, SPEAK_CLOSE, SPEAK_OPEN,
};

/// Envelope format version echoed back in every response
pub const ENVELOPE_VERSION: &str = "1.0";
