//! vg-whatsapp: WhatsApp gateway for voicegate via the Twilio API
//!
//! Outbound message delivery (text or media URL) and authenticated
//! retrieval of inbound media attachments.

pub mod error;
pub mod twilio;

pub use error::{Result, WhatsAppError};
pub use twilio::TwilioClient;
