pub mod channel;
pub mod envelope;
pub mod trust;

pub use channel::{Endpoint, Messenger, link};
pub use envelope::{Envelope, Message};
pub use trust::TrustGate;
