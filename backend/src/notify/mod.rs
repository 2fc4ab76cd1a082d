pub mod actuator;
pub mod dispatcher;
pub mod email;

pub use actuator::ActuatorChannel;
pub use dispatcher::{Dispatcher, is_elephant_label};
pub use email::EmailChannel;

use shared::{Channel, Prediction};

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("SMTP transport error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
    #[error("invalid mail message: {0}")]
    Mail(#[from] lettre::error::Error),
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("actuator request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("actuator returned status {0}")]
    ActuatorStatus(reqwest::StatusCode),
}

/// One notification mechanism. A channel failure is a value for the
/// dispatcher to log; it never propagates out of a dispatch.
pub trait AlertChannel {
    fn kind(&self) -> Channel;

    async fn trigger(&self, detection: &Prediction) -> Result<(), ChannelError>;
}
