use crate::notify::{AlertChannel, ChannelError};
use shared::{Channel, Prediction};
use std::time::Duration;

/// Activates the physical deterrent over HTTP.
#[derive(Clone)]
pub struct ActuatorChannel {
    client: reqwest::Client,
    endpoint: String,
}

impl ActuatorChannel {
    /// Builds the channel with a bounded request timeout so an unreachable
    /// device cannot stall a request indefinitely.
    pub fn new(endpoint: String, timeout: Duration) -> Result<Self, ChannelError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }
}

impl AlertChannel for ActuatorChannel {
    fn kind(&self) -> Channel {
        Channel::Actuator
    }

    async fn trigger(&self, _detection: &Prediction) -> Result<(), ChannelError> {
        let response = self.client.get(&self.endpoint).send().await?;
        if response.status() != reqwest::StatusCode::OK {
            return Err(ChannelError::ActuatorStatus(response.status()));
        }
        Ok(())
    }
}
