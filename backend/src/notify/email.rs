use crate::config::Config;
use crate::notify::{AlertChannel, ChannelError};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use shared::{Channel, Prediction};

const ALERT_SUBJECT: &str = "Elephant Spotted Near Farm";

/// Emails the farm operator when an elephant is detected.
#[derive(Clone)]
pub struct EmailChannel {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    recipient: Mailbox,
}

impl EmailChannel {
    /// Builds the SMTP transport from configuration, with the shared
    /// notification timeout applied to the connection.
    pub fn from_config(config: &Config) -> Result<Self, ChannelError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?
            .timeout(Some(config.notify_timeout));
        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }
        Ok(Self {
            transport: builder.build(),
            from: config.default_from_email.parse()?,
            recipient: config.alert_recipient.parse()?,
        })
    }
}

impl AlertChannel for EmailChannel {
    fn kind(&self) -> Channel {
        Channel::Email
    }

    async fn trigger(&self, detection: &Prediction) -> Result<(), ChannelError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.recipient.clone())
            .subject(ALERT_SUBJECT)
            .body(alert_body(detection))?;
        self.transport.send(message).await?;
        Ok(())
    }
}

fn alert_body(detection: &Prediction) -> String {
    format!(
        "Dear Farmer,\n\
         \n\
         This is an important notification to inform you that an elephant has \
         been sighted near your farm (detected: {}).\n\
         \n\
         Immediate actions recommended:\n\
         \n\
         \x20   - Ensure your safety and that of your family and workers.\n\
         \x20   - Avoid approaching the elephant or attempting to scare it away.\n\
         \n\
         We are committed to your safety and the protection of your crops. \
         Please stay alert and follow the recommended actions.\n\
         \n\
         Stay safe,\n\
         \n\
         Elephant Deterrent\n",
        detection.label
    )
}
