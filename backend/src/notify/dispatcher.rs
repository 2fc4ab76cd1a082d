use crate::notify::AlertChannel;
use log::{error, info};
use shared::{NotificationEvent, Prediction};

/// Detection trigger: a case-insensitive substring match on the predicted
/// label. Deliberately kept as one named predicate so a structured taxonomy
/// can replace it without touching the dispatcher.
pub fn is_elephant_label(label: &str) -> bool {
    label.to_lowercase().contains("elephant")
}

/// Fires the notification channels for a detection.
///
/// Dispatch never fails the request: each channel is attempted at most once,
/// failures are caught, logged, and returned as events, and one channel's
/// failure does not suppress the other.
pub struct Dispatcher<E, A> {
    email: E,
    actuator: A,
}

impl<E: AlertChannel, A: AlertChannel> Dispatcher<E, A> {
    pub fn new(email: E, actuator: A) -> Self {
        Self { email, actuator }
    }

    pub async fn dispatch(&self, prediction: &Prediction) -> Vec<NotificationEvent> {
        if !is_elephant_label(&prediction.label) {
            return Vec::new();
        }
        vec![
            attempt(&self.email, prediction).await,
            attempt(&self.actuator, prediction).await,
        ]
    }
}

async fn attempt<C: AlertChannel>(channel: &C, prediction: &Prediction) -> NotificationEvent {
    match channel.trigger(prediction).await {
        Ok(()) => {
            info!("{} alert delivered for \"{}\"", channel.kind(), prediction.label);
            NotificationEvent::delivered(channel.kind())
        }
        Err(e) => {
            error!("{} alert failed: {}", channel.kind(), e);
            NotificationEvent::failed(channel.kind(), e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::ChannelError;
    use shared::Channel;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct RecordingChannel {
        kind: Channel,
        attempts: AtomicUsize,
        fail: bool,
    }

    impl RecordingChannel {
        fn new(kind: Channel, fail: bool) -> Self {
            Self {
                kind,
                attempts: AtomicUsize::new(0),
                fail,
            }
        }

        fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    impl AlertChannel for &RecordingChannel {
        fn kind(&self) -> Channel {
            self.kind
        }

        async fn trigger(&self, _detection: &Prediction) -> Result<(), ChannelError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(ChannelError::ActuatorStatus(
                    reqwest::StatusCode::INTERNAL_SERVER_ERROR,
                ))
            } else {
                Ok(())
            }
        }
    }

    fn prediction(label: &str) -> Prediction {
        Prediction {
            label: label.to_string(),
            confidence: 0.97,
        }
    }

    #[test]
    fn elephant_predicate_matches_any_case() {
        assert!(is_elephant_label("African elephant"));
        assert!(is_elephant_label("ELEPHANT"));
        assert!(is_elephant_label("Indian Elephant, Elephas maximus"));
        assert!(!is_elephant_label("tabby cat"));
        assert!(!is_elephant_label(""));
    }

    #[actix_web::test]
    async fn detection_attempts_both_channels_exactly_once() {
        let email = RecordingChannel::new(Channel::Email, false);
        let actuator = RecordingChannel::new(Channel::Actuator, false);
        let dispatcher = Dispatcher::new(&email, &actuator);

        let events = dispatcher.dispatch(&prediction("African elephant")).await;

        assert_eq!(email.attempts(), 1);
        assert_eq!(actuator.attempts(), 1);
        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.success));
        assert_eq!(events[0].channel, Channel::Email);
        assert_eq!(events[1].channel, Channel::Actuator);
    }

    #[actix_web::test]
    async fn non_detection_attempts_no_channels() {
        let email = RecordingChannel::new(Channel::Email, false);
        let actuator = RecordingChannel::new(Channel::Actuator, false);
        let dispatcher = Dispatcher::new(&email, &actuator);

        let events = dispatcher.dispatch(&prediction("tabby cat")).await;

        assert!(events.is_empty());
        assert_eq!(email.attempts(), 0);
        assert_eq!(actuator.attempts(), 0);
    }

    #[actix_web::test]
    async fn email_failure_does_not_suppress_the_actuator() {
        let email = RecordingChannel::new(Channel::Email, true);
        let actuator = RecordingChannel::new(Channel::Actuator, false);
        let dispatcher = Dispatcher::new(&email, &actuator);

        let events = dispatcher.dispatch(&prediction("elephant")).await;

        assert_eq!(email.attempts(), 1);
        assert_eq!(actuator.attempts(), 1);
        assert!(!events[0].success);
        assert!(events[0].error.as_deref().unwrap_or("").contains("500"));
        assert!(events[1].success);
    }

    #[actix_web::test]
    async fn both_channels_failing_still_returns_two_events() {
        let email = RecordingChannel::new(Channel::Email, true);
        let actuator = RecordingChannel::new(Channel::Actuator, true);
        let dispatcher = Dispatcher::new(&email, &actuator);

        let events = dispatcher.dispatch(&prediction("elephant")).await;

        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| !e.success));
    }
}
