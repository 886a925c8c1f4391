use std::sync::Arc;

use tracing::{error, info, warn};

use crate::caption::ComposedMessage;
use crate::error::RelayError;
use crate::platform::{Messenger, OutgoingMessage};

/// Result of one destination's send attempt.
#[derive(Debug)]
pub enum DeliveryOutcome {
    Delivered { with_media: bool },
    Failed(RelayError),
}

#[derive(Debug)]
pub struct DispatchReport {
    /// One entry per configured destination, in configured order.
    pub outcomes: Vec<(String, DeliveryOutcome)>,
    /// Set when a poster was expected but could not be fetched.
    pub media_fallback: bool,
}

impl DispatchReport {
    pub fn delivered(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, DeliveryOutcome::Delivered { .. }))
            .count()
    }
}

/// Sends composed messages to the fixed list of destinations.
pub struct Dispatcher {
    messenger: Arc<dyn Messenger>,
    destinations: Vec<String>,
}

impl Dispatcher {
    pub fn new(messenger: Arc<dyn Messenger>, destinations: Vec<String>) -> Self {
        Self {
            messenger,
            destinations,
        }
    }

    /// Deliver `message` to every destination in order.
    ///
    /// Never fails: a poster that cannot be fetched degrades to a text-only
    /// send, and a failing destination does not stop the remaining ones.
    pub async fn dispatch(&self, message: &ComposedMessage) -> DispatchReport {
        let mut media_fallback = false;

        let outgoing = match &message.poster_url {
            Some(url) => match self.messenger.fetch_media(url).await {
                Ok(media) => OutgoingMessage::Media {
                    media,
                    caption: message.caption.clone(),
                },
                Err(source) => {
                    let err = RelayError::MediaFetch {
                        url: url.clone(),
                        source,
                    };
                    warn!("{}; sending text only", err);
                    media_fallback = true;
                    OutgoingMessage::Text(message.caption.clone())
                }
            },
            None => OutgoingMessage::Text(message.caption.clone()),
        };
        let with_media = matches!(outgoing, OutgoingMessage::Media { .. });

        let mut outcomes = Vec::with_capacity(self.destinations.len());
        for destination in &self.destinations {
            let outcome = match self.messenger.send(destination, &outgoing).await {
                Ok(()) => DeliveryOutcome::Delivered { with_media },
                Err(source) => DeliveryOutcome::Failed(RelayError::Delivery {
                    destination: destination.clone(),
                    source,
                }),
            };
            outcomes.push((destination.clone(), outcome));
        }

        let report = DispatchReport {
            outcomes,
            media_fallback,
        };
        for (destination, outcome) in &report.outcomes {
            match outcome {
                DeliveryOutcome::Delivered { with_media } => {
                    info!("Message sent to {} (poster: {})", destination, with_media)
                }
                DeliveryOutcome::Failed(err) => error!("{}", err),
            }
        }
        info!(
            "Notification sent to {}/{} destinations{}",
            report.delivered(),
            self.destinations.len(),
            if report.media_fallback { " (without poster)" } else { "" }
        );
        report
    }
}
