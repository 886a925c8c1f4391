/// Failures the relay distinguishes between.
///
/// Only [`RelayError::MissingItem`] is visible to the webhook caller (as a
/// `400`). Everything past that boundary ends up in the logs and in the
/// [`DispatchReport`](crate::dispatch::DispatchReport).
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The payload was empty, not JSON, or had no usable `Item` object.
    #[error("No valid item data")]
    MissingItem,

    /// Downloading the poster image failed.
    #[error("poster fetch failed for {url}: {source:#}")]
    MediaFetch {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    /// Sending to one destination failed.
    #[error("delivery to {destination} failed: {source:#}")]
    Delivery {
        destination: String,
        #[source]
        source: anyhow::Error,
    },

    /// A configured destination is neither a chat id nor an `@username`.
    #[error("invalid destination '{0}': expected a numeric chat id or @username")]
    InvalidDestination(String),
}
