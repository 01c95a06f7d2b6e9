//! Timeout configuration for statement API calls.

use std::time::Duration;

/// Timeouts and polling cadence of [`StrataLinkClient`](crate::StrataLinkClient).
///
/// ```rust
/// use strata_link::StrataLinkTimeouts;
/// use std::time::Duration;
///
/// let timeouts = StrataLinkTimeouts::builder()
///     .request_timeout(Duration::from_secs(60))
///     .poll_interval(Duration::from_millis(250))
///     .build();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrataLinkTimeouts {
    /// TCP + TLS handshake.
    /// Default: 10 seconds
    pub connection_timeout: Duration,

    /// Whole HTTP request, including reading the body.
    /// Default: 30 seconds
    pub request_timeout: Duration,

    /// Delay between status polls while waiting on a statement.
    /// Default: 300 milliseconds
    pub poll_interval: Duration,
}

impl Default for StrataLinkTimeouts {
    fn default() -> Self {
        Self {
            connection_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(300),
        }
    }
}

impl StrataLinkTimeouts {
    pub fn builder() -> StrataLinkTimeoutsBuilder {
        StrataLinkTimeoutsBuilder {
            timeouts: Self::default(),
        }
    }
}

/// Builder for [`StrataLinkTimeouts`]
#[derive(Debug, Clone)]
pub struct StrataLinkTimeoutsBuilder {
    timeouts: StrataLinkTimeouts,
}

impl StrataLinkTimeoutsBuilder {
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.connection_timeout = timeout;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.request_timeout = timeout;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.timeouts.poll_interval = interval;
        self
    }

    pub fn build(self) -> StrataLinkTimeouts {
        self.timeouts
    }
}
