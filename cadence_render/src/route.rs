// Copyright 2026 the Cadence Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Quality report routing.
//!
//! A [`QualityRoute`] is the [`QualitySink`] the renderer hands to the
//! scheduler. It forwards each report to an explicit override sink when one is
//! installed, and otherwise to the quality sink of the connected
//! [`UpstreamPeer`], which is queried on first use and cached until the peer
//! changes. With neither, sends fail with [`SendError::Disconnected`].

use std::sync::Arc;

use cadence_core::quality::{QualityMessage, QualitySink, SendError};

/// A boxed sink that can move between threads with the renderer.
pub type BoxedQualitySink = Box<dyn QualitySink + Send>;

/// The component feeding samples to the renderer.
pub trait UpstreamPeer: Send + Sync {
    /// Returns the peer's quality sink, if it accepts quality reports.
    fn quality_sink(&self) -> Option<BoxedQualitySink>;
}

/// Selects where quality reports go.
#[derive(Default)]
pub struct QualityRoute {
    override_sink: Option<BoxedQualitySink>,
    peer: Option<Arc<dyn UpstreamPeer>>,
    peer_sink: Option<BoxedQualitySink>,
    peer_queried: bool,
    last_error: Option<SendError>,
}

impl core::fmt::Debug for QualityRoute {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("QualityRoute")
            .field("has_override", &self.override_sink.is_some())
            .field("has_peer", &self.peer.is_some())
            .field("peer_queried", &self.peer_queried)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

impl QualityRoute {
    /// Creates a route with no destination.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs (or with `None`, removes) a sink that takes priority over the
    /// upstream peer. Returns the previous override.
    pub fn set_override(&mut self, sink: Option<BoxedQualitySink>) -> Option<BoxedQualitySink> {
        core::mem::replace(&mut self.override_sink, sink)
    }

    /// Connects a new upstream peer, discarding any cached peer sink.
    pub fn connect(&mut self, peer: Arc<dyn UpstreamPeer>) {
        self.peer = Some(peer);
        self.forget_peer_sink();
    }

    /// Disconnects the upstream peer.
    pub fn disconnect(&mut self) {
        self.peer = None;
        self.forget_peer_sink();
    }

    /// Returns `true` if a report would currently have somewhere to go
    /// without querying the peer.
    #[must_use]
    pub fn has_override(&self) -> bool {
        self.override_sink.is_some()
    }

    /// The outcome of the most recent send, as an error if it failed.
    #[must_use]
    pub fn last_error(&self) -> Option<SendError> {
        self.last_error
    }

    fn forget_peer_sink(&mut self) {
        self.peer_sink = None;
        self.peer_queried = false;
    }

    fn deliver(&mut self, message: &QualityMessage) -> Result<(), SendError> {
        if let Some(sink) = &mut self.override_sink {
            return sink.send(message);
        }
        if !self.peer_queried {
            self.peer_queried = true;
            self.peer_sink = self.peer.as_ref().and_then(|peer| peer.quality_sink());
        }
        match &mut self.peer_sink {
            Some(sink) => sink.send(message),
            None => Err(SendError::Disconnected),
        }
    }
}

impl QualitySink for QualityRoute {
    fn send(&mut self, message: &QualityMessage) -> Result<(), SendError> {
        let result = self.deliver(message);
        let error = result.err();
        if error != self.last_error {
            match error {
                Some(err) => tracing::debug!(%err, "quality report not handled upstream"),
                None => tracing::debug!("upstream is handling quality reports"),
            }
            self.last_error = error;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use cadence_core::quality::QualityKind;
    use cadence_core::time::StreamTime;

    use super::*;

    /// Counts deliveries into a shared counter.
    struct Counting(Arc<AtomicUsize>);

    impl QualitySink for Counting {
        fn send(&mut self, _message: &QualityMessage) -> Result<(), SendError> {
            self.0.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
    }

    struct Peer {
        queries: AtomicUsize,
        delivered: Arc<AtomicUsize>,
    }

    impl UpstreamPeer for Peer {
        fn quality_sink(&self) -> Option<BoxedQualitySink> {
            self.queries.fetch_add(1, Ordering::Relaxed);
            Some(Box::new(Counting(Arc::clone(&self.delivered))))
        }
    }

    fn message() -> QualityMessage {
        QualityMessage {
            kind: QualityKind::Famine,
            proportion: 1000,
            late: 0,
            timestamp: StreamTime::ZERO,
        }
    }

    fn peer() -> Arc<Peer> {
        Arc::new(Peer {
            queries: AtomicUsize::new(0),
            delivered: Arc::new(AtomicUsize::new(0)),
        })
    }

    #[test]
    fn empty_route_is_disconnected() {
        let mut route = QualityRoute::new();
        assert_eq!(route.send(&message()), Err(SendError::Disconnected));
        assert_eq!(route.last_error(), Some(SendError::Disconnected));
    }

    #[test]
    fn peer_sink_is_queried_once() {
        let peer = peer();
        let mut route = QualityRoute::new();
        route.connect(peer.clone());
        for _ in 0..5 {
            assert_eq!(route.send(&message()), Ok(()));
        }
        assert_eq!(peer.queries.load(Ordering::Relaxed), 1);
        assert_eq!(peer.delivered.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn override_takes_priority() {
        let peer = peer();
        let overridden = Arc::new(AtomicUsize::new(0));
        let mut route = QualityRoute::new();
        route.connect(peer.clone());
        _ = route.set_override(Some(Box::new(Counting(Arc::clone(&overridden)))));
        assert!(route.has_override());
        assert_eq!(route.send(&message()), Ok(()));
        assert_eq!(overridden.load(Ordering::Relaxed), 1);
        assert_eq!(peer.queries.load(Ordering::Relaxed), 0, "peer never consulted");

        assert!(route.set_override(None).is_some());
        assert_eq!(route.send(&message()), Ok(()));
        assert_eq!(peer.delivered.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn reconnect_clears_the_cache() {
        let peer = peer();
        let mut route = QualityRoute::new();
        route.connect(peer.clone());
        _ = route.send(&message());
        route.connect(peer.clone());
        _ = route.send(&message());
        assert_eq!(peer.queries.load(Ordering::Relaxed), 2);

        route.disconnect();
        assert_eq!(route.send(&message()), Err(SendError::Disconnected));
    }
}
