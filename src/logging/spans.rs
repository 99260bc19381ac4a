//! Spans wrapping each component call

use std::time::Instant;
use tracing::field::Empty;
use tracing::{span, Level, Span};
use uuid::Uuid;

/// Span for one extractor or matcher call
pub struct ComponentSpan {
    span: Span,
    start_time: Instant,
    component: &'static str,
}

impl ComponentSpan {
    /// Opens a span, reusing the thread correlation id when one is set
    pub fn new(component: &'static str, operation: &'static str) -> Self {
        let correlation_id = crate::logging::get_correlation_id().unwrap_or_else(Uuid::new_v4);
        let span = span!(
            Level::INFO,
            "component_call",
            component = component,
            operation = operation,
            correlation_id = %correlation_id,
            keypoints = Empty,
            descriptors = Empty,
            matches = Empty,
        );

        Self {
            span,
            start_time: Instant::now(),
            component,
        }
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }

    /// Record feature detection results
    pub fn record_feature_detection(&self, keypoints: usize, descriptors: usize) {
        self.span.record("keypoints", keypoints);
        self.span.record("descriptors", descriptors);
        tracing::debug!(
            parent: &self.span,
            keypoints = keypoints,
            descriptors = descriptors,
            "{} keypoints were detected",
            keypoints
        );
    }

    /// Record matching results
    pub fn record_matching(&self, matches: usize, query_descriptors: usize) {
        self.span.record("matches", matches);
        tracing::debug!(
            parent: &self.span,
            matches = matches,
            query_descriptors = query_descriptors,
            "Matching completed"
        );
    }

    /// Closes the span with its duration
    pub fn finish(self) {
        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        tracing::info!(
            parent: &self.span,
            component = self.component,
            elapsed_ms = elapsed_ms,
            "Component call finished"
        );
    }
}
