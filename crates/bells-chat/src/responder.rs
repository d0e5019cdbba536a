//! Response backends.
//!
//! The orchestrator only sees [`Responder`]. The canned implementation
//! classifies and renders synchronously, then holds the answer for a fixed
//! delay so the pending state is observable. A networked backend would
//! replace the delay with a real request.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use bells_core::types::ResponseDocument;

use crate::error::ChatError;
use crate::matcher::{IntentMatcher, TemplateId};
use crate::normalizer::normalize;
use crate::response::{ResponseRenderer, TemplateLibrary};

/// Produces the assistant's answer to a user query.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Answer `query`. This is the single suspension point of a turn and
    /// may be abandoned at any time by the caller.
    async fn respond(&self, query: &str) -> Result<ResponseDocument, ChatError>;
}

#[async_trait]
impl<T: Responder + ?Sized> Responder for Arc<T> {
    async fn respond(&self, query: &str) -> Result<ResponseDocument, ChatError> {
        (**self).respond(query).await
    }
}

// =============================================================================
// CannedResponder
// =============================================================================

/// Keyword matcher plus template table, released after a fixed delay.
pub struct CannedResponder {
    matcher: IntentMatcher,
    renderer: Arc<dyn ResponseRenderer>,
    delay: Duration,
}

impl CannedResponder {
    pub fn new(matcher: IntentMatcher, renderer: Arc<dyn ResponseRenderer>, delay: Duration) -> Self {
        Self {
            matcher,
            renderer,
            delay,
        }
    }

    /// Campus rules and templates with the given reply delay.
    pub fn campus(delay: Duration) -> Self {
        Self::new(
            IntentMatcher::campus(),
            Arc::new(TemplateLibrary::campus()),
            delay,
        )
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Classify and render without waiting.
    pub fn answer(&self, query: &str) -> (TemplateId, ResponseDocument) {
        let template = self.matcher.classify(&normalize(query));
        (template, self.renderer.render(template))
    }
}

#[async_trait]
impl Responder for CannedResponder {
    async fn respond(&self, query: &str) -> Result<ResponseDocument, ChatError> {
        let (template, document) = self.answer(query);
        tracing::debug!(
            template = %template,
            delay_ms = self.delay.as_millis() as u64,
            "Canned response ready"
        );
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(document)
    }
}
