//! Scripted mock model for deterministic tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use cds_core::{CdsError, GenerativeModel, ModelMessage, Result};

/// A [`GenerativeModel`] that replays scripted responses in order and
/// records every request it receives.
///
/// Running out of scripted responses is an error, which makes "the model
/// must not be called" assertions trivial: script nothing and any call
/// fails the test.
#[derive(Debug, Default)]
pub struct MockModel {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<Vec<ModelMessage>>>,
}

impl MockModel {
    /// Create a mock that returns the given responses, in order.
    pub fn new(responses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock with no scripted responses: any call fails.
    pub fn unreachable() -> Self {
        Self::default()
    }

    /// Number of completed calls.
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The message sequences received so far, in call order.
    pub fn requests(&self) -> Vec<Vec<ModelMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeModel for MockModel {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, messages: &[ModelMessage]) -> Result<String> {
        self.requests.lock().unwrap().push(messages.to_vec());
        self.responses.lock().unwrap().pop_front().ok_or_else(|| CdsError::Upstream {
            service: "mock".into(),
            message: "no scripted response left".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_responses_in_order_then_errors() {
        let mock = MockModel::new(["first", "second"]);
        let messages = [ModelMessage::user("hi")];

        assert_eq!(mock.complete(&messages).await.unwrap(), "first");
        assert_eq!(mock.complete(&messages).await.unwrap(), "second");
        assert!(mock.complete(&messages).await.is_err());
        assert_eq!(mock.calls(), 3);
    }
}
