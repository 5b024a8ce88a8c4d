use crate::ai::{error::AiError, provider::AiProvider, types::*};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Mock behavior for the mock provider
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MockBehavior {
    /// Reply with a fixed text
    #[default]
    Success,
    /// Reply with the given text
    Reply { text: String },
    /// Always fail as if the API returned a server error
    AlwaysError,
    /// Wait for [`MockProvider::release`] before replying with `text`
    Gated { text: String },
    /// Pops one behavior per call; falls back to `Success` when empty
    BehaviorQueue { behaviors: Vec<MockBehavior> },
}

/// Mock AI provider for testing
#[derive(Clone)]
pub struct MockProvider {
    behavior: Arc<Mutex<MockBehavior>>,
    call_count: Arc<Mutex<usize>>,
    captured_requests: Arc<Mutex<Vec<ConversationRequest>>>,
    gate: Arc<Notify>,
}

impl MockProvider {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(behavior)),
            call_count: Arc::new(Mutex::new(0)),
            captured_requests: Arc::new(Mutex::new(Vec::new())),
            gate: Arc::new(Notify::new()),
        }
    }

    fn pop_behavior_from_queue(behavior: &mut MockBehavior) -> MockBehavior {
        if let MockBehavior::BehaviorQueue { behaviors } = behavior {
            if behaviors.is_empty() {
                return MockBehavior::Success;
            }
            return behaviors.remove(0);
        }
        behavior.clone()
    }

    pub fn set_behavior(&self, behavior: MockBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    /// Lets one pending (or the next) `Gated` call complete.
    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn get_captured_requests(&self) -> Vec<ConversationRequest> {
        self.captured_requests.lock().unwrap().clone()
    }

    pub fn get_last_captured_request(&self) -> Option<ConversationRequest> {
        self.captured_requests.lock().unwrap().last().cloned()
    }
}

fn reply(text: impl Into<String>) -> ConversationResponse {
    ConversationResponse {
        text: text.into(),
        usage: Some(TokenUsage::new(10, 10)),
    }
}

#[async_trait::async_trait]
impl AiProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn converse(
        &self,
        request: ConversationRequest,
    ) -> Result<ConversationResponse, AiError> {
        self.captured_requests.lock().unwrap().push(request);
        *self.call_count.lock().unwrap() += 1;

        let effective = {
            let mut behavior = self.behavior.lock().unwrap();
            Self::pop_behavior_from_queue(&mut behavior)
        };

        match effective {
            MockBehavior::Success => Ok(reply("Mock response")),
            MockBehavior::Reply { text } => Ok(reply(text)),
            MockBehavior::AlwaysError => Err(AiError::Api {
                status: 500,
                body: "Mock server error".to_string(),
            }),
            MockBehavior::Gated { text } => {
                self.gate.notified().await;
                Ok(reply(text))
            }
            MockBehavior::BehaviorQueue { .. } => {
                panic!("Bug: nested BehaviorQueue detected. Test setup error - BehaviorQueues cannot contain other BehaviorQueues")
            }
        }
    }
}
