use crate::ai::{error::AiError, types::*};

#[async_trait::async_trait]
pub trait AiProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn converse(&self, request: ConversationRequest)
        -> Result<ConversationResponse, AiError>;
}
