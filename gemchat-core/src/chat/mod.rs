pub mod actor;
pub mod events;
pub mod recipe;
pub mod session;


pub use actor::{ChatActor, ChatActorBuilder, ChatActorMessage};
pub use events::ChatEvent;
pub use recipe::Recipe;
pub use session::{ChatMessage, ChatSession, ImageAttachment, MessageBody, MessageSender};
