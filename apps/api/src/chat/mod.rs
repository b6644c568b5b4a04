pub mod conversation;
pub mod handlers;
pub mod prompts;
pub mod responder;
pub mod session;
