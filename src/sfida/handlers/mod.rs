pub mod health;
pub mod security_question;
pub mod trigger;
pub mod types;
