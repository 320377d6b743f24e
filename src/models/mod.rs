pub mod chat;
pub mod registry;
pub mod result;
