mod chat;
mod registry;

pub use chat::ChatRepository;
pub use registry::RegistryRepository;
