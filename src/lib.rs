pub mod cli;
pub mod constants;
pub mod models;
pub mod render;
pub mod repository;
pub mod server;
pub mod service;
pub mod store;
pub mod text;
