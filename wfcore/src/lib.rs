pub mod ac;
pub mod config;
pub mod entity;
pub mod error;
pub mod history;
pub mod platform;
pub mod workflow;
