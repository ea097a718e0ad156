mod binder;
mod bridge;
mod config;
mod definition;
mod engine;
mod history;
mod lifecycle;
mod resolver;
