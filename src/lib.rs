pub mod application;
pub mod backend;
pub mod commands;
pub mod definition;
pub mod error;
pub mod package;
pub mod platform;
pub mod provision;
pub mod runtime;
pub mod scl;
