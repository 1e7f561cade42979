pub mod batch;
pub mod cache;
pub mod classify;
pub mod cli;
pub mod common;
pub mod constants;
pub mod document;
pub mod export;
pub mod extract;
pub mod lookup;
pub mod ranges;
pub mod server;
pub mod session;
pub mod upload;
