//! Coordinator REST surface: client, commands, request tags and errors.

mod client;
mod command;
mod error;
mod tag;

pub use client::{CoordinatorClient, CoordinatorClientBuilder};
pub use command::Command;
pub use error::{CoordinatorError, ErrorBody};
pub use tag::request_tag;
