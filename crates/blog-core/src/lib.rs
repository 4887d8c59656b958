//! # Blog Core
//!
//! The domain layer of the blog application.
//! Entities, validation rules, the authorization policy and the post workflow
//! live here; storage and authentication are reached only through the traits
//! in [`ports`].

pub mod domain;
pub mod error;
pub mod policy;
pub mod ports;
pub mod workflow;

pub use error::{DomainError, RepoError};
pub use workflow::PostWorkflow;
