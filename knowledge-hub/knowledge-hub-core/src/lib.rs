pub mod access;
pub mod auth;
pub mod error;
pub mod events;
pub mod models;
pub mod seed;
pub mod services;
pub mod storage;
pub mod validation;

pub use error::{Error, Result};
