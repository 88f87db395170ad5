//! Infrastructure layer - storage and authentication

pub mod auth;
pub mod storage;
