//! Transport layer

pub mod rest;
