//! # IO Layer
//!
//! Interfaces that expose the domain services to the UI. Only a REST API for
//! now.

pub mod rest;
