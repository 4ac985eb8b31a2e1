//! HTTP routes

pub mod webhook;
