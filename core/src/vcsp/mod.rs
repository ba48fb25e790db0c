//! VCSP: voice credential service platform.

mod client;
pub mod endpoints;

pub use client::{VcspClient, ALIVE_STATUS};
