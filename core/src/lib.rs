//! Synchronous client SDK for the Veridas voice services.
//!
//! # Overview
//! `DaspeakClient` generates voice credentials and scores similarity and
//! identification; `VcspClient` talks to the voice credential platform.
//! Both resolve their target (cloud environment and location, or a custom
//! URL) once at construction and then issue exactly one blocking request
//! per operation.
//!
//! # Design
//! - Configuration is explicit: `ClientOptions` layered over `Settings`,
//!   never read implicitly during a call.
//! - Each operation is split into `build_*` (produces an `HttpRequest`) and
//!   `parse_*` (consumes an `HttpResponse`); the `Transport` in between is
//!   swappable, with `ReqwestTransport` as the default.
//! - Failed responses are mapped to one typed `ApiError` by the service's
//!   `ErrorTaxonomy`. Nothing is retried.

pub mod client;
pub mod config;
pub mod daspeak;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod multipart;
pub mod target;
pub mod taxonomy;
pub mod vcsp;

pub use client::ServiceClient;
pub use config::{ClientOptions, Settings};
pub use daspeak::{DaspeakClient, DaspeakError};
pub use error::{ApiError, Result};
pub use http::{
    HttpMethod, HttpRequest, HttpResponse, RequestBody, ReqwestTransport, Transport,
};
pub use target::{Api, Environment, Location, Target, TargetKind};
pub use taxonomy::{ErrorTaxonomy, NoTaxonomy};
pub use vcsp::VcspClient;
