//! DAS-Peak: voice biometrics credentials, similarity and identification.

mod client;
pub mod endpoints;
mod error;
mod types;

pub use client::{DaspeakClient, ALIVE_STATUS};
pub use error::{
    classify_audio_input, exception, parse_calibration_name, parse_net_speech_detected,
    DaspeakError, DaspeakTaxonomy,
};
pub use types::*;
