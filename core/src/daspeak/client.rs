//! DAS-Peak voice biometrics client.
//!
//! # Design
//! Every operation is split into a `build_*` method that resolves the audio
//! and produces an `HttpRequest`, and a `parse_*` method that turns a
//! successful `HttpResponse` into the typed output. The public operation
//! runs both around exactly one `send`, so input errors (missing file,
//! empty credential list) surface before anything reaches the transport.

use std::sync::Arc;

use crate::client::{parse_json, ServiceClient};
use crate::config::{ClientOptions, Settings};
use crate::error::Result;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::multipart::Form;
use crate::target::{Api, Target};

use super::endpoints;
use super::error::DaspeakTaxonomy;
use super::types::*;

/// Status DAS-Peak answers `alive` with.
pub const ALIVE_STATUS: u16 = 200;

const AUDIO_FILENAME: &str = "audio";
const AUDIO_CONTENT_TYPE: &str = "audio/wav";
const CREDENTIALS_LIST_FIELD: &str = "credentials_list";

/// Synchronous client for the DAS-Peak API.
#[derive(Debug, Clone)]
pub struct DaspeakClient {
    inner: ServiceClient,
}

impl DaspeakClient {
    pub fn new(options: &ClientOptions, settings: &Settings) -> Result<Self> {
        Ok(Self {
            inner: ServiceClient::new(Api::Daspeak, options, settings)?,
        })
    }

    pub fn with_transport(
        options: &ClientOptions,
        settings: &Settings,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        Ok(Self {
            inner: ServiceClient::with_transport(Api::Daspeak, options, settings, transport)?,
        })
    }

    pub fn target(&self) -> &Target {
        self.inner.target()
    }

    fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.inner.send(request, &DaspeakTaxonomy)
    }

    // -- alive ---------------------------------------------------------------

    pub fn build_alive(&self) -> HttpRequest {
        self.inner.build_get(endpoints::ALIVE)
    }

    pub fn parse_alive(&self, response: &HttpResponse) -> bool {
        response.status == ALIVE_STATUS
    }

    /// Returns true if the service answers its liveness check.
    pub fn alive(&self) -> Result<bool> {
        let response = self.send(self.build_alive())?;
        Ok(self.parse_alive(&response))
    }

    // -- models --------------------------------------------------------------

    pub fn build_get_models(&self) -> HttpRequest {
        self.inner.build_get(endpoints::MODELS)
    }

    pub fn parse_get_models(&self, response: &HttpResponse) -> Result<ModelsOutput> {
        with_status(response)
    }

    /// Lists the biometrics models available in the service.
    pub fn get_models(&self) -> Result<ModelsOutput> {
        let response = self.send(self.build_get_models())?;
        self.parse_get_models(&response)
    }

    // -- credential ----------------------------------------------------------

    pub fn build_generate_credential(&self, input: &GenerateCredentialInput) -> Result<HttpRequest> {
        let audio = input.audio.to_bytes()?;
        let form = Form::new()
            .file("audio", AUDIO_FILENAME, AUDIO_CONTENT_TYPE, audio)
            .text("channel", input.channel)
            .text("calibration", &input.calibration);
        Ok(self
            .inner
            .build_multipart(&endpoints::credential_wav(&input.hash), form))
    }

    pub fn parse_generate_credential(
        &self,
        response: &HttpResponse,
    ) -> Result<GenerateCredentialOutput> {
        with_status(response)
    }

    /// Generates a credential from a WAV audio with the model `input.hash`.
    pub fn generate_credential(
        &self,
        input: &GenerateCredentialInput,
    ) -> Result<GenerateCredentialOutput> {
        let request = self.build_generate_credential(input)?;
        let response = self.send(request)?;
        self.parse_generate_credential(&response)
    }

    // -- comparison ----------------------------------------------------------

    /// Builds the request of whichever comparison `input` describes.
    pub fn build_compare(&self, input: &CompareInput) -> Result<HttpRequest> {
        match input {
            CompareInput::Credential2Credential(input) => self.build_credential2credential(input),
            CompareInput::Credential2Wav(input) => self.build_credential2wav(input),
            CompareInput::Wav2Wav(input) => self.build_wav2wav(input),
            CompareInput::Wav2Credentials(input) => self.build_wav2credentials(input),
            CompareInput::Credential2Credentials(input) => {
                self.build_credential2credentials(input)
            }
        }
    }

    /// Parses the response of the comparison `input` described.
    pub fn parse_compare(&self, input: &CompareInput, response: &HttpResponse) -> Result<CompareOutput> {
        Ok(match input {
            CompareInput::Credential2Credential(_) => {
                CompareOutput::Credential2Credential(with_status(response)?)
            }
            CompareInput::Credential2Wav(_) => CompareOutput::Credential2Wav(with_status(response)?),
            CompareInput::Wav2Wav(_) => CompareOutput::Wav2Wav(with_status(response)?),
            CompareInput::Wav2Credentials(_) => {
                CompareOutput::Wav2Credentials(with_status(response)?)
            }
            CompareInput::Credential2Credentials(_) => {
                CompareOutput::Credential2Credentials(with_status(response)?)
            }
        })
    }

    /// Runs any of the similarity or identification operations.
    pub fn compare(&self, input: impl Into<CompareInput>) -> Result<CompareOutput> {
        let input = input.into();
        let request = self.build_compare(&input)?;
        let response = self.send(request)?;
        self.parse_compare(&input, &response)
    }

    pub fn build_credential2credential(
        &self,
        input: &Credential2CredentialInput,
    ) -> Result<HttpRequest> {
        self.inner
            .build_json(endpoints::SIMILARITY_CREDENTIAL2CREDENTIAL, input)
    }

    /// Similarity between two credentials.
    pub fn similarity_credential2credential(
        &self,
        input: &Credential2CredentialInput,
    ) -> Result<Credential2CredentialOutput> {
        let response = self.send(self.build_credential2credential(input)?)?;
        with_status(&response)
    }

    pub fn build_credential2wav(&self, input: &Credential2WavInput) -> Result<HttpRequest> {
        let audio = input.audio_to_evaluate.to_bytes()?;
        let form = Form::new()
            .text("credential_reference", &input.credential_reference)
            .file("audio_to_evaluate", AUDIO_FILENAME, AUDIO_CONTENT_TYPE, audio)
            .text("channel", input.channel)
            .text("calibration", &input.calibration);
        Ok(self
            .inner
            .build_multipart(endpoints::SIMILARITY_CREDENTIAL2WAV, form))
    }

    /// Similarity between a credential and an audio.
    pub fn similarity_credential2wav(
        &self,
        input: &Credential2WavInput,
    ) -> Result<Credential2WavOutput> {
        let response = self.send(self.build_credential2wav(input)?)?;
        with_status(&response)
    }

    pub fn build_wav2wav(&self, input: &Wav2WavInput) -> Result<HttpRequest> {
        let reference = input.audio_reference.to_bytes()?;
        let to_evaluate = input.audio_to_evaluate.to_bytes()?;
        let form = Form::new()
            .file("audio_reference", AUDIO_FILENAME, AUDIO_CONTENT_TYPE, reference)
            .file("audio_to_evaluate", AUDIO_FILENAME, AUDIO_CONTENT_TYPE, to_evaluate)
            .text("channel_reference", input.channel_reference)
            .text("channel_to_evaluate", input.channel_to_evaluate)
            .text("calibration", &input.calibration);
        Ok(self.inner.build_multipart(endpoints::SIMILARITY_WAV2WAV, form))
    }

    /// Similarity between two audios.
    pub fn similarity_wav2wav(&self, input: &Wav2WavInput) -> Result<Wav2WavOutput> {
        let response = self.send(self.build_wav2wav(input)?)?;
        with_status(&response)
    }

    pub fn build_wav2credentials(&self, input: &Wav2CredentialsInput) -> Result<HttpRequest> {
        let audio = input.audio_reference.to_bytes()?;
        let form = Form::new()
            .file("audio_reference", AUDIO_FILENAME, AUDIO_CONTENT_TYPE, audio)
            .text("channel", input.channel)
            .text(CREDENTIALS_LIST_FIELD, input.credential_list.to_json()?)
            .text("calibration", &input.calibration);
        Ok(self
            .inner
            .build_multipart(endpoints::IDENTIFICATION_WAV2CREDENTIALS, form))
    }

    /// Identifies the speaker of an audio among enrolled credentials.
    pub fn identification_wav2credentials(
        &self,
        input: &Wav2CredentialsInput,
    ) -> Result<Wav2CredentialsOutput> {
        let response = self.send(self.build_wav2credentials(input)?)?;
        with_status(&response)
    }

    pub fn build_credential2credentials(
        &self,
        input: &Credential2CredentialsInput,
    ) -> Result<HttpRequest> {
        self.inner
            .build_json(endpoints::IDENTIFICATION_CREDENTIAL2CREDENTIALS, input)
    }

    /// Identifies the owner of a credential among enrolled credentials.
    pub fn identification_credential2credentials(
        &self,
        input: &Credential2CredentialsInput,
    ) -> Result<Credential2CredentialsOutput> {
        let response = self.send(self.build_credential2credentials(input)?)?;
        with_status(&response)
    }
}

/// Outputs that carry the HTTP status of the response they came from.
trait StatusCoded: serde::de::DeserializeOwned {
    fn set_status_code(&mut self, status: u16);
}

macro_rules! status_coded {
    ($($output:ty),* $(,)?) => {
        $(
            impl StatusCoded for $output {
                fn set_status_code(&mut self, status: u16) {
                    self.status_code = status;
                }
            }
        )*
    };
}

status_coded!(
    ModelsOutput,
    GenerateCredentialOutput,
    Credential2CredentialOutput,
    Credential2WavOutput,
    Wav2WavOutput,
    Wav2CredentialsOutput,
    Credential2CredentialsOutput,
);

fn with_status<T: StatusCoded>(response: &HttpResponse) -> Result<T> {
    let mut output: T = parse_json(response)?;
    output.set_status_code(response.status);
    Ok(output)
}
