//! DAS-Peak request inputs and response outputs.
//!
//! # Design
//! Inputs are plain Rust values; audio is either a path or bytes and is only
//! resolved when a request is built. Outputs mirror the service JSON, with
//! every float metric rounded to three decimals on the way in and the HTTP
//! status filled in by the client after parsing.

use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ApiError, Result};

/// Calibration applied when none is given.
pub const DEFAULT_CALIBRATION: &str = "telephone-channel";

/// Channel used when none is given.
pub const DEFAULT_CHANNEL: u8 = 1;

fn default_calibration() -> String {
    DEFAULT_CALIBRATION.to_string()
}

fn default_channel() -> u8 {
    DEFAULT_CHANNEL
}

/// Rounds to three decimal places.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn de_round3<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<f64, D::Error> {
    f64::deserialize(deserializer).map(round3)
}

fn de_round3_opt<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<f64>, D::Error> {
    Option::<f64>::deserialize(deserializer).map(|v| v.map(round3))
}

/// Audio sent to the service.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioInput {
    /// WAV file on disk, read when the request is built.
    Path(PathBuf),
    /// WAV content already in memory.
    Bytes(Vec<u8>),
}

impl AudioInput {
    /// Returns the audio bytes, reading the file for path inputs.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            AudioInput::Path(path) => read_audio_file(path),
            AudioInput::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

fn read_audio_file(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ApiError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => ApiError::Io(e),
    })?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}

impl From<PathBuf> for AudioInput {
    fn from(path: PathBuf) -> Self {
        AudioInput::Path(path)
    }
}

impl From<&Path> for AudioInput {
    fn from(path: &Path) -> Self {
        AudioInput::Path(path.to_path_buf())
    }
}

impl From<&str> for AudioInput {
    fn from(path: &str) -> Self {
        AudioInput::Path(PathBuf::from(path))
    }
}

impl From<String> for AudioInput {
    fn from(path: String) -> Self {
        AudioInput::Path(PathBuf::from(path))
    }
}

impl From<Vec<u8>> for AudioInput {
    fn from(bytes: Vec<u8>) -> Self {
        AudioInput::Bytes(bytes)
    }
}

impl From<&[u8]> for AudioInput {
    fn from(bytes: &[u8]) -> Self {
        AudioInput::Bytes(bytes.to_vec())
    }
}

/// One enrolled subject in an identification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialEntry {
    pub id: String,
    pub credential: String,
}

/// Non-empty list of `(subject id, credential)` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CredentialList(Vec<CredentialEntry>);

impl CredentialList {
    pub fn new<I, S, C>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, C)>,
        S: Into<String>,
        C: Into<String>,
    {
        let entries: Vec<CredentialEntry> = entries
            .into_iter()
            .map(|(id, credential)| CredentialEntry {
                id: id.into(),
                credential: credential.into(),
            })
            .collect();
        if entries.is_empty() {
            return Err(ApiError::InvalidInput(
                "credential list must contain at least one entry".to_string(),
            ));
        }
        Ok(Self(entries))
    }

    pub fn entries(&self) -> &[CredentialEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// JSON array of `{id, credential}` objects, in list order.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.0).map_err(|e| ApiError::Serialization(e.to_string()))
    }
}

/// Builds a list from loosely typed rows; every row must be exactly
/// `[subject_id, credential]`.
impl TryFrom<Vec<Vec<String>>> for CredentialList {
    type Error = ApiError;

    fn try_from(rows: Vec<Vec<String>>) -> Result<Self> {
        let pairs = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| match <[String; 2]>::try_from(row) {
                Ok([id, credential]) => Ok((id, credential)),
                Err(row) => Err(ApiError::InvalidInput(format!(
                    "credential list entry {i} must be a [subject_id, credential] pair, got {} elements",
                    row.len()
                ))),
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(pairs)
    }
}

/// Accepts both `[id, credential]` rows and `{id, credential}` objects.
impl<'de> Deserialize<'de> for CredentialList {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Row {
            Pair(Vec<String>),
            Entry(CredentialEntry),
        }

        let rows = Vec::<Row>::deserialize(deserializer)?
            .into_iter()
            .map(|row| match row {
                Row::Pair(pair) => pair,
                Row::Entry(entry) => vec![entry.id, entry.credential],
            })
            .collect::<Vec<_>>();
        Self::try_from(rows).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Input of `generate_credential`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateCredentialInput {
    pub audio: AudioInput,
    /// Hash of the biometrics model.
    pub hash: String,
    pub channel: u8,
    pub calibration: String,
}

impl GenerateCredentialInput {
    pub fn new(audio: impl Into<AudioInput>, hash: impl Into<String>) -> Self {
        Self {
            audio: audio.into(),
            hash: hash.into(),
            channel: DEFAULT_CHANNEL,
            calibration: default_calibration(),
        }
    }

    pub fn channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    pub fn calibration(mut self, calibration: impl Into<String>) -> Self {
        self.calibration = calibration.into();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential2CredentialInput {
    pub credential_reference: String,
    pub credential_to_evaluate: String,
    #[serde(default = "default_calibration")]
    pub calibration: String,
}

impl Credential2CredentialInput {
    pub fn new(reference: impl Into<String>, to_evaluate: impl Into<String>) -> Self {
        Self {
            credential_reference: reference.into(),
            credential_to_evaluate: to_evaluate.into(),
            calibration: default_calibration(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Credential2WavInput {
    pub credential_reference: String,
    pub audio_to_evaluate: AudioInput,
    #[serde(default = "default_channel")]
    pub channel: u8,
    #[serde(default = "default_calibration")]
    pub calibration: String,
}

impl Credential2WavInput {
    pub fn new(reference: impl Into<String>, audio: impl Into<AudioInput>) -> Self {
        Self {
            credential_reference: reference.into(),
            audio_to_evaluate: audio.into(),
            channel: DEFAULT_CHANNEL,
            calibration: default_calibration(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Wav2WavInput {
    pub audio_reference: AudioInput,
    pub audio_to_evaluate: AudioInput,
    #[serde(default = "default_channel")]
    pub channel_reference: u8,
    #[serde(default = "default_channel")]
    pub channel_to_evaluate: u8,
    #[serde(default = "default_calibration")]
    pub calibration: String,
}

impl Wav2WavInput {
    pub fn new(reference: impl Into<AudioInput>, to_evaluate: impl Into<AudioInput>) -> Self {
        Self {
            audio_reference: reference.into(),
            audio_to_evaluate: to_evaluate.into(),
            channel_reference: DEFAULT_CHANNEL,
            channel_to_evaluate: DEFAULT_CHANNEL,
            calibration: default_calibration(),
        }
    }
}

/// Identification of an audio against enrolled credentials.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Wav2CredentialsInput {
    pub audio_reference: AudioInput,
    #[serde(rename = "credentials_list", alias = "credential_list")]
    pub credential_list: CredentialList,
    #[serde(default = "default_channel")]
    pub channel: u8,
    #[serde(default = "default_calibration")]
    pub calibration: String,
}

impl Wav2CredentialsInput {
    pub fn new(audio: impl Into<AudioInput>, credential_list: CredentialList) -> Self {
        Self {
            audio_reference: audio.into(),
            credential_list,
            channel: DEFAULT_CHANNEL,
            calibration: default_calibration(),
        }
    }
}

/// Identification of a credential against enrolled credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential2CredentialsInput {
    pub credential_reference: String,
    #[serde(rename = "credentials_list", alias = "credential_list")]
    pub credential_list: CredentialList,
    #[serde(default = "default_calibration")]
    pub calibration: String,
}

impl Credential2CredentialsInput {
    pub fn new(reference: impl Into<String>, credential_list: CredentialList) -> Self {
        Self {
            credential_reference: reference.into(),
            credential_list,
            calibration: default_calibration(),
        }
    }
}

/// Any comparison accepted by `DaspeakClient::compare`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CompareInput {
    Credential2Credential(Credential2CredentialInput),
    Credential2Wav(Credential2WavInput),
    Wav2Wav(Wav2WavInput),
    Wav2Credentials(Wav2CredentialsInput),
    Credential2Credentials(Credential2CredentialsInput),
}

impl CompareInput {
    /// Decodes a comparison described as JSON, e.g.
    /// `{"type": "credential2credential", "credential_reference": ..., ...}`.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            ApiError::InvalidInput(format!(
                "expected one of credential2credential, credential2wav, wav2wav, \
                 wav2credentials, credential2credentials: {e}"
            ))
        })
    }
}

macro_rules! compare_input_from {
    ($($variant:ident($input:ty)),* $(,)?) => {
        $(
            impl From<$input> for CompareInput {
                fn from(input: $input) -> Self {
                    CompareInput::$variant(input)
                }
            }
        )*
    };
}

compare_input_from!(
    Credential2Credential(Credential2CredentialInput),
    Credential2Wav(Credential2WavInput),
    Wav2Wav(Wav2WavInput),
    Wav2Credentials(Wav2CredentialsInput),
    Credential2Credentials(Credential2CredentialsInput),
);

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelsOutput {
    pub version: String,
    #[serde(skip)]
    pub status_code: u16,
    pub models: Vec<String>,
}

/// Model that produced a credential or score.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelMetadata {
    pub hash: String,
    pub mode: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerateCredentialOutput {
    pub version: String,
    #[serde(skip)]
    pub status_code: u16,
    pub model: ModelMetadata,
    pub credential: String,
    #[serde(deserialize_with = "de_round3")]
    pub authenticity: f64,
    #[serde(deserialize_with = "de_round3")]
    pub input_audio_duration: f64,
    #[serde(deserialize_with = "de_round3")]
    pub net_speech_duration: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Credential2CredentialOutput {
    pub version: String,
    #[serde(skip)]
    pub status_code: u16,
    pub calibration: String,
    #[serde(deserialize_with = "de_round3")]
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Credential2WavOutput {
    pub version: String,
    #[serde(skip)]
    pub status_code: u16,
    pub model: ModelMetadata,
    pub calibration: String,
    #[serde(deserialize_with = "de_round3")]
    pub score: f64,
    #[serde(deserialize_with = "de_round3")]
    pub authenticity_to_evaluate: f64,
    #[serde(deserialize_with = "de_round3")]
    pub input_audio_duration: f64,
    #[serde(deserialize_with = "de_round3")]
    pub net_speech_duration: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Wav2WavOutput {
    pub version: String,
    #[serde(skip)]
    pub status_code: u16,
    pub model: ModelMetadata,
    pub calibration: String,
    #[serde(deserialize_with = "de_round3")]
    pub score: f64,
    #[serde(deserialize_with = "de_round3")]
    pub authenticity_reference: f64,
    #[serde(deserialize_with = "de_round3")]
    pub authenticity_to_evaluate: f64,
    #[serde(deserialize_with = "de_round3")]
    pub input_audio_duration_reference: f64,
    #[serde(deserialize_with = "de_round3")]
    pub input_audio_duration_to_evaluate: f64,
    #[serde(deserialize_with = "de_round3")]
    pub net_speech_duration_reference: f64,
    #[serde(deserialize_with = "de_round3")]
    pub net_speech_duration_to_evaluate: f64,
}

/// Score of one enrolled subject.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IdentificationScore {
    pub id: String,
    #[serde(deserialize_with = "de_round3")]
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Wav2CredentialsOutput {
    pub version: String,
    #[serde(skip)]
    pub status_code: u16,
    pub model: ModelMetadata,
    pub calibration: String,
    /// Best match as chosen by the service.
    pub result: IdentificationScore,
    pub scores: Vec<IdentificationScore>,
    #[serde(default, deserialize_with = "de_round3_opt")]
    pub authenticity_reference: Option<f64>,
    #[serde(default, deserialize_with = "de_round3_opt")]
    pub input_audio_duration: Option<f64>,
    #[serde(default, deserialize_with = "de_round3_opt")]
    pub net_speech_duration: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Credential2CredentialsOutput {
    pub version: String,
    #[serde(skip)]
    pub status_code: u16,
    pub model: ModelMetadata,
    pub calibration: String,
    pub result: IdentificationScore,
    pub scores: Vec<IdentificationScore>,
}

/// Output of `DaspeakClient::compare`, one variant per `CompareInput`.
#[derive(Debug, Clone, PartialEq)]
pub enum CompareOutput {
    Credential2Credential(Credential2CredentialOutput),
    Credential2Wav(Credential2WavOutput),
    Wav2Wav(Wav2WavOutput),
    Wav2Credentials(Wav2CredentialsOutput),
    Credential2Credentials(Credential2CredentialsOutput),
}

impl CompareOutput {
    /// Similarity score, or the best match score for identifications.
    pub fn score(&self) -> f64 {
        match self {
            CompareOutput::Credential2Credential(out) => out.score,
            CompareOutput::Credential2Wav(out) => out.score,
            CompareOutput::Wav2Wav(out) => out.score,
            CompareOutput::Wav2Credentials(out) => out.result.score,
            CompareOutput::Credential2Credentials(out) => out.result.score,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            CompareOutput::Credential2Credential(out) => out.status_code,
            CompareOutput::Credential2Wav(out) => out.status_code,
            CompareOutput::Wav2Wav(out) => out.status_code,
            CompareOutput::Wav2Credentials(out) => out.status_code,
            CompareOutput::Credential2Credentials(out) => out.status_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn round3_rounds_half_away_from_zero() {
        assert_eq!(round3(0.987654), 0.988);
        assert_eq!(round3(4.5), 4.5);
        assert_eq!(round3(-0.12345), -0.123);
    }

    #[test]
    fn generate_credential_output_rounds_metrics() {
        let json = r#"{
            "version": "1",
            "model": {"hash": "h", "mode": "m"},
            "credential": "c",
            "authenticity": 0.987654,
            "input_audio_duration": 5.00049,
            "net_speech_duration": 4.4996
        }"#;
        let out: GenerateCredentialOutput = serde_json::from_str(json).unwrap();
        assert_eq!(out.authenticity, 0.988);
        assert_eq!(out.input_audio_duration, 5.0);
        assert_eq!(out.net_speech_duration, 4.5);
        assert_eq!(out.status_code, 0);
    }

    #[test]
    fn identification_scores_are_rounded() {
        let json = r#"{
            "version": "1",
            "model": {"hash": "h", "mode": "m"},
            "calibration": "telephone-channel",
            "result": {"id": "alice", "score": 0.91234},
            "scores": [{"id": "alice", "score": 0.91234}, {"id": "bob", "score": 0.10001}]
        }"#;
        let out: Credential2CredentialsOutput = serde_json::from_str(json).unwrap();
        assert_eq!(out.result.score, 0.912);
        assert_eq!(out.scores[1].score, 0.1);
    }

    #[test]
    fn wav2credentials_output_metrics_are_optional() {
        let json = r#"{
            "version": "1",
            "model": {"hash": "h", "mode": "m"},
            "calibration": "telephone-channel",
            "result": {"id": "alice", "score": 0.9},
            "scores": [{"id": "alice", "score": 0.9}]
        }"#;
        let out: Wav2CredentialsOutput = serde_json::from_str(json).unwrap();
        assert_eq!(out.result.id, "alice");
        assert_eq!(out.authenticity_reference, None);
        assert_eq!(out.net_speech_duration, None);

        let json = json.replace(
            r#""calibration""#,
            r#""net_speech_duration": 4.4996, "calibration""#,
        );
        let out: Wav2CredentialsOutput = serde_json::from_str(&json).unwrap();
        assert_eq!(out.net_speech_duration, Some(4.5));
        assert_eq!(out.input_audio_duration, None);
    }

    #[test]
    fn credentials_list_is_the_wire_name() {
        let list = CredentialList::new([("alice", "c1")]).unwrap();
        let body = serde_json::to_value(Credential2CredentialsInput::new("ref", list)).unwrap();
        assert_eq!(body["credentials_list"][0]["id"], "alice");
        assert!(body.get("credential_list").is_none());

        let input = CompareInput::from_json(
            r#"{"type": "wav2credentials", "audio_reference": {"bytes": [1]},
                "credentials_list": [["alice", "c1"]]}"#,
        )
        .unwrap();
        assert!(matches!(input, CompareInput::Wav2Credentials(i) if i.credential_list.len() == 1));
    }

    #[test]
    fn audio_path_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"RIFFdata").unwrap();
        let audio = AudioInput::from(file.path());
        assert_eq!(audio.to_bytes().unwrap(), b"RIFFdata");
    }

    #[test]
    fn missing_audio_path_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.wav");
        let err = AudioInput::from(path.clone()).to_bytes().unwrap_err();
        assert!(matches!(err, ApiError::FileNotFound { path: p } if p == path));
    }

    #[test]
    fn audio_bytes_are_used_as_is() {
        let audio = AudioInput::from(vec![1, 2, 3]);
        assert_eq!(audio.to_bytes().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn empty_credential_list_is_rejected() {
        let err = CredentialList::new(Vec::<(String, String)>::new()).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn credential_list_rows_must_be_pairs() {
        let rows = vec![
            vec!["alice".to_string(), "c1".to_string()],
            vec!["bob".to_string()],
        ];
        let err = CredentialList::try_from(rows).unwrap_err();
        assert!(err.to_string().contains("entry 1"), "{err}");
    }

    #[test]
    fn credential_list_json_preserves_order() {
        let list = CredentialList::new([("zed", "c3"), ("alice", "c1"), ("bob", "c2")]).unwrap();
        let json = list.to_json().unwrap();
        let back: Vec<CredentialEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, list.entries());
    }

    #[test]
    fn credential_list_deserializes_its_own_json() {
        let list = CredentialList::new([("alice", "c1"), ("bob", "c2")]).unwrap();
        let back: CredentialList = serde_json::from_str(&list.to_json().unwrap()).unwrap();
        assert_eq!(back, list);
    }

    #[test]
    fn compare_input_from_json_applies_defaults() {
        let input = CompareInput::from_json(
            r#"{"type": "credential2wav", "credential_reference": "c", "audio_to_evaluate": {"path": "a.wav"}}"#,
        )
        .unwrap();
        match input {
            CompareInput::Credential2Wav(input) => {
                assert_eq!(input.channel, DEFAULT_CHANNEL);
                assert_eq!(input.calibration, DEFAULT_CALIBRATION);
                assert_eq!(input.audio_to_evaluate, AudioInput::Path(PathBuf::from("a.wav")));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn compare_input_from_json_reads_credential_rows() {
        let input = CompareInput::from_json(
            r#"{"type": "credential2credentials", "credential_reference": "c",
                "credential_list": [["alice", "c1"], ["bob", "c2"]]}"#,
        )
        .unwrap();
        let CompareInput::Credential2Credentials(input) = input else {
            panic!("unexpected variant");
        };
        assert_eq!(input.credential_list.len(), 2);
        assert_eq!(input.credential_list.entries()[1].id, "bob");
    }

    #[test]
    fn compare_input_from_json_rejects_unknown_variant() {
        let err = CompareInput::from_json(r#"{"type": "wav2banana"}"#).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert!(err.to_string().contains("credential2credential"));
    }

    #[test]
    fn compare_input_from_json_rejects_empty_list() {
        let err = CompareInput::from_json(
            r#"{"type": "credential2credentials", "credential_reference": "c", "credential_list": []}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }
}
