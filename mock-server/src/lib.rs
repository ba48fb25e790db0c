//! In-memory stand-in for the DAS-Peak and VCSP HTTP services.
//!
//! Audio is "analysed" with a few fixed rules so every error path of the
//! client can be triggered deterministically:
//! - content must start with `RIFF`, otherwise the codec is unsupported;
//! - the 8 bytes after `RIFF` identify the speaker;
//! - every 100 bytes after `RIFF` count as one second of net speech;
//! - the marker `NOISE` anywhere in the content fails the SNR check.
//!
//! Issued credentials are kept in memory and resolved back to their
//! speaker when compared.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, Multipart, Path, Request, State,
    },
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub const VERSION: &str = "3.2.0";
pub const MODELS: [&str; 2] = ["fake-model", "fake-model-v2"];
pub const CALIBRATIONS: [&str; 2] = ["telephone-channel", "microphone"];
pub const MIN_NET_SPEECH: f64 = 3.0;
pub const MAX_DURATION: f64 = 30.0;

/// Score given to two samples of the same speaker.
pub const MATCH_SCORE: f64 = 0.987654;
/// Score given to two samples of different speakers.
pub const MISMATCH_SCORE: f64 = 0.012345;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Model {
    pub hash: String,
    pub mode: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ScoredId {
    pub id: String,
    pub score: f64,
}

#[derive(Deserialize)]
pub struct CredentialEntry {
    pub id: String,
    pub credential: String,
}

#[derive(Deserialize)]
pub struct Credential2Credential {
    pub credential_reference: String,
    pub credential_to_evaluate: String,
    #[serde(default = "default_calibration")]
    pub calibration: String,
}

#[derive(Deserialize)]
pub struct Credential2Credentials {
    pub credential_reference: String,
    pub credentials_list: Vec<CredentialEntry>,
    #[serde(default = "default_calibration")]
    pub calibration: String,
}

fn default_calibration() -> String {
    CALIBRATIONS[0].to_string()
}

/// Issued credential → speaker.
pub type Db = Arc<RwLock<HashMap<String, Speaker>>>;

#[derive(Clone, Debug, PartialEq)]
pub struct Speaker {
    pub model: String,
    pub voice: Vec<u8>,
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(HashMap::new()));
    let daspeak = Router::new()
        .route("/alive", get(|| async { StatusCode::OK }))
        .route("/models", get(list_models))
        .route("/models/{hash}/credential/wav", post(generate_credential))
        .route("/similarity/credential2credential", post(credential2credential))
        .route("/similarity/credential2wav", post(credential2wav))
        .route("/similarity/wav2wav", post(wav2wav))
        .route("/identification/wav2credentials", post(wav2credentials))
        .route("/identification/credential2credentials", post(credential2credentials))
        .route("/crash", get(crash));
    let vcsp = Router::new().route("/alive", get(|| async { StatusCode::NO_CONTENT }));

    Router::new()
        .nest("/daspeak/v1", daspeak)
        .nest("/vcsp/v1", vcsp)
        .layer(middleware::from_fn(require_api_key))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    info!(addr = ?listener.local_addr()?, "mock server listening");
    axum::serve(listener, app()).await
}

async fn require_api_key(request: Request, next: Next) -> Response {
    if request.headers().contains_key("apikey") {
        return next.run(request).await;
    }
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"message": "no Authorization header found"})),
    )
        .into_response()
}

/// Error envelope `{exception, error}`.
#[derive(Debug)]
pub struct Fault {
    status: StatusCode,
    exception: &'static str,
    error: String,
}

impl Fault {
    fn new(status: StatusCode, exception: &'static str, error: impl Into<String>) -> Self {
        Self {
            status,
            exception,
            error: error.into(),
        }
    }

    fn bad_request(exception: &'static str, error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, exception, error)
    }

    fn unsupported_media_type(error: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "UnsupportedMediaTypeException",
            error,
        )
    }
}

impl IntoResponse for Fault {
    fn into_response(self) -> Response {
        debug!(exception = self.exception, error = %self.error, "rejecting request");
        (
            self.status,
            Json(json!({"exception": self.exception, "error": self.error})),
        )
            .into_response()
    }
}

impl From<MultipartRejection> for Fault {
    fn from(rejection: MultipartRejection) -> Self {
        Fault::unsupported_media_type(rejection.body_text())
    }
}

impl From<JsonRejection> for Fault {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::MissingJsonContentType(r) => Fault::unsupported_media_type(r.body_text()),
            other => Fault::new(StatusCode::UNPROCESSABLE_ENTITY, "ValidationError", other.body_text()),
        }
    }
}

// ---------------------------------------------------------------------------
// Audio analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub voice: Vec<u8>,
    pub duration: f64,
    pub net_speech: f64,
    pub authenticity: f64,
}

pub fn analyze(audio: &[u8], channel: u8) -> Result<Analysis, Fault> {
    if !(1..=2).contains(&channel) {
        return Err(Fault::bad_request(
            "InvalidChannelException",
            format!("Invalid channel {channel}"),
        ));
    }
    let Some(content) = audio.strip_prefix(b"RIFF") else {
        return Err(Fault::bad_request(
            "AudioInputException",
            "Audio with unsupported codec",
        ));
    };
    if content.windows(5).any(|w| w == b"NOISE") {
        return Err(Fault::bad_request("SignalNoiseRatioException", "SNR too low"));
    }
    let net_speech = content.len() as f64 / 100.0;
    let duration = net_speech + 0.5;
    if duration > MAX_DURATION {
        return Err(Fault::bad_request(
            "AudioInputException",
            format!("Audio duration is longer than {MAX_DURATION:.0}s"),
        ));
    }
    if net_speech < MIN_NET_SPEECH {
        return Err(Fault::bad_request(
            "VoiceDurationIsNotEnoughException",
            format!("Voice duration is not enough {net_speech:.2}s < {MIN_NET_SPEECH:.2}s"),
        ));
    }
    Ok(Analysis {
        voice: content.iter().take(8).copied().collect(),
        duration,
        net_speech,
        authenticity: 0.991234,
    })
}

fn check_calibration(calibration: &str) -> Result<(), Fault> {
    if CALIBRATIONS.contains(&calibration) {
        return Ok(());
    }
    Err(Fault::bad_request(
        "CalibrationNotAvailable",
        format!("Calibration {calibration} is not available"),
    ))
}

fn score(a: &[u8], b: &[u8]) -> f64 {
    if a == b {
        MATCH_SCORE
    } else {
        MISMATCH_SCORE
    }
}

fn model(hash: &str) -> Model {
    Model {
        hash: hash.to_string(),
        mode: "1:1".to_string(),
    }
}

async fn speaker(db: &Db, credential: &str) -> Result<Speaker, Fault> {
    db.read().await.get(credential).cloned().ok_or_else(|| {
        Fault::bad_request("InvalidCredentialException", "The credential is not valid")
    })
}

// ---------------------------------------------------------------------------
// Multipart
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Form {
    fields: HashMap<String, Vec<u8>>,
}

impl Form {
    async fn read(mut multipart: Multipart) -> Result<Self, Fault> {
        let mut form = Form::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| Fault::bad_request("ValidationError", e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| Fault::bad_request("ValidationError", e.body_text()))?;
            form.fields.insert(name, data.to_vec());
        }
        Ok(form)
    }

    fn bytes(&self, name: &str) -> Result<&[u8], Fault> {
        self.fields
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| Fault::bad_request("ValidationError", format!("missing field {name}")))
    }

    fn text(&self, name: &str) -> Result<String, Fault> {
        Ok(String::from_utf8_lossy(self.bytes(name)?).into_owned())
    }

    fn text_or(&self, name: &str, default: &str) -> String {
        self.text(name).unwrap_or_else(|_| default.to_string())
    }

    fn channel(&self, name: &str) -> Result<u8, Fault> {
        let raw = self.text_or(name, "1");
        raw.trim().parse().map_err(|_| {
            Fault::bad_request("InvalidChannelException", format!("Invalid channel {raw}"))
        })
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn list_models() -> Json<serde_json::Value> {
    Json(json!({"version": VERSION, "models": MODELS}))
}

/// Always fails with the `ServerError` tag.
async fn crash() -> Fault {
    Fault::new(StatusCode::INTERNAL_SERVER_ERROR, "ServerError", "unexpected failure")
}

async fn generate_credential(
    State(db): State<Db>,
    Path(hash): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<serde_json::Value>, Fault> {
    if !MODELS.contains(&hash.as_str()) {
        return Err(Fault::new(
            StatusCode::NOT_FOUND,
            "ModelNotFoundException",
            format!("Model {hash} not found"),
        ));
    }
    let form = Form::read(multipart?).await?;
    let calibration = form.text_or("calibration", CALIBRATIONS[0]);
    check_calibration(&calibration)?;
    let analysis = analyze(form.bytes("audio")?, form.channel("channel")?)?;

    let credential = format!("cred-{}", Uuid::new_v4());
    db.write().await.insert(
        credential.clone(),
        Speaker {
            model: hash.clone(),
            voice: analysis.voice,
        },
    );
    info!(%credential, model = %hash, "credential issued");

    Ok(Json(json!({
        "version": VERSION,
        "model": model(&hash),
        "credential": credential,
        "authenticity": analysis.authenticity,
        "input_audio_duration": analysis.duration,
        "net_speech_duration": analysis.net_speech,
    })))
}

async fn credential2credential(
    State(db): State<Db>,
    input: Result<Json<Credential2Credential>, JsonRejection>,
) -> Result<Json<serde_json::Value>, Fault> {
    let Json(input) = input?;
    check_calibration(&input.calibration)?;
    let reference = speaker(&db, &input.credential_reference).await?;
    let to_evaluate = speaker(&db, &input.credential_to_evaluate).await?;
    Ok(Json(json!({
        "version": VERSION,
        "calibration": input.calibration,
        "score": score(&reference.voice, &to_evaluate.voice),
    })))
}

async fn credential2wav(
    State(db): State<Db>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<serde_json::Value>, Fault> {
    let form = Form::read(multipart?).await?;
    let calibration = form.text_or("calibration", CALIBRATIONS[0]);
    check_calibration(&calibration)?;
    let reference = speaker(&db, &form.text("credential_reference")?).await?;
    let analysis = analyze(form.bytes("audio_to_evaluate")?, form.channel("channel")?)?;
    Ok(Json(json!({
        "version": VERSION,
        "model": model(&reference.model),
        "calibration": calibration,
        "score": score(&reference.voice, &analysis.voice),
        "authenticity_to_evaluate": analysis.authenticity,
        "input_audio_duration": analysis.duration,
        "net_speech_duration": analysis.net_speech,
    })))
}

async fn wav2wav(multipart: Result<Multipart, MultipartRejection>) -> Result<Json<serde_json::Value>, Fault> {
    let form = Form::read(multipart?).await?;
    let calibration = form.text_or("calibration", CALIBRATIONS[0]);
    check_calibration(&calibration)?;
    let reference = analyze(form.bytes("audio_reference")?, form.channel("channel_reference")?)?;
    let to_evaluate = analyze(
        form.bytes("audio_to_evaluate")?,
        form.channel("channel_to_evaluate")?,
    )?;
    Ok(Json(json!({
        "version": VERSION,
        "model": model(MODELS[0]),
        "calibration": calibration,
        "score": score(&reference.voice, &to_evaluate.voice),
        "authenticity_reference": reference.authenticity,
        "authenticity_to_evaluate": to_evaluate.authenticity,
        "input_audio_duration_reference": reference.duration,
        "input_audio_duration_to_evaluate": to_evaluate.duration,
        "net_speech_duration_reference": reference.net_speech,
        "net_speech_duration_to_evaluate": to_evaluate.net_speech,
    })))
}

async fn rank(db: &Db, voice: &[u8], list: &[CredentialEntry]) -> Result<(ScoredId, Vec<ScoredId>), Fault> {
    let mut scores = Vec::with_capacity(list.len());
    for entry in list {
        let enrolled = speaker(db, &entry.credential).await?;
        scores.push(ScoredId {
            id: entry.id.clone(),
            score: score(voice, &enrolled.voice),
        });
    }
    let best = scores
        .iter()
        .max_by(|a, b| a.score.total_cmp(&b.score))
        .cloned()
        .ok_or_else(|| Fault::bad_request("ValidationError", "credentials_list is empty"))?;
    Ok((best, scores))
}

async fn wav2credentials(
    State(db): State<Db>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<serde_json::Value>, Fault> {
    let form = Form::read(multipart?).await?;
    let calibration = form.text_or("calibration", CALIBRATIONS[0]);
    check_calibration(&calibration)?;
    let list: Vec<CredentialEntry> = serde_json::from_slice(form.bytes("credentials_list")?)
        .map_err(|e| Fault::bad_request("ValidationError", e.to_string()))?;
    let analysis = analyze(form.bytes("audio_reference")?, form.channel("channel")?)?;
    let (result, scores) = rank(&db, &analysis.voice, &list).await?;
    Ok(Json(json!({
        "version": VERSION,
        "model": model(MODELS[0]),
        "calibration": calibration,
        "result": result,
        "scores": scores,
        "authenticity_reference": analysis.authenticity,
        "input_audio_duration": analysis.duration,
        "net_speech_duration": analysis.net_speech,
    })))
}

async fn credential2credentials(
    State(db): State<Db>,
    input: Result<Json<Credential2Credentials>, JsonRejection>,
) -> Result<Json<serde_json::Value>, Fault> {
    let Json(input) = input?;
    check_calibration(&input.calibration)?;
    let reference = speaker(&db, &input.credential_reference).await?;
    let (result, scores) = rank(&db, &reference.voice, &input.credentials_list).await?;
    Ok(Json(json!({
        "version": VERSION,
        "model": model(&reference.model),
        "calibration": input.calibration,
        "result": result,
        "scores": scores,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio(speaker: &[u8; 8], seconds: usize) -> Vec<u8> {
        let mut bytes = b"RIFF".to_vec();
        bytes.extend_from_slice(speaker);
        bytes.resize(4 + seconds * 100, b'.');
        bytes
    }

    #[test]
    fn analyze_accepts_long_enough_speech() {
        let analysis = analyze(&audio(b"speaker1", 5), 1).unwrap();
        assert_eq!(analysis.voice, b"speaker1");
        assert_eq!(analysis.net_speech, 5.0);
        assert_eq!(analysis.duration, 5.5);
    }

    #[test]
    fn analyze_rejects_short_speech_with_parsable_message() {
        let fault = analyze(&audio(b"speaker1", 2), 1).unwrap_err();
        assert_eq!(fault.exception, "VoiceDurationIsNotEnoughException");
        assert_eq!(fault.error, "Voice duration is not enough 2.00s < 3.00s");
    }

    #[test]
    fn analyze_rejects_other_codecs() {
        let fault = analyze(b"ID3 mp3 data", 1).unwrap_err();
        assert_eq!(fault.exception, "AudioInputException");
        assert!(fault.error.contains("unsupported codec"));
    }

    #[test]
    fn analyze_rejects_long_audio() {
        let fault = analyze(&audio(b"speaker1", 31), 1).unwrap_err();
        assert!(fault.error.contains("duration is longer"));
    }

    #[test]
    fn analyze_checks_channel_first() {
        let fault = analyze(b"not even audio", 3).unwrap_err();
        assert_eq!(fault.exception, "InvalidChannelException");
    }

    #[test]
    fn analyze_detects_noise() {
        let mut bytes = audio(b"speaker1", 5);
        bytes.extend_from_slice(b"NOISE");
        let fault = analyze(&bytes, 2).unwrap_err();
        assert_eq!(fault.exception, "SignalNoiseRatioException");
    }

    #[test]
    fn calibration_must_be_known() {
        assert!(check_calibration("microphone").is_ok());
        let fault = check_calibration("studio").unwrap_err();
        assert_eq!(fault.error, "Calibration studio is not available");
    }

    #[test]
    fn credential2credentials_defaults_calibration() {
        let input: Credential2Credentials = serde_json::from_str(
            r#"{"credential_reference":"c","credentials_list":[{"id":"a","credential":"c"}]}"#,
        )
        .unwrap();
        assert_eq!(input.calibration, "telephone-channel");
        assert_eq!(input.credentials_list[0].id, "a");
    }
}
