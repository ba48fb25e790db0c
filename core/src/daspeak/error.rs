//! DAS-Peak business errors and their decoding from the error envelope.

use thiserror::Error;

use crate::error::ApiError;
use crate::taxonomy::ErrorTaxonomy;

/// Exception tags emitted by DAS-Peak.
pub mod exception {
    pub const AUDIO_INPUT: &str = "AudioInputException";
    /// Former name of `AUDIO_INPUT`, still sent by older deployments.
    pub const INPUT: &str = "InputException";
    pub const SIGNAL_NOISE_RATIO: &str = "SignalNoiseRatioException";
    pub const VOICE_DURATION_IS_NOT_ENOUGH: &str = "VoiceDurationIsNotEnoughException";
    pub const INVALID_CHANNEL: &str = "InvalidChannelException";
    pub const INSUFFICIENT_QUALITY: &str = "InsufficientQuality";
    pub const CALIBRATION_NOT_AVAILABLE: &str = "CalibrationNotAvailable";
    pub const INVALID_CREDENTIAL: &str = "InvalidCredentialException";
    pub const UNSUPPORTED_MEDIA_TYPE: &str = "UnsupportedMediaTypeException";
    pub const SERVER_ERROR: &str = "ServerError";
}

/// A request DAS-Peak understood but rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DaspeakError {
    #[error("the maximum allowed number of audio channels is 2, and the audio provided has more channels")]
    TooManyAudioChannels,

    #[error("the audio codec is not supported, supported codecs are: PCM_16, ULAW, ALAW")]
    UnsupportedAudioCodec,

    #[error("the sample rate of the audio is not supported, must be 8 kHz or 16 kHz")]
    UnsupportedSampleRate,

    #[error("the audio duration is too long, must be less than 30 seconds")]
    AudioDurationTooLong,

    /// Audio rejected for a reason without a dedicated variant.
    #[error("invalid audio input: {0}")]
    AudioInput(String),

    #[error("noise level of the audio exceeded")]
    SignalNoiseRatio,

    #[error("you need at least 3 seconds of speech to perform the operation, but only {detected} seconds were detected")]
    NetSpeechDurationIsNotEnough { detected: f64 },

    #[error("the specified channel is invalid, must be 1 or 2")]
    InvalidSpecifiedChannel,

    #[error("the audio quality is insufficient or may contain more than one speaker")]
    InsufficientQuality,

    #[error("the calibration {calibration} is not available")]
    CalibrationNotAvailable { calibration: String },

    #[error("the credential is invalid or was generated by an unknown model")]
    InvalidCredential,

    #[error("the media type of the request is not supported")]
    UnsupportedMediaType,
}

impl DaspeakError {
    /// Returns true for the rejections of the audio payload itself.
    pub fn is_audio_input(&self) -> bool {
        matches!(
            self,
            DaspeakError::TooManyAudioChannels
                | DaspeakError::UnsupportedAudioCodec
                | DaspeakError::UnsupportedSampleRate
                | DaspeakError::AudioDurationTooLong
                | DaspeakError::AudioInput(_)
        )
    }
}

/// Classifies an audio input rejection by its message. The first matching
/// marker wins.
pub fn classify_audio_input(message: &str) -> DaspeakError {
    if message.contains("more channels than") {
        DaspeakError::TooManyAudioChannels
    } else if message.contains("unsupported codec") {
        DaspeakError::UnsupportedAudioCodec
    } else if message.contains("sample rate") {
        DaspeakError::UnsupportedSampleRate
    } else if message.contains("duration is longer") {
        DaspeakError::AudioDurationTooLong
    } else {
        DaspeakError::AudioInput(message.to_string())
    }
}

/// Seconds of net speech reported in a `VoiceDurationIsNotEnoughException`
/// message: the third token from the end, e.g. `2.55s` in
/// `"Voice duration is not enough 2.55s < 3.00s"`.
pub fn parse_net_speech_detected(message: &str) -> Option<f64> {
    let tokens: Vec<&str> = message.split_whitespace().collect();
    let token = tokens.len().checked_sub(3).map(|i| tokens[i])?;
    token.trim_end_matches('s').parse().ok()
}

/// Calibration named in a `CalibrationNotAvailable` message: the second
/// token, e.g. `telephone-channel` in
/// `"Calibration telephone-channel is not available"`.
pub fn parse_calibration_name(message: &str) -> Option<String> {
    let token = message.split_whitespace().nth(1)?;
    let name = token.trim_matches(|c| c == '\'' || c == '"' || c == '`');
    (!name.is_empty()).then(|| name.to_string())
}

/// Error taxonomy of the DAS-Peak API.
#[derive(Debug, Clone, Copy, Default)]
pub struct DaspeakTaxonomy;

const KNOWN_EXCEPTIONS: &[&str] = &[
    exception::AUDIO_INPUT,
    exception::INPUT,
    exception::SIGNAL_NOISE_RATIO,
    exception::VOICE_DURATION_IS_NOT_ENOUGH,
    exception::INVALID_CHANNEL,
    exception::INSUFFICIENT_QUALITY,
    exception::CALIBRATION_NOT_AVAILABLE,
    exception::INVALID_CREDENTIAL,
    exception::UNSUPPORTED_MEDIA_TYPE,
    exception::SERVER_ERROR,
];

impl ErrorTaxonomy for DaspeakTaxonomy {
    fn known_exceptions(&self) -> &[&'static str] {
        KNOWN_EXCEPTIONS
    }

    fn classify(&self, tag: &str, message: &str) -> Option<ApiError> {
        let err = match tag {
            exception::AUDIO_INPUT | exception::INPUT => classify_audio_input(message),
            exception::SIGNAL_NOISE_RATIO => DaspeakError::SignalNoiseRatio,
            exception::INVALID_CHANNEL => DaspeakError::InvalidSpecifiedChannel,
            exception::INSUFFICIENT_QUALITY => DaspeakError::InsufficientQuality,
            exception::INVALID_CREDENTIAL => DaspeakError::InvalidCredential,
            exception::UNSUPPORTED_MEDIA_TYPE => DaspeakError::UnsupportedMediaType,
            exception::VOICE_DURATION_IS_NOT_ENOUGH => DaspeakError::NetSpeechDurationIsNotEnough {
                detected: parse_net_speech_detected(message)?,
            },
            exception::CALIBRATION_NOT_AVAILABLE => DaspeakError::CalibrationNotAvailable {
                calibration: parse_calibration_name(message)?,
            },
            _ => return None,
        };
        Some(err.into())
    }
}
