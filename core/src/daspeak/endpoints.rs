//! DAS-Peak endpoint paths, relative to `daspeak/v1`.

pub const ALIVE: &str = crate::endpoints::ALIVE;
pub const MODELS: &str = "models";
pub const MODELS_HASH_CREDENTIAL_WAV: &str = "models/<hash>/credential/wav";
pub const SIMILARITY_CREDENTIAL2CREDENTIAL: &str = "similarity/credential2credential";
pub const SIMILARITY_CREDENTIAL2WAV: &str = "similarity/credential2wav";
pub const SIMILARITY_WAV2WAV: &str = "similarity/wav2wav";
pub const IDENTIFICATION_WAV2CREDENTIALS: &str = "identification/wav2credentials";
pub const IDENTIFICATION_CREDENTIAL2CREDENTIALS: &str = "identification/credential2credentials";

/// Path generating a credential with the model identified by `hash`.
pub fn credential_wav(hash: &str) -> String {
    crate::endpoints::render(MODELS_HASH_CREDENTIAL_WAV, &[("hash", hash)])
}
