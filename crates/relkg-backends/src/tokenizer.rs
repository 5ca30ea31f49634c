//! Hugging Face tokenizer wrapper

use std::path::Path;
use std::str::FromStr;

use relkg_core::{Encoding, RelkgError, Result, Tokenizer};

/// Token used to right-pad batched windows
pub const PAD_TOKEN: &str = "<pad>";

/// Pad id used when the vocabulary has no [`PAD_TOKEN`]
pub const DEFAULT_PAD_ID: u32 = 1;

/// Tokenizer loaded from a `tokenizer.json` file
pub struct HfTokenizer {
    inner: tokenizers::Tokenizer,
    pad_token_id: u32,
}

impl HfTokenizer {
    /// Load a tokenizer from a `tokenizer.json` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let inner = tokenizers::Tokenizer::from_file(path).map_err(|e| {
            RelkgError::Tokenizer(format!("Failed to load {}: {e}", path.display()))
        })?;
        tracing::info!(path = %path.display(), "Loaded tokenizer");
        Ok(Self::from_inner(inner))
    }

    /// Build a tokenizer from serialized `tokenizer.json` content
    pub fn from_json(json: &str) -> Result<Self> {
        let inner = tokenizers::Tokenizer::from_str(json)
            .map_err(|e| RelkgError::Tokenizer(format!("Invalid tokenizer definition: {e}")))?;
        Ok(Self::from_inner(inner))
    }

    fn from_inner(inner: tokenizers::Tokenizer) -> Self {
        let pad_token_id = inner.token_to_id(PAD_TOKEN).unwrap_or(DEFAULT_PAD_ID);
        Self {
            inner,
            pad_token_id,
        }
    }
}

impl Tokenizer for HfTokenizer {
    fn encode(&self, text: &str) -> Result<Encoding> {
        let encoding = self
            .inner
            .encode(text, true)
            .map_err(|e| RelkgError::Tokenizer(format!("Encoding failed: {e}")))?;

        Ok(Encoding::new(
            encoding.get_ids().to_vec(),
            encoding.get_attention_mask().to_vec(),
        ))
    }

    /// Special tokens are kept so the parser can see the markers
    fn decode(&self, ids: &[u32]) -> Result<String> {
        self.inner
            .decode(ids, false)
            .map_err(|e| RelkgError::Tokenizer(format!("Decoding failed: {e}")))
    }

    fn pad_token_id(&self) -> u32 {
        self.pad_token_id
    }
}
