//! Playlist concepts produced by a language model.
//!
//! [`ConceptGenerator`] owns the prompt wording and validates whatever text
//! the model sends back; the model itself sits behind [`LanguageModel`].

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::profile::TasteProfile;

pub mod gemini;
pub mod prompt;

#[derive(Debug, Error)]
pub enum ConceptError {
    #[error("language model request failed")]
    Provider(#[source] anyhow::Error),
    #[error("concept reply is not valid JSON")]
    InvalidFormat(#[source] serde_json::Error),
    #[error("concept reply is missing required field `{0}`")]
    Malformed(&'static str),
}

// A `[low, high]` target with both bounds in `[0, 1]` and `low <= high`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetRange {
    pub low: f64,
    pub high: f64,
}

impl TargetRange {
    pub fn normalized(a: f64, b: f64) -> Self {
        let (a, b) = (a.clamp(0.0, 1.0), b.clamp(0.0, 1.0));
        TargetRange { low: a.min(b), high: a.max(b) }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistConcept {
    pub name: String,
    pub description: String,
    pub target_energy: TargetRange,
    pub target_valence: TargetRange,
    pub preferred_genres: Vec<String>,
    pub novelty: f64,
    pub avoid_artists: Vec<String>,
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

#[async_trait]
pub trait ConceptGateway: Send + Sync {
    async fn generate_concept(&self, profile: &TasteProfile) -> Result<PlaylistConcept, ConceptError>;

    async fn generate_concept_from_keywords(
        &self,
        keywords: &str,
        profile: &TasteProfile,
    ) -> Result<PlaylistConcept, ConceptError>;
}

pub struct ConceptGenerator<M> {
    model: M,
}

impl<M: LanguageModel> ConceptGenerator<M> {
    pub fn new(model: M) -> Self {
        ConceptGenerator { model }
    }

    pub async fn request_concept(
        &self,
        profile: &TasteProfile,
        keywords: Option<&str>,
    ) -> Result<PlaylistConcept, ConceptError> {
        let prompt = match keywords {
            Some(keywords) => {
                info!(keywords, "requesting keyword-guided playlist concept");
                prompt::keyword_prompt(keywords, profile)
            }
            None => {
                info!("requesting playlist concept from listening profile");
                prompt::profile_prompt(profile)
            }
        };

        let reply = self
            .model
            .generate(&prompt)
            .await
            .map_err(ConceptError::Provider)?;
        debug!(reply = %reply, "raw concept reply");

        parse_concept(&reply).inspect_err(|e| warn!("rejected concept reply: {e}"))
    }
}

#[async_trait]
impl<M: LanguageModel> ConceptGateway for ConceptGenerator<M> {
    async fn generate_concept(&self, profile: &TasteProfile) -> Result<PlaylistConcept, ConceptError> {
        self.request_concept(profile, None).await
    }

    async fn generate_concept_from_keywords(
        &self,
        keywords: &str,
        profile: &TasteProfile,
    ) -> Result<PlaylistConcept, ConceptError> {
        self.request_concept(profile, Some(keywords)).await
    }
}

pub fn parse_concept(reply: &str) -> Result<PlaylistConcept, ConceptError> {
    let cleaned = reply.replace("```json", "").replace("```", "");
    let value: Value = serde_json::from_str(cleaned.trim()).map_err(ConceptError::InvalidFormat)?;

    let name = value
        .get("playlist_name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or(ConceptError::Malformed("playlist_name"))?;
    let target_energy = range_field(&value, "target_energy")?;
    let target_valence = range_field(&value, "target_valence")?;

    Ok(PlaylistConcept {
        name: name.to_string(),
        description: value
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string(),
        target_energy,
        target_valence,
        preferred_genres: string_list(&value, "preferred_genres"),
        novelty: value
            .get("novelty")
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
            .clamp(0.0, 1.0),
        avoid_artists: string_list(&value, "avoid_artists"),
    })
}

fn range_field(value: &Value, key: &'static str) -> Result<TargetRange, ConceptError> {
    match value.get(key).and_then(Value::as_array).map(Vec::as_slice) {
        Some([low, high]) => match (low.as_f64(), high.as_f64()) {
            (Some(low), Some(high)) => Ok(TargetRange::normalized(low, high)),
            _ => Err(ConceptError::Malformed(key)),
        },
        _ => Err(ConceptError::Malformed(key)),
    }
}

fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
