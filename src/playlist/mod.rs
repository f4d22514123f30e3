use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{concept::ConceptError, profile::TopArtist};

pub mod assembler;
pub mod selection;

pub use assembler::PlaylistAssembler;

pub const DEFAULT_TRACK_LIMIT: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum TimeWindow {
    #[strum(to_string = "short_term")]
    ShortTerm,
    #[strum(to_string = "medium_term")]
    MediumTerm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackCandidate {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub album: String,
    pub album_art: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreatedPlaylist {
    pub id: String,
    pub external_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistSummary {
    pub id: String,
    pub name: String,
    pub external_url: Option<String>,
    pub image_url: Option<String>,
    pub track_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishedPlaylist {
    pub id: String,
    pub external_url: String,
    pub name: String,
    pub description: String,
    pub track_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DraftPlaylist {
    pub concept_name: String,
    pub concept_description: String,
    pub tracks: Vec<TrackCandidate>,
}

#[async_trait]
pub trait CatalogGateway: Send + Sync {
    async fn top_tracks(&self, user_id: &str, window: TimeWindow, limit: u32) -> Result<Vec<TrackCandidate>>;

    async fn top_artists(&self, user_id: &str, window: TimeWindow, limit: u32) -> Result<Vec<TopArtist>>;

    async fn search_tracks(&self, user_id: &str, query: &str, limit: u32) -> Result<Vec<TrackCandidate>>;

    async fn create_playlist(&self, user_id: &str, name: &str, description: &str) -> Result<CreatedPlaylist>;

    async fn add_tracks_to_playlist(&self, user_id: &str, playlist_id: &str, uris: &[String]) -> Result<()>;

    async fn user_playlists(&self, user_id: &str, limit: u32) -> Result<Vec<PlaylistSummary>>;
}

#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("Failed to fetch listening data from Spotify")]
    UpstreamFetch(#[source] anyhow::Error),
    #[error("Failed to generate playlist concept")]
    ConceptGenerationFailed(#[source] ConceptError),
    #[error("Failed to save playlist to Spotify")]
    PlaylistWrite(#[source] anyhow::Error),
}
