use std::{collections::HashSet, sync::Arc};

use tracing::info;

use super::{
    selection, CatalogGateway, DraftPlaylist, PlaylistError, PublishedPlaylist, TimeWindow,
    TrackCandidate, DEFAULT_TRACK_LIMIT,
};
use crate::{
    concept::{ConceptGateway, PlaylistConcept},
    profile::{self, TasteProfile, TopArtist},
};

const TOP_TRACK_LIMIT: u32 = 50;
const TOP_ARTIST_LIMIT: u32 = 20;
const SEARCH_LIMIT: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource<'a> {
    // Spotify's seed-based recommendations no longer answer for new apps,
    // so the listener's own recent top tracks stand in for them.
    RecommendationFallback,
    KeywordSearch(&'a str),
}

#[derive(Debug, Clone, Copy)]
pub struct GenerationPlan<'a> {
    pub history_window: TimeWindow,
    pub source: CandidateSource<'a>,
    pub discovery_mode: bool,
}

impl<'a> GenerationPlan<'a> {
    pub fn auto() -> Self {
        GenerationPlan {
            history_window: TimeWindow::ShortTerm,
            source: CandidateSource::RecommendationFallback,
            discovery_mode: false,
        }
    }

    pub fn custom(keywords: &'a str, discovery_mode: bool) -> Self {
        GenerationPlan {
            history_window: TimeWindow::MediumTerm,
            source: CandidateSource::KeywordSearch(keywords),
            discovery_mode,
        }
    }

    pub fn keywords(&self) -> Option<&'a str> {
        match self.source {
            CandidateSource::KeywordSearch(keywords) => Some(keywords),
            CandidateSource::RecommendationFallback => None,
        }
    }
}

pub struct PlaylistAssembler {
    catalog: Arc<dyn CatalogGateway>,
    concepts: Arc<dyn ConceptGateway>,
}

impl PlaylistAssembler {
    pub fn new(catalog: Arc<dyn CatalogGateway>, concepts: Arc<dyn ConceptGateway>) -> Self {
        PlaylistAssembler { catalog, concepts }
    }

    pub async fn auto_generate(&self, user_id: &str) -> Result<PublishedPlaylist, PlaylistError> {
        let draft = self.draft(user_id, &GenerationPlan::auto()).await?;
        let uris = track_uris(&draft.tracks);
        self.publish(user_id, &draft.concept_name, &draft.concept_description, &uris)
            .await
    }

    pub async fn custom_generate(
        &self,
        user_id: &str,
        keywords: &str,
        discovery_mode: bool,
    ) -> Result<DraftPlaylist, PlaylistError> {
        self.draft(user_id, &GenerationPlan::custom(keywords, discovery_mode))
            .await
    }

    pub async fn create_from_approved_tracks(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
        track_uris: &[String],
    ) -> Result<PublishedPlaylist, PlaylistError> {
        self.publish(user_id, name, description, track_uris).await
    }

    pub async fn draft(&self, user_id: &str, plan: &GenerationPlan<'_>) -> Result<DraftPlaylist, PlaylistError> {
        info!(user_id, window = %plan.history_window, "Step 1: fetching listening history");
        let (top_tracks, top_artists) = self.listening_history(user_id, plan.history_window).await?;

        info!(user_id, artists = top_artists.len(), "Step 2: estimating taste profile");
        let profile = profile::estimate(&top_artists);

        info!(user_id, mood = %profile.mood_tendency, "Step 3: generating playlist concept");
        let concept = self.concept(&profile, plan.keywords()).await?;

        let candidates = match plan.source {
            CandidateSource::KeywordSearch(keywords) => {
                info!(user_id, keywords, "Step 4: searching tracks");
                self.catalog
                    .search_tracks(user_id, keywords, SEARCH_LIMIT)
                    .await
                    .map_err(PlaylistError::UpstreamFetch)?
            }
            CandidateSource::RecommendationFallback => {
                info!(user_id, "Step 4: using recent top tracks as recommendations");
                top_tracks.clone()
            }
        };

        let already_heard: HashSet<String> = top_tracks.into_iter().map(|track| track.id).collect();
        let tracks = selection::select(candidates, &already_heard, plan.discovery_mode, DEFAULT_TRACK_LIMIT);
        info!(user_id, tracks = tracks.len(), discovery = plan.discovery_mode, "Step 5: tracks selected");

        Ok(DraftPlaylist {
            concept_name: concept.name,
            concept_description: concept.description,
            tracks,
        })
    }

    async fn listening_history(
        &self,
        user_id: &str,
        window: TimeWindow,
    ) -> Result<(Vec<TrackCandidate>, Vec<TopArtist>), PlaylistError> {
        futures::try_join!(
            self.catalog.top_tracks(user_id, window, TOP_TRACK_LIMIT),
            self.catalog.top_artists(user_id, TimeWindow::MediumTerm, TOP_ARTIST_LIMIT),
        )
        .map_err(PlaylistError::UpstreamFetch)
    }

    async fn concept(&self, profile: &TasteProfile, keywords: Option<&str>) -> Result<PlaylistConcept, PlaylistError> {
        let concept = match keywords {
            Some(keywords) => self.concepts.generate_concept_from_keywords(keywords, profile).await,
            None => self.concepts.generate_concept(profile).await,
        };
        concept.map_err(PlaylistError::ConceptGenerationFailed)
    }

    async fn publish(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
        track_uris: &[String],
    ) -> Result<PublishedPlaylist, PlaylistError> {
        info!(user_id, name, "Step 6: creating playlist");
        let created = self
            .catalog
            .create_playlist(user_id, name, description)
            .await
            .map_err(PlaylistError::PlaylistWrite)?;

        // A failure here leaves the playlist created but empty.
        if !track_uris.is_empty() {
            self.catalog
                .add_tracks_to_playlist(user_id, &created.id, track_uris)
                .await
                .map_err(PlaylistError::PlaylistWrite)?;
        }

        info!(user_id, playlist = %created.id, tracks = track_uris.len(), "playlist published");
        Ok(PublishedPlaylist {
            id: created.id,
            external_url: created.external_url,
            name: name.to_string(),
            description: description.to_string(),
            track_count: track_uris.len(),
        })
    }
}

fn track_uris(tracks: &[TrackCandidate]) -> Vec<String> {
    tracks.iter().map(|track| track.uri.clone()).collect()
}
