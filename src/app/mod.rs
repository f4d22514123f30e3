use std::sync::Arc;

use anyhow::{bail, Result};
use serde::Serialize;
use tracing::info;

use crate::{
    concept::{gemini::GeminiClient, ConceptGateway, ConceptGenerator},
    config::Config,
    playlist::{
        CatalogGateway, DraftPlaylist, PlaylistAssembler, PlaylistError, PlaylistSummary,
        PublishedPlaylist, TimeWindow,
    },
    profile::{self, DiscoveryTolerance, MoodTendency, TopArtist},
    server::auth::SessionKeys,
    spotify::{auth, SpotifyCatalog},
    store::{NewPlaylist, PlaylistKind, PlaylistRecord, Store, UserRecord},
};

const PROFILE_ARTIST_LIMIT: u32 = 20;
const PROFILE_HEADLINE_ARTISTS: usize = 5;
const USER_PLAYLIST_LIMIT: u32 = 50;

#[derive(Debug, Clone, Serialize)]
pub struct ProfileOverview {
    pub energy_avg: f64,
    pub valence_avg: f64,
    pub danceability_avg: f64,
    pub top_genres: Vec<String>,
    pub top_artists: Vec<String>,
    pub top_artists_full: Vec<TopArtist>,
    pub mood_tendency: MoodTendency,
    pub discovery_tolerance: DiscoveryTolerance,
}

#[derive(Debug)]
pub struct Session {
    pub user: UserRecord,
    pub token: String,
}

pub struct App {
    pub config: Arc<Config>,
    pub sessions: SessionKeys,
    store: Arc<dyn Store>,
    catalog: Arc<dyn CatalogGateway>,
    assembler: PlaylistAssembler,
}

impl App {
    pub fn new(config: Arc<Config>, store: Arc<dyn Store>) -> Result<Self> {
        let catalog: Arc<dyn CatalogGateway> =
            Arc::new(SpotifyCatalog::new(config.clone(), store.clone()));
        let gemini = GeminiClient::new(&config.gemini_api_key, &config.gemini_model)?;
        let concepts: Arc<dyn ConceptGateway> = Arc::new(ConceptGenerator::new(gemini));
        Ok(Self::with_collaborators(config, store, catalog, concepts))
    }

    pub fn with_collaborators(
        config: Arc<Config>,
        store: Arc<dyn Store>,
        catalog: Arc<dyn CatalogGateway>,
        concepts: Arc<dyn ConceptGateway>,
    ) -> Self {
        App {
            sessions: SessionKeys::new(&config.jwt_secret),
            assembler: PlaylistAssembler::new(catalog.clone(), concepts),
            config,
            store,
            catalog,
        }
    }

    // ── Login ────────────────────────────────────────────────────────────────

    pub async fn begin_login(&self) -> Result<String> {
        let state = auth::generate_state();
        self.store
            .put_oauth_state(&auth::state_digest(&state), auth::STATE_TTL_SECS)
            .await?;
        auth::authorize_url(&self.config, &state)
    }

    pub async fn complete_login(&self, code: &str, state: &str) -> Result<Session> {
        if !self.store.take_oauth_state(&auth::state_digest(state)).await? {
            bail!("Unknown or expired OAuth state");
        }

        let result = auth::exchange_code(&self.config, code).await?;
        let user = self.store.upsert_user(result.account).await?;
        self.store.save_tokens(&user.id, &result.token).await?;
        let token = self.sessions.issue(&user)?;

        info!(
            user_id = %user.id,
            spotify_id = %user.spotify_id,
            "User authenticated: {}",
            user.display_name.as_deref().unwrap_or("unknown")
        );
        Ok(Session { user, token })
    }

    pub async fn user(&self, user_id: &str) -> Result<Option<UserRecord>> {
        self.store.user_by_id(user_id).await
    }

    // ── Listening profile ────────────────────────────────────────────────────

    pub async fn music_profile(&self, user_id: &str) -> Result<ProfileOverview, PlaylistError> {
        let artists = self
            .catalog
            .top_artists(user_id, TimeWindow::MediumTerm, PROFILE_ARTIST_LIMIT)
            .await
            .map_err(PlaylistError::UpstreamFetch)?;
        let profile = profile::estimate(&artists);

        Ok(ProfileOverview {
            energy_avg: profile.energy_avg,
            valence_avg: profile.valence_avg,
            danceability_avg: profile.danceability_avg,
            top_genres: profile.top_genres,
            top_artists: artists
                .iter()
                .take(PROFILE_HEADLINE_ARTISTS)
                .map(|artist| artist.name.clone())
                .collect(),
            top_artists_full: artists,
            mood_tendency: profile.mood_tendency,
            discovery_tolerance: profile.discovery_tolerance,
        })
    }

    pub async fn spotify_playlists(&self, user_id: &str) -> Result<Vec<PlaylistSummary>> {
        self.catalog.user_playlists(user_id, USER_PLAYLIST_LIMIT).await
    }

    // ── Playlists ────────────────────────────────────────────────────────────

    pub async fn generate(&self, user_id: &str) -> Result<PublishedPlaylist> {
        let published = self.assembler.auto_generate(user_id).await?;
        self.record(user_id, &published, PlaylistKind::Auto, None)
            .await?;
        Ok(published)
    }

    pub async fn generate_custom(
        &self,
        user_id: &str,
        keywords: &str,
        discovery_mode: bool,
    ) -> Result<DraftPlaylist, PlaylistError> {
        self.assembler
            .custom_generate(user_id, keywords, discovery_mode)
            .await
    }

    pub async fn create_from_tracks(
        &self,
        user_id: &str,
        name: &str,
        description: &str,
        track_uris: &[String],
        keywords: Option<String>,
    ) -> Result<PublishedPlaylist> {
        let published = self
            .assembler
            .create_from_approved_tracks(user_id, name, description, track_uris)
            .await?;
        self.record(user_id, &published, PlaylistKind::Custom, keywords)
            .await?;
        Ok(published)
    }

    pub async fn history(&self, user_id: &str) -> Result<Vec<PlaylistRecord>> {
        self.store.user_playlists(user_id).await
    }

    pub async fn delete_from_history(&self, user_id: &str, record_id: &str) -> Result<bool> {
        self.store.delete_playlist(user_id, record_id).await
    }

    async fn record(
        &self,
        user_id: &str,
        published: &PublishedPlaylist,
        kind: PlaylistKind,
        keywords: Option<String>,
    ) -> Result<PlaylistRecord> {
        self.store
            .insert_playlist(NewPlaylist {
                user_id: user_id.to_string(),
                spotify_playlist_id: published.id.clone(),
                name: published.name.clone(),
                description: published.description.clone(),
                playlist_url: published.external_url.clone(),
                kind,
                keywords,
                track_count: published.track_count,
            })
            .await
    }
}
