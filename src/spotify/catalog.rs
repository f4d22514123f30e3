use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rspotify::{
    model::{FullArtist, FullTrack, SimplifiedPlaylist},
    prelude::*,
    AuthCodeSpotify,
};

use super::{build_spotify_client, library::Library, playlist::Playlists, search::Search, TokenKeeper};
use crate::{
    config::Config,
    playlist::{CatalogGateway, CreatedPlaylist, PlaylistSummary, TimeWindow, TrackCandidate},
    profile::TopArtist,
    store::Store,
};

pub struct SpotifyCatalog {
    config: Arc<Config>,
    tokens: TokenKeeper,
}

impl SpotifyCatalog {
    pub fn new(config: Arc<Config>, store: Arc<dyn Store>) -> Self {
        SpotifyCatalog { config, tokens: TokenKeeper::new(store) }
    }

    async fn client(&self, user_id: &str) -> Result<Arc<AuthCodeSpotify>> {
        let spotify = build_spotify_client(&self.config, &self.tokens, user_id).await?;
        Ok(Arc::new(spotify))
    }
}

#[async_trait]
impl CatalogGateway for SpotifyCatalog {
    async fn top_tracks(&self, user_id: &str, window: TimeWindow, limit: u32) -> Result<Vec<TrackCandidate>> {
        let library = Library::new(self.client(user_id).await?);
        let tracks = library.get_top_tracks(window, limit).await?;
        Ok(tracks.into_iter().filter_map(to_candidate).collect())
    }

    async fn top_artists(&self, user_id: &str, window: TimeWindow, limit: u32) -> Result<Vec<TopArtist>> {
        let library = Library::new(self.client(user_id).await?);
        let artists = library.get_top_artists(window, limit).await?;
        Ok(artists.into_iter().map(to_top_artist).collect())
    }

    async fn search_tracks(&self, user_id: &str, query: &str, limit: u32) -> Result<Vec<TrackCandidate>> {
        let search = Search::new(self.client(user_id).await?);
        let tracks = search.search_tracks(query, limit).await?;
        Ok(tracks.into_iter().filter_map(to_candidate).collect())
    }

    async fn create_playlist(&self, user_id: &str, name: &str, description: &str) -> Result<CreatedPlaylist> {
        let playlists = Playlists::new(self.client(user_id).await?);
        let playlist = playlists.create(name, description).await?;
        let external_url = playlist
            .external_urls
            .get("spotify")
            .cloned()
            .context("Spotify playlist has no external URL")?;
        Ok(CreatedPlaylist {
            id: playlist.id.id().to_string(),
            external_url,
        })
    }

    async fn add_tracks_to_playlist(&self, user_id: &str, playlist_id: &str, uris: &[String]) -> Result<()> {
        let playlists = Playlists::new(self.client(user_id).await?);
        playlists.add_tracks(playlist_id, uris).await
    }

    async fn user_playlists(&self, user_id: &str, limit: u32) -> Result<Vec<PlaylistSummary>> {
        let library = Library::new(self.client(user_id).await?);
        let playlists = library.get_user_playlists(limit).await?;
        Ok(playlists.into_iter().map(to_summary).collect())
    }
}

// Local files and unavailable tracks carry no id and are skipped.
fn to_candidate(track: FullTrack) -> Option<TrackCandidate> {
    let id = track.id?;
    Some(TrackCandidate {
        id: id.id().to_string(),
        uri: id.uri(),
        artist: track
            .artists
            .into_iter()
            .next()
            .map(|artist| artist.name)
            .unwrap_or_else(|| "Unknown Artist".to_string()),
        album: if track.album.name.is_empty() {
            "Unknown Album".to_string()
        } else {
            track.album.name
        },
        album_art: track
            .album
            .images
            .into_iter()
            .next()
            .map(|image| image.url)
            .unwrap_or_default(),
        name: track.name,
    })
}

fn to_top_artist(artist: FullArtist) -> TopArtist {
    TopArtist {
        id: artist.id.id().to_string(),
        name: artist.name,
        genres: artist.genres,
        image_url: artist.images.into_iter().next().map(|image| image.url),
        followers: artist.followers.total,
        popularity: artist.popularity,
        external_url: artist.external_urls.get("spotify").cloned(),
    }
}

fn to_summary(playlist: SimplifiedPlaylist) -> PlaylistSummary {
    PlaylistSummary {
        id: playlist.id.id().to_string(),
        name: playlist.name,
        external_url: playlist.external_urls.get("spotify").cloned(),
        image_url: playlist.images.into_iter().next().map(|image| image.url),
        track_count: playlist.tracks.total,
    }
}
