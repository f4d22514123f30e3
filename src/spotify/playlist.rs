use anyhow::Result;
use rspotify::{
    model::{FullPlaylist, PlaylistId, TrackId},
    prelude::*,
    AuthCodeSpotify,
};
use std::sync::Arc;

// Spotify accepts at most this many items per add request.
const ADD_BATCH_SIZE: usize = 100;

pub struct Playlists {
    spotify: Arc<AuthCodeSpotify>,
}

impl Playlists {
    pub fn new(spotify: Arc<AuthCodeSpotify>) -> Self {
        Playlists { spotify }
    }

    pub async fn create(&self, name: &str, description: &str) -> Result<FullPlaylist> {
        let me = self.spotify.current_user().await?;
        let playlist = self
            .spotify
            .user_playlist_create(me.id, name, Some(true), None, Some(description))
            .await?;
        Ok(playlist)
    }

    pub async fn add_tracks(&self, playlist_id: &str, track_uris: &[String]) -> Result<()> {
        let pid = PlaylistId::from_id(playlist_id)?;
        for batch in track_uris.chunks(ADD_BATCH_SIZE) {
            let items = batch
                .iter()
                .map(|uri| TrackId::from_uri(uri).map(PlayableId::Track))
                .collect::<Result<Vec<_>, _>>()?;
            self.spotify
                .playlist_add_items(pid.clone(), items, None)
                .await?;
        }
        Ok(())
    }
}
