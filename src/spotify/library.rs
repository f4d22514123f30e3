use anyhow::Result;
use rspotify::{
    model::{FullArtist, FullTrack, SimplifiedPlaylist, TimeRange},
    prelude::*,
    AuthCodeSpotify,
};
use std::sync::Arc;

use crate::playlist::TimeWindow;

pub struct Library {
    spotify: Arc<AuthCodeSpotify>,
}

impl Library {
    pub fn new(spotify: Arc<AuthCodeSpotify>) -> Self {
        Library { spotify }
    }

    pub async fn get_top_tracks(&self, window: TimeWindow, limit: u32) -> Result<Vec<FullTrack>> {
        let page = self
            .spotify
            .current_user_top_tracks_manual(Some(time_range(window)), Some(limit), Some(0))
            .await?;
        Ok(page.items)
    }

    pub async fn get_top_artists(&self, window: TimeWindow, limit: u32) -> Result<Vec<FullArtist>> {
        let page = self
            .spotify
            .current_user_top_artists_manual(Some(time_range(window)), Some(limit), Some(0))
            .await?;
        Ok(page.items)
    }

    pub async fn get_user_playlists(&self, limit: u32) -> Result<Vec<SimplifiedPlaylist>> {
        let page = self
            .spotify
            .current_user_playlists_manual(Some(limit), Some(0))
            .await?;
        Ok(page.items)
    }
}

fn time_range(window: TimeWindow) -> TimeRange {
    match window {
        TimeWindow::ShortTerm => TimeRange::ShortTerm,
        TimeWindow::MediumTerm => TimeRange::MediumTerm,
    }
}
