use anyhow::Result;
use rspotify::{
    model::{FullTrack, SearchResult, SearchType},
    prelude::*,
    AuthCodeSpotify,
};
use std::sync::Arc;

pub struct Search {
    spotify: Arc<AuthCodeSpotify>,
}

impl Search {
    pub fn new(spotify: Arc<AuthCodeSpotify>) -> Self {
        Search { spotify }
    }

    pub async fn search_tracks(&self, query: &str, limit: u32) -> Result<Vec<FullTrack>> {
        if query.trim().is_empty() {
            return Ok(vec![]);
        }
        let result = self
            .spotify
            .search(
                query,
                SearchType::Track,
                None,
                None,
                Some(limit),
                None,
            )
            .await?;

        let tracks = match result {
            SearchResult::Tracks(page) => page.items,
            _ => vec![],
        };
        Ok(tracks)
    }
}
