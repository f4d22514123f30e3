use std::{collections::HashSet, future::Future, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use rspotify::{
    prelude::*, scopes, AuthCodeSpotify, Config as SpotifyConfig, Credentials, OAuth,
    Token,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::Config;
use crate::store::{Store, StoredToken};

pub mod auth;
pub mod catalog;
pub mod library;
pub mod playlist;
pub mod search;

pub use catalog::SpotifyCatalog;

fn oauth(config: &Config) -> OAuth {
    OAuth {
        redirect_uri: config.redirect_uri.clone(),
        scopes: scopes!(
            "user-top-read",
            "user-library-read",
            "user-read-recently-played",
            "playlist-modify-public",
            "playlist-modify-private",
            "user-read-email"
        ),
        ..Default::default()
    }
}

pub fn oauth_client(config: &Config) -> AuthCodeSpotify {
    let creds = Credentials::new(&config.client_id, &config.client_secret);
    AuthCodeSpotify::with_config(creds, oauth(config), SpotifyConfig::default())
}

// Hands out a usable token per user. Only one refresh runs at a time; a
// caller that waited on the lock re-reads the store and reuses the token the
// previous holder saved.
pub struct TokenKeeper {
    store: Arc<dyn Store>,
    refresh_lock: Mutex<()>,
}

impl TokenKeeper {
    pub fn new(store: Arc<dyn Store>) -> Self {
        TokenKeeper { store, refresh_lock: Mutex::new(()) }
    }

    pub async fn fresh_token<F, Fut>(&self, user_id: &str, refresh: F) -> Result<StoredToken>
    where
        F: FnOnce(StoredToken) -> Fut,
        Fut: Future<Output = Result<StoredToken>>,
    {
        let stored = self.stored(user_id).await?;
        if !stored.is_expired() {
            return Ok(stored);
        }

        let _guard = self.refresh_lock.lock().await;
        let stored = self.stored(user_id).await?;
        if !stored.is_expired() {
            return Ok(stored);
        }

        info!(user_id, "Spotify token expired, refreshing");
        let previous_refresh = stored.refresh_token.clone();
        let mut renewed = refresh(stored).await.inspect_err(|e| {
            warn!(user_id, "Failed to refresh Spotify token: {e:#}");
        })?;
        // Spotify may omit the refresh token when it is unchanged
        if renewed.refresh_token.is_none() {
            renewed.refresh_token = previous_refresh;
        }
        self.store.save_tokens(user_id, &renewed).await?;
        info!(user_id, "Spotify token refreshed");
        Ok(renewed)
    }

    async fn stored(&self, user_id: &str) -> Result<StoredToken> {
        self.store
            .tokens(user_id)
            .await?
            .ok_or_else(|| anyhow!("User not authenticated"))
    }
}

pub async fn build_spotify_client(
    config: &Config,
    tokens: &TokenKeeper,
    user_id: &str,
) -> Result<AuthCodeSpotify> {
    let token = tokens
        .fresh_token(user_id, |stale| refresh_token(config, stale))
        .await?;
    let spotify = oauth_client(config);
    set_token(&spotify, to_token(&token)).await?;
    Ok(spotify)
}

async fn refresh_token(config: &Config, stale: StoredToken) -> Result<StoredToken> {
    let spotify = oauth_client(config);
    set_token(&spotify, to_token(&stale)).await?;
    match spotify.refetch_token().await {
        Ok(Some(token)) => Ok(from_token(&token)),
        Ok(None) => bail!("No refresh token available"),
        Err(e) => Err(anyhow!(e).context("Failed to refresh token")),
    }
}

async fn set_token(spotify: &AuthCodeSpotify, token: Token) -> Result<()> {
    let mut slot = spotify
        .token
        .lock()
        .await
        .map_err(|_| anyhow!("Spotify token lock poisoned"))?;
    *slot = Some(token);
    Ok(())
}

pub async fn current_token(spotify: &AuthCodeSpotify) -> Result<StoredToken> {
    let slot = spotify
        .token
        .lock()
        .await
        .map_err(|_| anyhow!("Spotify token lock poisoned"))?;
    slot.as_ref()
        .map(from_token)
        .context("Spotify returned no token")
}

pub fn from_token(token: &Token) -> StoredToken {
    StoredToken {
        access_token: token.access_token.clone(),
        refresh_token: token.refresh_token.clone(),
        expires_at: token.expires_at.unwrap_or_else(|| Utc::now() + token.expires_in),
        scopes: token.scopes.iter().cloned().collect(),
    }
}

pub fn to_token(stored: &StoredToken) -> Token {
    Token {
        access_token: stored.access_token.clone(),
        expires_in: stored.expires_at - Utc::now(),
        expires_at: Some(stored.expires_at),
        refresh_token: stored.refresh_token.clone(),
        scopes: stored.scopes.iter().cloned().collect::<HashSet<_>>(),
    }
}
