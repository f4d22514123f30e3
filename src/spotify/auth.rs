use anyhow::{Context, Result};
use base64::Engine;
use rand::Rng;
use rspotify::prelude::*;
use sha2::{Digest, Sha256};
use tracing::info;

use super::{current_token, oauth, oauth_client};
use crate::config::Config;
use crate::store::{SpotifyAccount, StoredToken};

pub const STATE_TTL_SECS: u64 = 600;

pub fn generate_state() -> String {
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.gen_range(0u8..=255u8)).collect();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&bytes)
}

pub fn state_digest(state: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(state.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn authorize_url(config: &Config, state: &str) -> Result<String> {
    let creds = rspotify::Credentials::new(&config.client_id, &config.client_secret);
    let params = rspotify::OAuth {
        state: state.to_string(),
        ..oauth(config)
    };
    let spotify = rspotify::AuthCodeSpotify::new(creds, params);
    spotify
        .get_authorize_url(false)
        .context("Failed to build Spotify authorize URL")
}

pub struct AuthResult {
    pub account: SpotifyAccount,
    pub token: StoredToken,
}

pub async fn exchange_code(config: &Config, code: &str) -> Result<AuthResult> {
    let spotify = oauth_client(config);
    spotify
        .request_token(code)
        .await
        .context("Failed to authenticate with Spotify")?;
    let token = current_token(&spotify).await?;

    let me = spotify
        .current_user()
        .await
        .context("Failed to read Spotify profile")?;
    let account = SpotifyAccount {
        spotify_id: me.id.id().to_string(),
        email: me.email,
        display_name: me.display_name,
        profile_image: me
            .images
            .and_then(|images| images.into_iter().next())
            .map(|image| image.url),
    };

    info!(spotify_id = %account.spotify_id, "Spotify code exchanged");
    Ok(AuthResult { account, token })
}
