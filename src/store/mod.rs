use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub mod redis_store;

pub use redis_store::RedisStore;

#[derive(Debug, Clone, PartialEq)]
pub struct SpotifyAccount {
    pub spotify_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub profile_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub spotify_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl StoredToken {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PlaylistKind {
    Auto,
    Custom,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPlaylist {
    pub user_id: String,
    pub spotify_playlist_id: String,
    pub name: String,
    pub description: String,
    pub playlist_url: String,
    pub kind: PlaylistKind,
    pub keywords: Option<String>,
    pub track_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaylistRecord {
    pub id: String,
    pub user_id: String,
    pub spotify_playlist_id: String,
    pub name: String,
    pub description: String,
    pub playlist_url: String,
    #[serde(rename = "type")]
    pub kind: PlaylistKind,
    pub keywords: Option<String>,
    pub track_count: usize,
    pub created_at: DateTime<Utc>,
}

impl PlaylistRecord {
    pub fn create(new: NewPlaylist) -> Self {
        PlaylistRecord {
            id: new_record_id(),
            user_id: new.user_id,
            spotify_playlist_id: new.spotify_playlist_id,
            name: new.name,
            description: new.description,
            playlist_url: new.playlist_url,
            kind: new.kind,
            keywords: new.keywords.filter(|k| !k.trim().is_empty()),
            track_count: new.track_count,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn upsert_user(&self, account: SpotifyAccount) -> Result<UserRecord>;

    async fn user_by_id(&self, user_id: &str) -> Result<Option<UserRecord>>;

    async fn save_tokens(&self, user_id: &str, token: &StoredToken) -> Result<()>;

    async fn tokens(&self, user_id: &str) -> Result<Option<StoredToken>>;

    async fn insert_playlist(&self, playlist: NewPlaylist) -> Result<PlaylistRecord>;

    // Newest first.
    async fn user_playlists(&self, user_id: &str) -> Result<Vec<PlaylistRecord>>;

    async fn delete_playlist(&self, user_id: &str, record_id: &str) -> Result<bool>;

    async fn put_oauth_state(&self, digest: &str, ttl_secs: u64) -> Result<()>;

    // Single use: a second call for the same digest returns false.
    async fn take_oauth_state(&self, digest: &str) -> Result<bool>;
}

pub fn new_record_id() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    hex::encode(bytes)
}
