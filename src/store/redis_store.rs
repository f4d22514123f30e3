use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use redis::{aio::MultiplexedConnection, AsyncCommands};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use super::{
    new_record_id, NewPlaylist, PlaylistRecord, SpotifyAccount, Store, StoredToken, UserRecord,
};

const KEY_PREFIX: &str = "recomenfy";

fn user_key(user_id: &str) -> String {
    format!("{KEY_PREFIX}:user:{user_id}")
}

fn spotify_index_key(spotify_id: &str) -> String {
    format!("{KEY_PREFIX}:user_by_spotify:{spotify_id}")
}

fn token_key(user_id: &str) -> String {
    format!("{KEY_PREFIX}:spotify_token:{user_id}")
}

fn playlists_key(user_id: &str) -> String {
    format!("{KEY_PREFIX}:playlists:{user_id}")
}

fn oauth_state_key(digest: &str) -> String {
    format!("{KEY_PREFIX}:oauth_state:{digest}")
}

// LREM needs the exact stored string, so the list entry is returned as-is.
fn find_record_json<'a>(raw: &'a [String], record_id: &str) -> Option<&'a str> {
    raw.iter()
        .map(String::as_str)
        .find(|json| {
            serde_json::from_str::<PlaylistRecord>(json)
                .map(|record| record.id == record_id)
                .unwrap_or(false)
        })
}

pub struct RedisStore {
    client: redis::Client,
}

impl RedisStore {
    pub fn new(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .with_context(|| format!("Invalid Redis URL {redis_url}"))?;
        Ok(RedisStore { client })
    }

    pub async fn ping(&self) -> bool {
        match self.client.get_multiplexed_async_connection().await {
            Ok(mut conn) => {
                let result: std::result::Result<String, _> =
                    redis::cmd("PING").query_async(&mut conn).await;
                result.is_ok()
            }
            Err(_) => false,
        }
    }

    async fn conn(&self) -> Result<MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .context("Redis is unreachable")
    }

    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.conn().await?;
        let raw: Option<String> = conn.get(key).await?;
        raw.map(|json| serde_json::from_str(&json).with_context(|| format!("Corrupt value at {key}")))
            .transpose()
    }

    async fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value)?;
        let mut conn = self.conn().await?;
        let _: () = conn.set(key, json).await?;
        Ok(())
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn upsert_user(&self, account: SpotifyAccount) -> Result<UserRecord> {
        let index_key = spotify_index_key(&account.spotify_id);
        let existing_id: Option<String> = self.conn().await?.get(&index_key).await?;
        let existing = match existing_id {
            Some(id) => self.user_by_id(&id).await?,
            None => None,
        };

        let now = Utc::now();
        let user = match existing {
            Some(user) => UserRecord {
                email: account.email,
                display_name: account.display_name,
                profile_image: account.profile_image,
                updated_at: now,
                ..user
            },
            None => UserRecord {
                id: new_record_id(),
                spotify_id: account.spotify_id,
                email: account.email,
                display_name: account.display_name,
                profile_image: account.profile_image,
                created_at: now,
                updated_at: now,
            },
        };

        self.set_json(&user_key(&user.id), &user).await?;
        let _: () = self.conn().await?.set(&index_key, &user.id).await?;
        debug!(user_id = %user.id, "user upserted");
        Ok(user)
    }

    async fn user_by_id(&self, user_id: &str) -> Result<Option<UserRecord>> {
        self.get_json(&user_key(user_id)).await
    }

    async fn save_tokens(&self, user_id: &str, token: &StoredToken) -> Result<()> {
        self.set_json(&token_key(user_id), token).await
    }

    async fn tokens(&self, user_id: &str) -> Result<Option<StoredToken>> {
        self.get_json(&token_key(user_id)).await
    }

    async fn insert_playlist(&self, playlist: NewPlaylist) -> Result<PlaylistRecord> {
        let record = PlaylistRecord::create(playlist);
        let json = serde_json::to_string(&record)?;
        let mut conn = self.conn().await?;
        let _: () = conn.lpush(playlists_key(&record.user_id), json).await?;
        Ok(record)
    }

    async fn user_playlists(&self, user_id: &str) -> Result<Vec<PlaylistRecord>> {
        let mut conn = self.conn().await?;
        let raw: Vec<String> = conn.lrange(playlists_key(user_id), 0, -1).await?;
        raw.iter()
            .map(|json| serde_json::from_str(json).context("Corrupt playlist record"))
            .collect()
    }

    async fn delete_playlist(&self, user_id: &str, record_id: &str) -> Result<bool> {
        let key = playlists_key(user_id);
        let mut conn = self.conn().await?;
        let raw: Vec<String> = conn.lrange(&key, 0, -1).await?;

        match find_record_json(&raw, record_id) {
            Some(json) => {
                let removed: i64 = conn.lrem(&key, 1, json).await?;
                Ok(removed > 0)
            }
            None => Ok(false),
        }
    }

    async fn put_oauth_state(&self, digest: &str, ttl_secs: u64) -> Result<()> {
        let mut conn = self.conn().await?;
        let _: () = conn.set_ex(oauth_state_key(digest), "1", ttl_secs).await?;
        Ok(())
    }

    async fn take_oauth_state(&self, digest: &str) -> Result<bool> {
        let mut conn = self.conn().await?;
        let removed: i64 = conn.del(oauth_state_key(digest)).await?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::PlaylistKind;

    #[test]
    fn test_keys_are_namespaced() {
        assert_eq!(user_key("abc"), "recomenfy:user:abc");
        assert_eq!(spotify_index_key("sp1"), "recomenfy:user_by_spotify:sp1");
        assert_eq!(token_key("abc"), "recomenfy:spotify_token:abc");
        assert_eq!(playlists_key("abc"), "recomenfy:playlists:abc");
        assert_eq!(oauth_state_key("ff00"), "recomenfy:oauth_state:ff00");
    }

    fn stored_record(user_id: &str, name: &str) -> (PlaylistRecord, String) {
        let record = PlaylistRecord::create(NewPlaylist {
            user_id: user_id.to_string(),
            spotify_playlist_id: format!("sp-{name}"),
            name: name.to_string(),
            description: String::new(),
            playlist_url: format!("https://open.spotify.com/playlist/sp-{name}"),
            kind: PlaylistKind::Auto,
            keywords: None,
            track_count: 30,
        });
        let json = serde_json::to_string(&record).unwrap();
        (record, json)
    }

    #[test]
    fn test_find_record_json_matches_by_id() {
        let (first, first_json) = stored_record("u1", "first");
        let (second, second_json) = stored_record("u1", "second");
        let raw = vec![second_json.clone(), "{not json".to_string(), first_json.clone()];

        assert_eq!(find_record_json(&raw, &first.id), Some(first_json.as_str()));
        assert_eq!(find_record_json(&raw, &second.id), Some(second_json.as_str()));
        assert_eq!(find_record_json(&raw, "missing"), None);
        assert_eq!(find_record_json(&[], &first.id), None);
    }

    #[test]
    fn test_stored_record_round_trips_with_type_tag() {
        let (record, json) = stored_record("u1", "tagged");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "auto");
        assert_eq!(serde_json::from_str::<PlaylistRecord>(&json).unwrap(), record);
    }
}
