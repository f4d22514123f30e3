use crate::profile::TasteProfile;

const CURATOR_ROLE: &str = "You are an expert music curator.";

const RULES: &str = "\
- Do NOT name specific songs
- Do NOT name albums
- Do NOT include links
- Answer ONLY with raw JSON (no markdown, no ```json fences)
- Follow the response format exactly
- energy, valence and novelty values must be between 0.0 and 1.0";

const RESPONSE_FORMAT: &str = r#"{
  "playlist_name": "string",
  "description": "string",
  "target_energy": [0.0, 1.0],
  "target_valence": [0.0, 1.0],
  "preferred_genres": ["string"],
  "novelty": 0.0,
  "avoid_artists": ["string"]
}"#;

pub fn profile_prompt(profile: &TasteProfile) -> String {
    format!(
        "{CURATOR_ROLE}

Based on the listening profile below, create the CONCEPT of a personalised playlist.

RULES:
{RULES}

Listening profile:
{profile}

Required response format:
{RESPONSE_FORMAT}
",
        profile = profile_json(profile),
    )
}

pub fn keyword_prompt(keywords: &str, profile: &TasteProfile) -> String {
    format!(
        "{CURATOR_ROLE}

The user wants a playlist built around these keywords: \"{keywords}\"

Also take the user's listening profile into account to personalise it:
{profile}

RULES:
- Pick a creative name and description that reflect the keywords
- Use the keywords to define the style of the playlist
{RULES}

Required response format:
{RESPONSE_FORMAT}
",
        profile = profile_json(profile),
    )
}

fn profile_json(profile: &TasteProfile) -> String {
    // TasteProfile holds only strings, floats and unit enums
    serde_json::to_string_pretty(profile).unwrap_or_default()
}
