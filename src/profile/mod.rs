//! Taste profile estimation from a listener's top artists.
//!
//! There is no audio analysis here: each genre tag is classified by the first
//! keyword in [`GENRE_KEYWORDS`] it contains, and the matching
//! (energy, valence, danceability) triples are averaged.

use serde::Serialize;

pub const TOP_GENRE_COUNT: usize = 5;

const NEUTRAL: AudioTriple = AudioTriple::new(0.5, 0.5, 0.5);

// Genre keywords scanned in declaration order; the first keyword contained in
// a tag wins, so "indie pop" counts as "pop".
pub const GENRE_KEYWORDS: &[(&str, AudioTriple)] = &[
    ("pop", AudioTriple::new(0.8, 0.8, 0.8)),
    ("rock", AudioTriple::new(0.8, 0.5, 0.5)),
    ("hip hop", AudioTriple::new(0.7, 0.6, 0.8)),
    ("rap", AudioTriple::new(0.7, 0.5, 0.8)),
    ("indie", AudioTriple::new(0.6, 0.6, 0.6)),
    ("jazz", AudioTriple::new(0.4, 0.6, 0.5)),
    ("classical", AudioTriple::new(0.2, 0.5, 0.1)),
    ("metal", AudioTriple::new(0.95, 0.3, 0.3)),
    ("dance", AudioTriple::new(0.9, 0.8, 0.9)),
    ("electronic", AudioTriple::new(0.8, 0.7, 0.8)),
    ("latin", AudioTriple::new(0.8, 0.9, 0.9)),
    ("folk", AudioTriple::new(0.3, 0.5, 0.4)),
    ("r&b", AudioTriple::new(0.5, 0.6, 0.7)),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioTriple {
    pub energy: f64,
    pub valence: f64,
    pub danceability: f64,
}

impl AudioTriple {
    pub const fn new(energy: f64, valence: f64, danceability: f64) -> Self {
        AudioTriple { energy, valence, danceability }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TopArtist {
    pub id: String,
    pub name: String,
    pub genres: Vec<String>,
    pub image_url: Option<String>,
    pub followers: u32,
    pub popularity: u32,
    pub external_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum MoodTendency {
    #[serde(rename = "excited/extroverted")]
    #[strum(to_string = "excited/extroverted")]
    Excited,
    #[serde(rename = "intense/aggressive")]
    #[strum(to_string = "intense/aggressive")]
    Intense,
    #[serde(rename = "relaxed/peaceful")]
    #[strum(to_string = "relaxed/peaceful")]
    Relaxed,
    #[serde(rename = "melancholic/sad")]
    #[strum(to_string = "melancholic/sad")]
    Melancholic,
    #[serde(rename = "energetic")]
    #[strum(to_string = "energetic")]
    Energetic,
    #[serde(rename = "chill")]
    #[strum(to_string = "chill")]
    Chill,
}

impl MoodTendency {
    pub fn from_coordinates(energy: f64, valence: f64) -> Self {
        if energy > 0.7 && valence > 0.6 {
            MoodTendency::Excited
        } else if energy > 0.7 && valence < 0.4 {
            MoodTendency::Intense
        } else if energy < 0.4 && valence > 0.6 {
            MoodTendency::Relaxed
        } else if energy < 0.4 && valence < 0.4 {
            MoodTendency::Melancholic
        } else if energy > 0.5 {
            MoodTendency::Energetic
        } else {
            MoodTendency::Chill
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DiscoveryTolerance {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TasteProfile {
    pub energy_avg: f64,
    pub valence_avg: f64,
    pub danceability_avg: f64,
    pub top_genres: Vec<String>,
    #[serde(rename = "top_artists")]
    pub top_artist_ids: Vec<String>,
    pub mood_tendency: MoodTendency,
    pub discovery_tolerance: DiscoveryTolerance,
}

pub fn estimate(artists: &[TopArtist]) -> TasteProfile {
    let tags = || artists.iter().flat_map(|artist| artist.genres.iter());

    let averages = average_features(tags());
    TasteProfile {
        energy_avg: averages.energy,
        valence_avg: averages.valence,
        danceability_avg: averages.danceability,
        top_genres: rank_genres(tags()),
        top_artist_ids: artists.iter().map(|artist| artist.id.clone()).collect(),
        mood_tendency: MoodTendency::from_coordinates(averages.energy, averages.valence),
        // Not derived from listening data yet.
        discovery_tolerance: DiscoveryTolerance::Medium,
    }
}

fn rank_genres<'a>(tags: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for tag in tags {
        match counts.iter_mut().find(|(genre, _)| *genre == tag.as_str()) {
            Some((_, count)) => *count += 1,
            None => counts.push((tag.as_str(), 1)),
        }
    }

    // sort_by is stable, so equal counts keep insertion order
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(TOP_GENRE_COUNT)
        .map(|(genre, _)| genre.to_string())
        .collect()
}

pub fn classify_genre(tag: &str) -> AudioTriple {
    let tag = tag.to_lowercase();
    GENRE_KEYWORDS
        .iter()
        .find(|(keyword, _)| tag.contains(keyword))
        .map(|(_, triple)| *triple)
        .unwrap_or(NEUTRAL)
}

fn average_features<'a>(tags: impl Iterator<Item = &'a String>) -> AudioTriple {
    let mut sum = AudioTriple::new(0.0, 0.0, 0.0);
    let mut count = 0usize;
    for tag in tags {
        let triple = classify_genre(tag);
        sum.energy += triple.energy;
        sum.valence += triple.valence;
        sum.danceability += triple.danceability;
        count += 1;
    }

    if count == 0 {
        return NEUTRAL;
    }

    let n = count as f64;
    AudioTriple::new(
        round2(sum.energy / n),
        round2(sum.valence / n),
        round2(sum.danceability / n),
    )
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
