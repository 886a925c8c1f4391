use std::fmt::Write;

use crate::event::NormalizedRecord;

/// Caption text plus the poster to attach, if one can be derived.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedMessage {
    pub caption: String,
    pub poster_url: Option<String>,
}

/// Build the notification caption and poster reference for a record.
pub fn compose(record: &NormalizedRecord) -> ComposedMessage {
    let mut caption = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(caption, "🎬 *{}* ({})", record.name, record.year);
    let _ = writeln!(caption, "📅 Event: {}", record.event_type);
    if !record.series_name.is_empty() {
        let _ = writeln!(caption, "📺 Series: {}", record.series_name);
    }
    if !record.season_number.is_empty() {
        let _ = writeln!(caption, "🌿 Season: {}", record.season_number);
    }
    if !record.episode_number.is_empty() {
        let _ = writeln!(caption, "🎞 Episode: {}", record.episode_number);
    }
    if !record.runtime.is_empty() {
        let _ = writeln!(caption, "⏱ Runtime: {}", record.runtime);
    }
    if let Some(rating) = record.community_rating {
        let _ = writeln!(caption, "⭐ Community Rating: {}", rating);
    }
    if let Some(imdb) = &record.imdb_id {
        let _ = writeln!(caption, "🔗 IMDb: https://www.imdb.com/title/{}/", imdb);
    }
    if let Some(link) = record
        .tmdb_id
        .as_deref()
        .and_then(|id| tmdb_link(&record.item_type, id))
    {
        let _ = writeln!(caption, "🔗 TMDb: {}", link);
    }
    if !record.overview.is_empty() {
        let _ = writeln!(caption, "\n📝 {}", record.overview);
    }

    let poster_url = server_path(record, |base, id| format!("{base}/Items/{id}/Images/Primary"));

    if let Some(link) = server_path(record, |base, id| {
        format!("{base}/web/index.html#!/details?id={id}")
    }) {
        let _ = write!(caption, "\n📺 Watch here: {}", link);
    }

    ComposedMessage {
        caption,
        poster_url,
    }
}

/// TMDb page for the item, or `None` when the type has no TMDb section.
fn tmdb_link(item_type: &str, tmdb_id: &str) -> Option<String> {
    match item_type.to_lowercase().as_str() {
        "series" | "season" => Some(format!("https://www.themoviedb.org/tv/{tmdb_id}/")),
        "movie" => Some(format!("https://www.themoviedb.org/movie/{tmdb_id}/")),
        _ => None,
    }
}

fn server_path(record: &NormalizedRecord, build: impl Fn(&str, &str) -> String) -> Option<String> {
    if record.server_url.is_empty() || record.item_id.is_empty() {
        return None;
    }
    Some(build(&record.server_url, &record.item_id))
}
