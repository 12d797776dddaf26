use crate::{
    models::{RecommendationSet, Recommendations, TasteCategory, TastePreferences},
    services::recommendations::RecommendationClient,
};

/// Gathers recommendations for all three taste categories
///
/// Runs in two phases: the three entity lookups concurrently, then the three
/// recommendation fetches concurrently, each fed by its own lookup only.
/// A category that yields nothing falls back to the user's original input, so
/// every returned set has at least one element.
pub async fn aggregate(
    client: &RecommendationClient,
    preferences: &TastePreferences,
) -> Recommendations {
    let music = preferences.query(TasteCategory::Music);
    let movie = preferences.query(TasteCategory::Movie);
    let fashion = preferences.query(TasteCategory::Fashion);

    let (music_id, movie_id, fashion_id) = tokio::join!(
        client.lookup(&music),
        client.lookup(&movie),
        client.lookup(&fashion),
    );

    tracing::debug!(
        music_found = music_id.is_some(),
        movie_found = movie_id.is_some(),
        fashion_found = fashion_id.is_some(),
        "Entity lookups completed"
    );

    let (music_recs, movie_recs, fashion_recs) = tokio::join!(
        client.recommend(music_id.as_ref(), TasteCategory::Music),
        client.recommend(movie_id.as_ref(), TasteCategory::Movie),
        client.recommend(fashion_id.as_ref(), TasteCategory::Fashion),
    );

    let recommendations = Recommendations {
        music: with_fallback(music_recs, &music.name),
        movie: with_fallback(movie_recs, &movie.name),
        fashion: with_fallback(fashion_recs, &fashion.name),
    };

    tracing::info!(
        music = recommendations.music.len(),
        movie = recommendations.movie.len(),
        fashion = recommendations.fashion.len(),
        "Recommendations aggregated"
    );

    recommendations
}

fn with_fallback(recommendations: RecommendationSet, original: &str) -> RecommendationSet {
    if recommendations.is_empty() {
        vec![original.to_string()]
    } else {
        recommendations
    }
}
