// TMDB movie genre table - stable enough that fetching it at runtime isn't worth a request

const GENRES: &[(u32, &str)] = &[
    (28, "Action"),
    (12, "Adventure"),
    (16, "Animation"),
    (35, "Comedy"),
    (80, "Crime"),
    (99, "Documentary"),
    (18, "Drama"),
    (10751, "Family"),
    (14, "Fantasy"),
    (36, "History"),
    (27, "Horror"),
    (10402, "Music"),
    (9648, "Mystery"),
    (10749, "Romance"),
    (878, "Science Fiction"),
    (10770, "TV Movie"),
    (53, "Thriller"),
    (10752, "War"),
    (37, "Western"),
];

/// Look up a single genre name
pub fn name_of(id: u32) -> Option<&'static str> {
    GENRES
        .iter()
        .find(|(genre_id, _)| *genre_id == id)
        .map(|(_, name)| *name)
}

/// Comma-joined names for a list of ids, skipping ones we don't know
pub fn names_for(ids: &[u32]) -> String {
    ids.iter()
        .filter_map(|id| name_of(*id))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_genres() {
        assert_eq!(name_of(28), Some("Action"));
        assert_eq!(name_of(878), Some("Science Fiction"));
        assert_eq!(name_of(1), None);
    }

    #[test]
    fn test_names_for_skips_unknown_and_keeps_order() {
        assert_eq!(names_for(&[53, 999, 18]), "Thriller, Drama");
        assert_eq!(names_for(&[]), "");
    }
}
