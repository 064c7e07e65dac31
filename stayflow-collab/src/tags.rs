//! Comma-joined tag columns are decoded to lists in exactly one place,
//! the persistence gateway. Everything above it works with `Vec<String>`.

/// Decodes a comma-joined column into a list, dropping empty segments
pub fn decode(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Encodes a list into a comma-joined column value
pub fn encode(tags: &[String]) -> String {
    tags.iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// Substring containment against the encoded form, matching the
/// original filter semantics where "Lux" also matches "Luxury"
pub fn contains(tags: &[String], fragment: &str) -> bool {
    encode(tags).contains(fragment)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_through_the_column_encoding() {
        let tags = vec!["Wifi".to_string(), "Pool".to_string(), "Kitchen".to_string()];
        assert_eq!(decode(&encode(&tags)), tags);
    }

    #[test]
    fn drops_empty_segments() {
        assert_eq!(decode(""), Vec::<String>::new());
        assert_eq!(decode("Wifi,,Pool, "), vec!["Wifi", "Pool"]);
    }

    #[test]
    fn containment_is_substring_based() {
        let vibes = vec!["Luxury".to_string(), "Adventure".to_string()];

        assert!(contains(&vibes, "Lux"));
        assert!(contains(&vibes, "Adventure"));
        assert!(!contains(&vibes, "Cozy"));
    }
}
