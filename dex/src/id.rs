/// Showdown-style id: lowercase ASCII letters and digits only.
///
/// `"Great Tusk"`, `"great-tusk"` and `"greattusk"` all map to `"greattusk"`.
pub fn to_id(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_id() {
        assert_eq!(to_id("Great Tusk"), "greattusk");
        assert_eq!(to_id("Farfetch’d"), "farfetchd");
        assert_eq!(to_id("[Gen 9] OU"), "gen9ou");
        assert_eq!(to_id("Ogerpon-Wellspring"), "ogerponwellspring");
        assert_eq!(to_id(""), "");
    }
}
