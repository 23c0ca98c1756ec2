//! Display-name normalization.

/// Normalize a display name for querying.
///
/// Collapses whitespace and turns `"Last, First"` into `"First Last"`. Names
/// with more than one comma (`"Smith, John, Jr."`) keep their order.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    let collapsed = name.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut parts = collapsed.split(',');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(last), Some(first), None) => {
            let last = last.trim();
            let first = first.trim();
            match (first.is_empty(), last.is_empty()) {
                (true, _) => last.to_string(),
                (false, true) => first.to_string(),
                (false, false) => format!("{first} {last}"),
            }
        }
        _ => collapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_first_is_reordered() {
        assert_eq!(normalize_name("Maxwell, Ghislaine"), "Ghislaine Maxwell");
        assert_eq!(normalize_name("  Doe ,   Jane  "), "Jane Doe");
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        assert_eq!(normalize_name("  Jane \t  Doe\n"), "Jane Doe");
    }

    #[test]
    fn test_dangling_comma() {
        assert_eq!(normalize_name("Doe,"), "Doe");
        assert_eq!(normalize_name(", Jane"), "Jane");
    }

    #[test]
    fn test_multiple_commas_untouched() {
        assert_eq!(normalize_name("Smith, John, Jr."), "Smith, John, Jr.");
    }
}
