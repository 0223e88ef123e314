use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Fold text into its comparison form
///
/// Trims surrounding whitespace, upper-cases, decomposes accented characters
/// and drops the combining marks, so `"José"`, `"JOSE"` and `" jose "` all fold
/// to `"JOSE"`. Folding an already folded string returns it unchanged.
///
/// Every mark category is dropped, spacing and enclosing marks included, not
/// only the nonspacing accents Latin text uses. Vowel signs of scripts such as
/// Devanagari fold away too, so `"कि"` folds to `"क"`.
///
/// # Examples
/// ```
/// use guestlist::text::normalize;
///
/// assert_eq!(normalize("José"), "JOSE");
/// assert_eq!(normalize("Gómez  "), "GOMEZ");
/// assert_eq!(normalize(""), "");
/// ```
pub fn normalize(text: &str) -> String {
    let folded: String = text
        .to_uppercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    folded.trim().to_string()
}

/// Read a table cell as a table number
///
/// Accepts plain integers with or without leading zeros (`"007"` is table 7)
/// and whole-valued decimals (`"7.0"`). Fractional values are truncated.
/// Anything else, including negative numbers and blanks, is table 0.
///
/// # Examples
/// ```
/// use guestlist::text::table_number;
///
/// assert_eq!(table_number("007"), 7);
/// assert_eq!(table_number(" 12 "), 12);
/// assert_eq!(table_number("7.0"), 7);
/// assert_eq!(table_number("sin mesa"), 0);
/// assert_eq!(table_number("-3"), 0);
/// ```
pub fn table_number(cell: &str) -> u32 {
    let cell = cell.trim();
    if let Ok(n) = cell.parse::<u32>() {
        return n;
    }
    match cell.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 => f.trunc().min(u32::MAX as f64) as u32,
        _ => 0,
    }
}
