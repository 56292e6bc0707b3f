//! Normalization of raw PDF text before chunking.

const LIGATURES: &[(char, &str)] = &[
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
];

/// Characters PDF extractors leave behind that carry no text.
const INVISIBLE: &[char] = &[
    '\u{0000}', '\u{00AD}', '\u{200B}', '\u{200C}', '\u{200D}', '\u{FEFF}',
];

/// Cleans the text of one page.
///
/// Lines made only of digits (page numbers in headers/footers) are dropped,
/// ligatures are expanded, words hyphenated across a line break are rejoined
/// and every run of whitespace collapses to a single space.
pub fn clean_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());

    for line in raw.lines() {
        let line = normalize_chars(line);
        let line = line.trim();
        if line.is_empty() || is_page_number(line) {
            continue;
        }

        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");

        if ends_with_broken_word(&out) && starts_lowercase(&collapsed) {
            out.pop();
        } else if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&collapsed);
    }

    out
}

fn normalize_chars(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for c in line.chars() {
        if INVISIBLE.contains(&c) {
            continue;
        }
        if let Some((_, expanded)) = LIGATURES.iter().find(|(lig, _)| *lig == c) {
            out.push_str(expanded);
        } else if c.is_control() {
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out
}

fn is_page_number(line: &str) -> bool {
    line.chars().all(|c| c.is_ascii_digit())
}

fn ends_with_broken_word(text: &str) -> bool {
    let mut rev = text.chars().rev();
    matches!(
        (rev.next(), rev.next()),
        (Some('-'), Some(c)) if c.is_alphabetic()
    )
}

fn starts_lowercase(text: &str) -> bool {
    text.chars().next().is_some_and(char::is_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(
            clean_text("  Revenue   grew\t\t24%\n\n  year on   year "),
            "Revenue grew 24% year on year"
        );
    }

    #[test]
    fn test_drops_page_number_lines() {
        let raw = "Annual Report 2024\n42\nBusiness overview\n 7 ";
        assert_eq!(clean_text(raw), "Annual Report 2024 Business overview");
    }

    #[test]
    fn test_keeps_numbers_inside_sentences() {
        assert_eq!(clean_text("We operate in 600 cities"), "We operate in 600 cities");
    }

    #[test]
    fn test_expands_ligatures_and_strips_invisible() {
        assert_eq!(clean_text("pro\u{FB01}t and \u{FB02}ow\u{00AD}s"), "profit and flows");
    }

    #[test]
    fn test_rejoins_hyphenated_words() {
        assert_eq!(clean_text("consoli-\ndated results"), "consolidated results");
        assert_eq!(clean_text("FY2023-\n24 results"), "FY2023- 24 results");
    }

    #[test]
    fn test_empty_and_numeric_only_pages() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text("  \n 12 \n\u{000C}"), "");
    }
}
