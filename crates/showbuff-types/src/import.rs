//! Title extraction for list imports.
//!
//! Each non-blank line of the submitted text is one title, optionally
//! followed by a release year in parentheses: `Heat (1995)`.

use std::sync::OnceLock;

use regex::Regex;

/// One title pulled out of an import, before it is matched to a catalog entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTitle {
    /// The trimmed source line.
    pub raw_text: String,
    /// Title with internal whitespace collapsed.
    pub title: String,
    pub year: Option<i32>,
}

fn title_year_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<title>.+?)(?:\s*\((?P<year>19\d{2}|20\d{2})\))?$").ok()
    })
    .as_ref()
}

/// Parse a single line. Blank lines yield `None`.
#[must_use]
pub fn parse_line(line: &str) -> Option<ParsedTitle> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let caps = title_year_regex()?.captures(line)?;
    let title = caps
        .name("title")?
        .as_str()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if title.is_empty() {
        return None;
    }

    let year = caps.name("year").and_then(|m| m.as_str().parse().ok());

    Some(ParsedTitle {
        raw_text: line.to_string(),
        title,
        year,
    })
}

/// Every title in `text`, in input order.
#[must_use]
pub fn extract_titles(text: &str) -> Vec<ParsedTitle> {
    text.lines().filter_map(parse_line).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_with_year() {
        let parsed = parse_line("  Heat (1995) ").unwrap();
        assert_eq!(parsed.raw_text, "Heat (1995)");
        assert_eq!(parsed.title, "Heat");
        assert_eq!(parsed.year, Some(1995));

        let tight = parse_line("Se7en(1995)").unwrap();
        assert_eq!(tight.title, "Se7en");
        assert_eq!(tight.year, Some(1995));
    }

    #[test]
    fn title_without_year() {
        let parsed = parse_line("The   Wire").unwrap();
        assert_eq!(parsed.title, "The Wire");
        assert_eq!(parsed.year, None);
    }

    #[test]
    fn out_of_range_year_stays_in_title() {
        let parsed = parse_line("Nosferatu (1822)").unwrap();
        assert_eq!(parsed.title, "Nosferatu (1822)");
        assert_eq!(parsed.year, None);

        // Only a trailing year counts
        let parsed = parse_line("2001 (1968) A Space Odyssey").unwrap();
        assert_eq!(parsed.year, None);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let titles = extract_titles("Heat (1995)\r\n\n   \nThe Wire\n");
        let names: Vec<_> = titles.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(names, vec!["Heat", "The Wire"]);
        assert!(extract_titles("").is_empty());
    }
}
