// Copyright (c) 2024 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

//! Text helpers for entity identifiers and display values.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]+>").expect("valid regex");
    static ref NON_WORD: Regex = Regex::new(r"\W+").expect("valid regex");
}

/// Remove all HTML tags and surrounding whitespace.
pub fn strip_html(text: &str) -> String {
    HTML_TAG.replace_all(text, "").trim().to_string()
}

/// Lower case identifier with every run of non-word characters replaced by `_`.
pub fn slugify(text: &str) -> String {
    NON_WORD.replace_all(text, "_").to_lowercase()
}

/// Join the first three entries with `, `.
pub fn join_first_three<S: AsRef<str>>(values: &[S]) -> String {
    values
        .iter()
        .take(3)
        .map(|v| v.as_ref())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("<p>A <b>bold</b> plot.</p>", "A bold plot.")]
    #[case("  plain text \n", "plain text")]
    #[case("<br/>", "")]
    #[case("", "")]
    fn strip_html_tags(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(expected, strip_html(input));
    }

    #[rstest]
    #[case("Movies", "movies")]
    #[case("TV Shows", "tv_shows")]
    #[case("Kids - Movies & Shows", "kids_movies_shows")]
    #[case("Filme 4K", "filme_4k")]
    #[case("Séries", "séries")]
    fn slugify_names(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(expected, slugify(input));
    }

    #[test]
    fn join_first_three_entries() {
        assert_eq!(
            "Action, Drama, Thriller",
            join_first_three(&["Action", "Drama", "Thriller", "Comedy"])
        );
        assert_eq!("Jazz", join_first_three(&["Jazz"]));
        assert_eq!("", join_first_three::<&str>(&[]));
    }
}
