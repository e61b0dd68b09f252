use std::sync::LazyLock;

use regex::{NoExpand, Regex};

use crate::config::CleanerConfig;

/// Whole-word runs of two or more `k`/`K`, e.g. "kkkk" or "KkK".
static LAUGH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[kK]{2,}\b").unwrap());

/// Text normalizer: collapses laughter runs and expands abbreviations.
#[derive(Debug, Clone)]
pub struct Cleaner {
    laugh_token: String,
    abbreviations: Vec<Abbreviation>,
}

#[derive(Debug, Clone)]
struct Abbreviation {
    pattern: Regex,
    expansion: String,
}

impl Cleaner {
    /// Compile one whole-word pattern per abbreviation, keeping table order.
    pub fn new(config: CleanerConfig) -> Result<Self, regex::Error> {
        let abbreviations = config
            .abbreviations
            .into_iter()
            .map(|(short, expansion)| {
                let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(&short)))?;
                Ok(Abbreviation { pattern, expansion })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;

        tracing::debug!(
            abbreviations = abbreviations.len(),
            "Text cleaner ready"
        );

        Ok(Self {
            laugh_token: config.laugh_token,
            abbreviations,
        })
    }

    /// Replace every standalone "kk", "kkkk", "KKK"... with the laugh token.
    /// Runs glued to other word characters ("okkk", "kkk9") are left alone.
    pub fn clean_laughter(&self, text: &str) -> String {
        LAUGH_RE
            .replace_all(text, NoExpand(&self.laugh_token))
            .into_owned()
    }

    /// Expand each abbreviation in table order, one pass per entry. Later
    /// entries also see text inserted by earlier ones.
    pub fn apply_abbreviations(&self, text: &str) -> String {
        self.abbreviations
            .iter()
            .fold(text.to_string(), |acc, abbr| {
                abbr.pattern
                    .replace_all(&acc, NoExpand(&abbr.expansion))
                    .into_owned()
            })
    }

    /// Abbreviation expansion followed by laughter cleaning.
    pub fn clean_text(&self, text: &str) -> String {
        self.clean_laughter(&self.apply_abbreviations(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "<LAUGH>";

    fn cleaner(abbreviations: &[(&str, &str)]) -> Cleaner {
        Cleaner::new(CleanerConfig {
            laugh_token: TOKEN.to_string(),
            abbreviations: abbreviations
                .iter()
                .map(|(s, l)| (s.to_string(), l.to_string()))
                .collect(),
        })
        .unwrap()
    }

    #[test]
    fn test_laughter_alone() {
        assert_eq!(cleaner(&[]).clean_laughter("kkkk"), TOKEN);
    }

    #[test]
    fn test_laughter_inside_word_unchanged() {
        let c = cleaner(&[]);
        assert_eq!(c.clean_laughter("okkk"), "okkk");
        assert_eq!(c.clean_laughter("kkk9"), "kkk9");
    }

    #[test]
    fn test_laughter_in_sentence() {
        assert_eq!(
            cleaner(&[]).clean_laughter("kk people"),
            "<LAUGH> people"
        );
    }

    #[test]
    fn test_laughter_mixed_case_and_punctuation() {
        assert_eq!(
            cleaner(&[]).clean_laughter("KkK, isso foi ótimo kkkkkk!"),
            "<LAUGH>, isso foi ótimo <LAUGH>!"
        );
    }

    #[test]
    fn test_single_k_unchanged() {
        assert_eq!(cleaner(&[]).clean_laughter("k ok"), "k ok");
    }

    #[test]
    fn test_laugh_token_is_literal() {
        let c = Cleaner::new(CleanerConfig {
            laugh_token: "$0 ${1}".to_string(),
            abbreviations: Vec::new(),
        })
        .unwrap();
        assert_eq!(c.clean_laughter("kkk"), "$0 ${1}");
    }

    #[test]
    fn test_abbreviation_expanded() {
        assert_eq!(
            cleaner(&[("vc", "você")]).apply_abbreviations("vc sabe"),
            "você sabe"
        );
    }

    #[test]
    fn test_abbreviation_respects_word_boundary() {
        let c = cleaner(&[("vc", "você")]);
        assert_eq!(c.apply_abbreviations("svc"), "svc");
        assert_eq!(c.apply_abbreviations("vcs"), "vcs");
        assert_eq!(c.apply_abbreviations("vc, vc."), "você, você.");
    }

    #[test]
    fn test_abbreviation_metacharacters_escaped() {
        let c = cleaner(&[("a.b", "ab")]);
        assert_eq!(c.apply_abbreviations("a.b axb"), "ab axb");
    }

    #[test]
    fn test_abbreviations_follow_table_order() {
        // "pq" expands to text containing "q", which the next entry rewrites.
        let c = cleaner(&[("pq", "por q"), ("q", "que")]);
        assert_eq!(c.apply_abbreviations("pq"), "por que");

        // Reversed, the inserted "q" is never revisited.
        let c = cleaner(&[("q", "que"), ("pq", "por q")]);
        assert_eq!(c.apply_abbreviations("pq"), "por q");
    }

    #[test]
    fn test_clean_text_expands_then_cleans() {
        let c = cleaner(&[("vc", "você"), ("rs", "kkk")]);
        assert_eq!(
            c.clean_text("vc viu isso? rs kkkk"),
            "você viu isso? <LAUGH> <LAUGH>"
        );
    }

    #[test]
    fn test_clean_text_without_table_is_laughter_only() {
        let c = cleaner(&[]);
        assert_eq!(c.clean_text("vc kkk"), "vc <LAUGH>");
        assert_eq!(c.clean_text("vc kkk"), c.clean_laughter("vc kkk"));
    }
}
