//! Weighted repair vocabulary with typo-tolerant matching.
//!
//! Second stage of the admission pipeline: recognizes domain terms in a
//! sanitized message and turns them into a weighted coverage score. Terms
//! live in fixed tiers; matching is token-boundary aware and falls back to
//! bounded edit distance so minor misspellings still count, with the
//! correction recorded for auditability.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Weight tier of a vocabulary term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TermTier {
    /// Safety hazards - gas, fire, electric shock.
    Urgent,
    /// Fixtures and defects - the subject matter of a repair.
    Critical,
    /// Repair action verbs.
    Important,
    /// Rooms, materials and general household words.
    Contextual,
}

impl TermTier {
    /// Numeric importance used by the coverage score.
    pub fn weight(&self) -> f64 {
        match self {
            TermTier::Urgent => 3.0,
            TermTier::Critical => 2.0,
            TermTier::Important => 1.5,
            TermTier::Contextual => 1.0,
        }
    }
}

/// One recognized vocabulary term.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermMatch {
    /// Canonical form from the vocabulary.
    pub canonical: String,
    pub tier: TermTier,
    /// Surface form as typed, when the match was a fuzzy correction.
    pub corrected_from: Option<String>,
}

impl TermMatch {
    pub fn weight(&self) -> f64 {
        self.tier.weight()
    }
}

/// Result of matching a message against the repair vocabulary.
///
/// An empty match set is a valid low-score outcome, not an error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VocabularyMatch {
    pub matches: Vec<TermMatch>,
}

/// Total weight of three critical-strength terms; messages at or above
/// this saturate the coverage score.
const COVERAGE_CEILING: f64 = 6.0;

impl VocabularyMatch {
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Normalized coverage score in [0, 1].
    pub fn coverage(&self) -> f64 {
        let total: f64 = self.matches.iter().map(TermMatch::weight).sum();
        (total / COVERAGE_CEILING).min(1.0)
    }

    /// Fuzzy corrections applied, keyed by the original surface form.
    pub fn corrections(&self) -> BTreeMap<String, String> {
        self.matches
            .iter()
            .filter_map(|m| {
                m.corrected_from
                    .as_ref()
                    .map(|from| (from.clone(), m.canonical.clone()))
            })
            .collect()
    }

    /// Canonical forms of all matched terms.
    pub fn terms(&self) -> Vec<&str> {
        self.matches.iter().map(|m| m.canonical.as_str()).collect()
    }
}

struct VocabEntry {
    canonical: &'static str,
    tier: TermTier,
}

static URGENT_TERMS: &[&str] = &[
    "gás",
    "incêndio",
    "fogo",
    "choque",
    "faísca",
    "curto circuito",
    "urgente",
    "emergência",
    "socorro",
];

static CRITICAL_TERMS: &[&str] = &[
    // Fixtures
    "torneira",
    "pia",
    "chuveiro",
    "registro",
    "válvula",
    "sifão",
    "ralo",
    "esgoto",
    "porta",
    "janela",
    "fechadura",
    "dobradiça",
    "maçaneta",
    "trinco",
    "tomada",
    "interruptor",
    "lâmpada",
    "disjuntor",
    "fusível",
    "telhado",
    "calha",
    // Defects
    "vazamento",
    "vazando",
    "pingando",
    "entupido",
    "entupida",
    "entupimento",
    "goteira",
    "infiltração",
    "quebrado",
    "quebrada",
    "rachadura",
    "fissura",
    "travando",
    "emperrado",
    "emperrada",
    "queimado",
    "queimada",
    "curto",
];

static IMPORTANT_TERMS: &[&str] = &[
    "consertar",
    "reparar",
    "arrumar",
    "corrigir",
    "instalar",
    "trocar",
    "substituir",
    "fixar",
    "ajustar",
    "vedar",
    "calafetar",
    "desentupir",
    "resolver",
    "manutenção",
    "reparo",
];

static CONTEXTUAL_TERMS: &[&str] = &[
    "cano",
    "encanamento",
    "tubulação",
    "parede",
    "reboco",
    "pintura",
    "tinta",
    "teto",
    "telha",
    "piso",
    "azulejo",
    "cerâmica",
    "rejunte",
    "luz",
    "fiação",
    "eletricidade",
    "elétrico",
    "elétrica",
    "voltagem",
    "gaveta",
    "armário",
    "prateleira",
    "estante",
    "problema",
    "defeito",
    "casa",
    "residencial",
    "doméstico",
    "apartamento",
    "banheiro",
    "cozinha",
    "lavanderia",
    "quintal",
    "faça você mesmo",
];

static VOCABULARY: Lazy<Vec<VocabEntry>> = Lazy::new(|| {
    let tiers = [
        (TermTier::Urgent, URGENT_TERMS),
        (TermTier::Critical, CRITICAL_TERMS),
        (TermTier::Important, IMPORTANT_TERMS),
        (TermTier::Contextual, CONTEXTUAL_TERMS),
    ];

    tiers
        .iter()
        .flat_map(|(tier, terms)| {
            terms.iter().map(move |canonical| VocabEntry {
                canonical,
                tier: *tier,
            })
        })
        .collect()
});

/// Matches a sanitized message against the weighted repair vocabulary.
pub fn match_text(text: &str) -> VocabularyMatch {
    let lowered = text.to_lowercase();
    let tokens: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .collect();

    let mut matches = Vec::new();

    for entry in VOCABULARY.iter() {
        let matched = if entry.canonical.contains(' ') {
            match_phrase(&tokens, entry.canonical).map(|_| None)
        } else {
            match_word(&tokens, entry.canonical)
        };

        if let Some(corrected_from) = matched {
            matches.push(TermMatch {
                canonical: entry.canonical.to_string(),
                tier: entry.tier,
                corrected_from,
            });
        }
    }

    VocabularyMatch { matches }
}

/// Exact token-window match for multi-word terms.
fn match_phrase(tokens: &[&str], phrase: &str) -> Option<()> {
    let parts: Vec<&str> = phrase.split(' ').collect();
    tokens
        .windows(parts.len())
        .any(|window| window == parts.as_slice())
        .then_some(())
}

/// Single-word match: exact token first, bounded edit distance second.
///
/// Returns `Some(None)` for an exact match, `Some(Some(surface))` for a
/// fuzzy correction, `None` when nothing matched.
fn match_word(tokens: &[&str], canonical: &str) -> Option<Option<String>> {
    if tokens.iter().any(|t| *t == canonical) {
        return Some(None);
    }

    let allowed = max_edit_distance(canonical.chars().count());
    if allowed == 0 {
        return None;
    }

    for token in tokens {
        // Typos below five characters are too ambiguous to correct.
        if token.chars().count() < 5 {
            continue;
        }
        if levenshtein(token, canonical) <= allowed {
            return Some(Some((*token).to_string()));
        }
    }

    None
}

/// Edit-distance budget by canonical term length: short terms match
/// exactly, medium terms tolerate one edit, long terms two.
fn max_edit_distance(term_len: usize) -> usize {
    match term_len {
        0..=4 => 0,
        5..=7 => 1,
        _ => 2,
    }
}

/// Levenshtein edit distance, two-row dynamic programming.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    mod exact {
        use super::*;

        #[test]
        fn matches_known_terms() {
            let result = match_text("A torneira está vazando na cozinha");
            let terms = result.terms();
            assert!(terms.contains(&"torneira"));
            assert!(terms.contains(&"vazando"));
            assert!(terms.contains(&"cozinha"));
        }

        #[test]
        fn matching_is_case_insensitive() {
            let result = match_text("TORNEIRA Vazando");
            assert!(result.terms().contains(&"torneira"));
            assert!(result.terms().contains(&"vazando"));
        }

        #[test]
        fn matches_multi_word_phrases() {
            let result = match_text("acho que é curto circuito na tomada");
            assert!(result.terms().contains(&"curto circuito"));
        }

        #[test]
        fn does_not_match_inside_longer_words() {
            // "importação" contains "porta" as a substring but is a
            // different token.
            let result = match_text("a importação do relatório falhou");
            assert!(!result.terms().contains(&"porta"));
        }

        #[test]
        fn unrelated_text_yields_empty_match() {
            let result = match_text("qual a capital da França");
            assert!(result.is_empty());
            assert_eq!(result.coverage(), 0.0);
        }
    }

    mod fuzzy {
        use super::*;

        #[test]
        fn corrects_tornera_to_torneira() {
            let result = match_text("Como consertar tornera pingando?");
            let corrections = result.corrections();
            assert_eq!(
                corrections.get("tornera").map(String::as_str),
                Some("torneira")
            );
        }

        #[test]
        fn records_surface_form_of_corrections() {
            let result = match_text("o chuvero não esquenta");
            let m = result
                .matches
                .iter()
                .find(|m| m.canonical == "chuveiro")
                .expect("chuvero should correct to chuveiro");
            assert_eq!(m.corrected_from.as_deref(), Some("chuvero"));
        }

        #[test]
        fn exact_match_takes_priority_over_fuzzy() {
            let result = match_text("a torneira pinga");
            let m = result
                .matches
                .iter()
                .find(|m| m.canonical == "torneira")
                .unwrap();
            assert!(m.corrected_from.is_none());
        }

        #[test]
        fn distance_beyond_budget_does_not_match() {
            // "tora" is four characters away from "torneira".
            let result = match_text("uma tora caiu no quintal");
            assert!(!result.terms().contains(&"torneira"));
        }

        #[test]
        fn short_tokens_are_never_corrected() {
            let result = match_text("pia ok");
            // "pia" matches exactly; nothing else should fuzz onto it.
            assert!(result.matches.iter().all(|m| m.corrected_from.is_none()));
        }
    }

    mod scoring {
        use super::*;

        #[test]
        fn coverage_is_clamped_to_unit_interval() {
            let result =
                match_text("vazamento urgente de gás, torneira quebrada, chuveiro entupido");
            assert!(result.coverage() <= 1.0);
            assert!(result.coverage() > 0.0);
        }

        #[test]
        fn urgent_terms_outweigh_contextual_terms() {
            let urgent = match_text("vazamento de gás urgente");
            let contextual = match_text("tenho uma casa com cozinha");
            assert!(urgent.coverage() > contextual.coverage());
        }

        #[test]
        fn levenshtein_basics() {
            assert_eq!(levenshtein("torneira", "torneira"), 0);
            assert_eq!(levenshtein("tornera", "torneira"), 1);
            assert_eq!(levenshtein("chuvero", "chuveiro"), 1);
            assert_eq!(levenshtein("abc", ""), 3);
        }

        #[test]
        fn edit_budget_scales_with_term_length() {
            assert_eq!(max_edit_distance(4), 0);
            assert_eq!(max_edit_distance(6), 1);
            assert_eq!(max_edit_distance(9), 2);
        }
    }
}
