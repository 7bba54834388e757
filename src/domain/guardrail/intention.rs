//! Structural classification of user messages.
//!
//! Third parallel stage of the admission pipeline. Looks only at the
//! shape of the message, never at repair vocabulary: is it a question,
//! a command, short yes/no feedback, a plain statement, or too vague to
//! classify at all. The lifecycle relies on the feedback classes to
//! interpret replies while waiting for confirmation.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Structural shape of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StructuralClass {
    /// Interrogative form or trailing question mark.
    Question,
    /// Command or request phrased with an action or modal opener.
    Imperative,
    /// Short positive feedback - "sim", "funcionou", "resolvido".
    ShortAffirmation,
    /// Short negative feedback - "não", "não funcionou", "piorou".
    ShortNegation,
    /// Declarative sentence with enough substance to analyze.
    Statement,
    /// Too short or shapeless to carry intent.
    Ambiguous,
}

impl StructuralClass {
    /// Whether the message reads as yes/no feedback on a prior answer.
    pub fn is_feedback(&self) -> bool {
        matches!(
            self,
            StructuralClass::ShortAffirmation | StructuralClass::ShortNegation
        )
    }
}

/// Feedback phrases are only considered up to this many tokens; longer
/// messages carry new content even when they open with "sim" or "não".
const FEEDBACK_TOKEN_LIMIT: usize = 6;

static AFFIRMATIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "sim",
        "s",
        "claro",
        "ok",
        "okay",
        "certo",
        "isso",
        "exato",
        "perfeito",
        "ótimo",
        "otimo",
        "beleza",
        "funcionou",
        "resolveu",
        "resolvido",
        "consegui",
        "deu certo",
        "sim funcionou",
        "sim resolveu",
        "funcionou sim",
        "obrigado",
        "obrigada",
        "valeu",
        "ajudou",
        "muito obrigado",
        "muito obrigada",
    ]
    .into_iter()
    .collect()
});

static NEGATIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "não",
        "nao",
        "n",
        "negativo",
        "nada",
        "piorou",
        "não funcionou",
        "nao funcionou",
        "não resolveu",
        "nao resolveu",
        "não deu",
        "nao deu",
        "não deu certo",
        "nao deu certo",
        "ainda não",
        "ainda nao",
        "continua igual",
        "continua vazando",
        "não adiantou",
        "nao adiantou",
    ]
    .into_iter()
    .collect()
});

static INTERROGATIVES: &[&str] = &[
    "como", "qual", "quais", "quando", "onde", "quanto", "quanta", "quantos", "quantas", "quem",
    "o que", "por que", "porque", "será que",
];

static IMPERATIVE_OPENERS: &[&str] = &[
    "preciso",
    "quero",
    "pode",
    "poderia",
    "consegue",
    "me ajuda",
    "me ajude",
    "ajude",
    "ajuda",
    "me ensina",
    "ensina",
    "me explica",
    "explica",
    "me mostra",
    "mostra",
    "me diz",
    "diga",
    "conserte",
    "arrume",
    "resolva",
];

/// Classifies the structural shape of a sanitized message.
pub fn classify(text: &str) -> StructuralClass {
    let normalized = normalize(text);
    let tokens: Vec<&str> = normalized.split(' ').filter(|t| !t.is_empty()).collect();

    if tokens.is_empty() {
        return StructuralClass::Ambiguous;
    }

    if tokens.len() <= FEEDBACK_TOKEN_LIMIT {
        let joined = tokens.join(" ");
        if NEGATIONS.contains(joined.as_str()) {
            return StructuralClass::ShortNegation;
        }
        if AFFIRMATIONS.contains(joined.as_str()) {
            return StructuralClass::ShortAffirmation;
        }
        // A terse reply led by a bare yes/no still counts as feedback.
        if tokens.len() <= 3 {
            if NEGATIONS.contains(tokens[0]) {
                return StructuralClass::ShortNegation;
            }
            if AFFIRMATIONS.contains(tokens[0]) {
                return StructuralClass::ShortAffirmation;
            }
        }
    }

    if text.trim_end().ends_with('?') || starts_with_any(&normalized, INTERROGATIVES) {
        return StructuralClass::Question;
    }

    if starts_with_any(&normalized, IMPERATIVE_OPENERS) {
        return StructuralClass::Imperative;
    }

    if tokens.len() <= 2 {
        return StructuralClass::Ambiguous;
    }

    StructuralClass::Statement
}

/// Lowercases and strips punctuation, collapsing runs of spaces.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = true;
    for c in text.to_lowercase().chars() {
        if c.is_alphanumeric() || c == '\'' {
            out.push(c);
            last_space = false;
        } else if !last_space {
            out.push(' ');
            last_space = true;
        }
    }
    out.trim_end().to_string()
}

fn starts_with_any(normalized: &str, openers: &[&str]) -> bool {
    openers.iter().any(|opener| {
        normalized
            .strip_prefix(opener)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(' '))
    })
}
