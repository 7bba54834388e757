//! Dictionary-based entity extraction for repair messages.
//!
//! Runs alongside the vocabulary matcher and classifies mentions into
//! repair-relevant categories. The resulting summary answers two
//! questions for fusion: how much repair substance the message carries
//! (a weighted, capped score) and whether the mentions fit together as a
//! coherent repair request.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Category of a recognized entity mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityCategory {
    /// Object being repaired - faucet, door, outlet.
    Fixture,
    /// Failure mode - leak, clog, breakage.
    Defect,
    /// Repair verb - fix, replace, install.
    Action,
    /// Room or area of the home.
    Location,
    /// Tool or supply - pipe, sealant, screw.
    Material,
}

impl EntityCategory {
    /// Importance of the category when scoring a message.
    pub fn weight(&self) -> f64 {
        match self {
            EntityCategory::Fixture | EntityCategory::Defect => 2.0,
            EntityCategory::Action => 1.5,
            EntityCategory::Location | EntityCategory::Material => 1.0,
        }
    }
}

/// A single entity mention found in a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Canonical dictionary form.
    pub term: String,
    pub category: EntityCategory,
}

/// Mentions past this count in one category add no further score.
const CATEGORY_COUNT_CAP: usize = 2;

/// Score ceiling: two fixtures and two defects at weight 2.0 each.
const IDEAL_SCORE: f64 = 8.0;

/// All entity mentions extracted from one message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitySummary {
    pub entities: Vec<Entity>,
}

impl EntitySummary {
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Mention counts per category, capped at [`CATEGORY_COUNT_CAP`].
    fn capped_counts(&self) -> BTreeMap<EntityCategory, usize> {
        let mut counts: BTreeMap<EntityCategory, usize> = BTreeMap::new();
        for entity in &self.entities {
            let count = counts.entry(entity.category).or_insert(0);
            *count = (*count + 1).min(CATEGORY_COUNT_CAP);
        }
        counts
    }

    /// Weighted entity score in [0, 1].
    ///
    /// Repeating one category beyond the cap does not inflate the score;
    /// breadth across categories does.
    pub fn score(&self) -> f64 {
        let total: f64 = self
            .capped_counts()
            .iter()
            .map(|(category, count)| category.weight() * *count as f64)
            .sum();
        (total / IDEAL_SCORE).min(1.0)
    }

    pub fn has_category(&self, category: EntityCategory) -> bool {
        self.entities.iter().any(|e| e.category == category)
    }

    /// Whether the mentions form a coherent repair request: a fixture or
    /// defect together with at least one mention of another category.
    pub fn has_coherent_repair_context(&self) -> bool {
        let anchor = self.has_category(EntityCategory::Fixture)
            || self.has_category(EntityCategory::Defect);
        if !anchor {
            return false;
        }
        let counts = self.capped_counts();
        counts.len() > 1
    }

    pub fn terms(&self) -> Vec<&str> {
        self.entities.iter().map(|e| e.term.as_str()).collect()
    }
}

static FIXTURES: &[&str] = &[
    "torneira",
    "pia",
    "chuveiro",
    "vaso sanitário",
    "descarga",
    "registro",
    "válvula",
    "sifão",
    "ralo",
    "caixa d'água",
    "porta",
    "janela",
    "fechadura",
    "dobradiça",
    "maçaneta",
    "trinco",
    "portão",
    "tomada",
    "interruptor",
    "lâmpada",
    "luminária",
    "disjuntor",
    "chuveiro elétrico",
    "telhado",
    "calha",
    "gaveta",
    "armário",
    "prateleira",
    "box",
];

static DEFECTS: &[&str] = &[
    "vazamento",
    "vazando",
    "pingando",
    "goteira",
    "infiltração",
    "entupido",
    "entupida",
    "entupimento",
    "quebrado",
    "quebrada",
    "rachadura",
    "fissura",
    "trincado",
    "emperrado",
    "emperrada",
    "travando",
    "rangendo",
    "queimado",
    "queimada",
    "curto",
    "faiscando",
    "mofo",
    "ferrugem",
    "enferrujado",
];

static ACTIONS: &[&str] = &[
    "consertar",
    "reparar",
    "arrumar",
    "corrigir",
    "instalar",
    "trocar",
    "substituir",
    "fixar",
    "apertar",
    "ajustar",
    "vedar",
    "calafetar",
    "desentupir",
    "lubrificar",
    "lixar",
    "pintar",
];

static LOCATIONS: &[&str] = &[
    "banheiro",
    "cozinha",
    "quarto",
    "sala",
    "lavanderia",
    "quintal",
    "garagem",
    "varanda",
    "corredor",
    "área de serviço",
    "sótão",
    "porão",
    "parede",
    "teto",
    "piso",
];

static MATERIALS: &[&str] = &[
    "cano",
    "tubulação",
    "encanamento",
    "veda rosca",
    "fita isolante",
    "silicone",
    "rejunte",
    "argamassa",
    "massa corrida",
    "tinta",
    "parafuso",
    "bucha",
    "prego",
    "cola",
    "borracha",
    "vedação",
    "fiação",
    "fio",
];

/// Category dictionaries used by the extractor.
///
/// Held behind its own type so alternative or extended lexicons can be
/// injected where the default tables are too narrow.
pub struct EntityLexicon {
    categories: Vec<(EntityCategory, Vec<&'static str>)>,
}

/// Shared default lexicon built from the bundled dictionaries.
pub static DEFAULT_LEXICON: Lazy<EntityLexicon> = Lazy::new(EntityLexicon::default);

impl Default for EntityLexicon {
    fn default() -> Self {
        Self {
            categories: vec![
                (EntityCategory::Fixture, FIXTURES.to_vec()),
                (EntityCategory::Defect, DEFECTS.to_vec()),
                (EntityCategory::Action, ACTIONS.to_vec()),
                (EntityCategory::Location, LOCATIONS.to_vec()),
                (EntityCategory::Material, MATERIALS.to_vec()),
            ],
        }
    }
}

impl EntityLexicon {
    /// Extracts all entity mentions from a sanitized message.
    pub fn extract(&self, text: &str) -> EntitySummary {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .filter(|t| !t.is_empty())
            .collect();

        let mut entities = Vec::new();
        for (category, terms) in &self.categories {
            for term in terms {
                let found = if term.contains(' ') {
                    let parts: Vec<&str> = term.split(' ').collect();
                    tokens
                        .windows(parts.len())
                        .any(|window| window == parts.as_slice())
                } else {
                    tokens.iter().any(|t| t == term)
                };
                if found {
                    entities.push(Entity {
                        term: (*term).to_string(),
                        category: *category,
                    });
                }
            }
        }

        EntitySummary { entities }
    }
}
