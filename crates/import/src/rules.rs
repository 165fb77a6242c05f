use serde::{Deserialize, Serialize};
use tracing::warn;

use bilancio_core::{Category, Section};

use crate::util::{levenshtein_distance, normalize};

/// One keyword rule: pattern → reclassification category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationRule {
    pub name: String,
    #[serde(default = "default_priority")]
    pub priority: i32,
    pub pattern: String,
    #[serde(default)]
    pub match_type: MatchType,
    pub category: Category,
}

fn default_priority() -> i32 {
    // User-supplied rules outrank the built-in table unless they say otherwise.
    50
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    #[default]
    Contains,
    Exact,
    Regex,
    Fuzzy {
        threshold: f32,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum RuleError {
    #[error("Failed to parse rules TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    /// When true the file replaces the built-in table instead of extending it.
    #[serde(default)]
    replace: bool,
    rules: Vec<ClassificationRule>,
}

/// Internal pairing of a rule with its precompiled regex (if applicable).
struct CompiledRule {
    rule: ClassificationRule,
    compiled_regex: Option<regex::Regex>,
}

pub struct Classifier {
    rules: Vec<CompiledRule>,
}

impl Classifier {
    pub fn new(rules: Vec<ClassificationRule>) -> Self {
        let mut compiled: Vec<CompiledRule> = rules
            .into_iter()
            .map(|rule| {
                let compiled_regex = if let MatchType::Regex = &rule.match_type {
                    match regex::Regex::new(&rule.pattern) {
                        Ok(re) => Some(re),
                        Err(e) => {
                            warn!(rule = %rule.name, error = %e, "skipping invalid regex rule");
                            None
                        }
                    }
                } else {
                    None
                };
                CompiledRule { rule, compiled_regex }
            })
            .collect();
        // Highest priority first.
        compiled.sort_by(|a, b| b.rule.priority.cmp(&a.rule.priority));
        Self { rules: compiled }
    }

    /// Classifier with only the built-in Italian keyword table.
    pub fn with_defaults() -> Self {
        Self::new(default_rules())
    }

    /// Loads rules from a TOML file, layered over the built-in table unless
    /// the file sets `replace = true`.
    pub fn from_toml(toml_content: &str) -> Result<Self, RuleError> {
        let file: RuleFile = toml::from_str(toml_content)?;
        let mut rules = file.rules;
        if !file.replace {
            rules.extend(default_rules());
        }
        Ok(Self::new(rules))
    }

    /// Category for a voce. When the row's section is known, rules whose
    /// category belongs to a different section are skipped: "rimanenze"
    /// under CONTO ECONOMICO is a variation, not inventory.
    pub fn classify(&self, voce: &str, section: Option<Section>) -> Category {
        let text = normalize(voce);
        self.rules
            .iter()
            .filter(|cr| section_compatible(cr.rule.category, section))
            .find(|cr| self.rule_matches(cr, &text, voce))
            .map(|cr| cr.rule.category)
            .unwrap_or(Category::Unclassified)
    }

    fn rule_matches(&self, cr: &CompiledRule, normalized: &str, raw: &str) -> bool {
        let pattern = normalize(&cr.rule.pattern);
        match &cr.rule.match_type {
            MatchType::Contains => normalized.contains(&pattern),
            MatchType::Exact => normalized == pattern,
            MatchType::Regex => cr
                .compiled_regex
                .as_ref()
                .is_some_and(|re| re.is_match(raw)),
            MatchType::Fuzzy { threshold } => fuzzy_score(normalized, &pattern) >= *threshold,
        }
    }
}

fn section_compatible(category: Category, section: Option<Section>) -> bool {
    match (category.implied_section(), section) {
        (Some(implied), Some(actual)) => implied == actual,
        _ => true,
    }
}

fn fuzzy_score(s1: &str, s2: &str) -> f32 {
    let max_len = s1.len().max(s2.len());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (levenshtein_distance(s1, s2) as f32 / max_len as f32)
}

/// The built-in keyword table for Italian SMB statements (voce spellings as
/// produced by the common gestionali, normalized before matching).
pub fn default_rules() -> Vec<ClassificationRule> {
    const TABLE: &[(&str, i32, &str, Category)] = &[
        // Conto economico: specific blocks first.
        ("variazione rimanenze", 25, "variazione delle rimanenze", Category::CostiMaterie),
        ("variazioni rimanenze", 25, "variazioni delle rimanenze", Category::CostiMaterie),
        ("personale", 25, "costi per il personale", Category::CostiPersonale),
        ("salari", 25, "salari e stipendi", Category::CostiPersonale),
        ("oneri sociali", 25, "oneri sociali", Category::CostiPersonale),
        ("contributi previdenziali", 25, "contributi previdenziali", Category::CostiPersonale),
        ("accantonamento tfr", 25, "accantonamento tfr", Category::CostiPersonale),
        ("godimento beni di terzi", 22, "godimento beni di terzi", Category::CostiGodimento),
        ("costi materie", 20, "costi mat", Category::CostiMaterie),
        ("acquisto materie", 20, "acquisto di materie", Category::CostiMaterie),
        ("materie prime", 20, "materie prime", Category::CostiMaterie),
        ("costi servizi", 20, "costi per servizi", Category::CostiServizi),
        ("ammortamenti", 20, "ammortament", Category::Ammortamenti),
        ("interessi passivi", 20, "interessi passivi", Category::OneriFinanziari),
        ("oneri finanziari", 20, "oneri finanziari", Category::OneriFinanziari),
        ("ricavi vendite", 18, "ricavi delle vendite", Category::Ricavi),
        ("altri ricavi", 18, "altri ricavi", Category::Ricavi),
        ("contributi", 18, "contributi", Category::Ricavi),
        ("oneri diversi", 15, "oneri diversi", Category::AltriCosti),
        ("sopravvenienze passive", 15, "sopravvenienze passive", Category::AltriCosti),
        ("imposte e tasse", 15, "imposte e tasse", Category::AltriCosti),
        // Stato patrimoniale: attivo.
        ("liquidita immediate", 20, "liquidita immediate", Category::LiquiditaImmediate),
        ("depositi bancari", 20, "depositi bancari", Category::LiquiditaImmediate),
        ("cassa", 20, "cassa", Category::LiquiditaImmediate),
        ("denaro e valori", 20, "denaro e valori", Category::LiquiditaImmediate),
        ("crediti clienti", 20, "crediti v/clienti", Category::CreditiBreve),
        ("crediti verso clienti", 20, "crediti verso clienti", Category::CreditiBreve),
        ("crediti tributari", 20, "crediti tributari", Category::CreditiBreve),
        ("crediti altri", 20, "crediti v/altri", Category::CreditiBreve),
        ("crediti verso altri", 20, "crediti verso altri", Category::CreditiBreve),
        ("rimanenze", 20, "rimanenze", Category::Rimanenze),
        ("ratei attivi", 20, "ratei e risconti attivi", Category::RateiRiscontiAttivi),
        ("immobilizzazioni", 15, "immobilizzazioni", Category::Immobilizzazioni),
        ("impianti", 15, "impianti", Category::Immobilizzazioni),
        ("macchinari", 15, "macchinari", Category::Immobilizzazioni),
        ("attrezzature", 15, "attrezzature", Category::Immobilizzazioni),
        ("fabbricati", 15, "fabbricati", Category::Immobilizzazioni),
        ("terreni", 15, "terreni", Category::Immobilizzazioni),
        ("automezzi", 15, "automezzi", Category::Immobilizzazioni),
        ("avviamento", 15, "avviamento", Category::Immobilizzazioni),
        ("partecipazioni", 15, "partecipazioni", Category::Immobilizzazioni),
        ("brevetti", 15, "brevetti", Category::Immobilizzazioni),
        // Stato patrimoniale: passivo.
        ("debiti fornitori", 20, "debiti verso fornitori", Category::DebitiBreve),
        ("debiti v/fornitori", 20, "debiti v/fornitori", Category::DebitiBreve),
        ("debiti tributari", 20, "debiti tributari", Category::DebitiBreve),
        ("debiti istituti", 20, "debiti v/istit.", Category::DebitiBreve),
        ("debiti verso istituti", 20, "debiti verso istituti", Category::DebitiBreve),
        ("altri debiti", 20, "altri debiti", Category::DebitiBreve),
        ("ratei passivi", 20, "ratei e risconti passivi", Category::RateiRiscontiPassivi),
        ("patrimonio netto", 22, "patrimonio netto", Category::PatrimonioNetto),
        ("capitale sociale", 22, "capitale sociale", Category::PatrimonioNetto),
        ("riserva", 20, "riserva", Category::PatrimonioNetto),
        ("utile esercizio", 20, "utile dell'esercizio", Category::PatrimonioNetto),
        ("perdita esercizio", 20, "perdita dell'esercizio", Category::PatrimonioNetto),
        ("risultato esercizio", 20, "risultato dell'esercizio", Category::PatrimonioNetto),
        ("mutui", 15, "mutui", Category::PassivoConsolidato),
        ("obbligazioni", 15, "obbligazioni", Category::PassivoConsolidato),
        ("fondo tfr", 15, "fondo tfr", Category::PassivoConsolidato),
        ("trattamento di fine rapporto", 15, "trattamento di fine rapporto", Category::PassivoConsolidato),
        ("fondi rischi", 15, "fondi per rischi e oneri", Category::PassivoConsolidato),
        ("debiti oltre esercizio", 15, "esigibili oltre", Category::PassivoConsolidato),
    ];

    TABLE
        .iter()
        .map(|&(name, priority, pattern, category)| ClassificationRule {
            name: name.to_string(),
            priority,
            pattern: pattern.to_string(),
            match_type: MatchType::Contains,
            category,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(voce: &str) -> Category {
        Classifier::with_defaults().classify(voce, None)
    }

    // ── default table ─────────────────────────────────────────────────────────

    #[test]
    fn classify_liquidita() {
        assert_eq!(classify("Depositi bancari e postali"), Category::LiquiditaImmediate);
        assert_eq!(classify("CASSA CONTANTI"), Category::LiquiditaImmediate);
        assert_eq!(classify("Denaro e valori in cassa"), Category::LiquiditaImmediate);
    }

    #[test]
    fn classify_crediti_and_debiti() {
        assert_eq!(classify("Crediti v/clienti entro 12 mesi"), Category::CreditiBreve);
        assert_eq!(classify("Crediti tributari"), Category::CreditiBreve);
        assert_eq!(classify("Debiti verso fornitori"), Category::DebitiBreve);
        assert_eq!(classify("Debiti v/istit. di previdenza"), Category::DebitiBreve);
        assert_eq!(classify("Altri debiti"), Category::DebitiBreve);
    }

    #[test]
    fn classify_ratei_sides() {
        assert_eq!(classify("Ratei e risconti attivi"), Category::RateiRiscontiAttivi);
        assert_eq!(classify("Ratei e risconti passivi"), Category::RateiRiscontiPassivi);
    }

    #[test]
    fn classify_patrimonio_netto() {
        assert_eq!(classify("Capitale sociale"), Category::PatrimonioNetto);
        assert_eq!(classify("Riserva legale"), Category::PatrimonioNetto);
        assert_eq!(classify("Utile dell'esercizio"), Category::PatrimonioNetto);
    }

    #[test]
    fn classify_conto_economico_blocks() {
        assert_eq!(classify("Ricavi delle vendite e delle prestazioni"), Category::Ricavi);
        assert_eq!(classify("Costi mat. prime, suss., di consumo"), Category::CostiMaterie);
        assert_eq!(classify("Costi per servizi"), Category::CostiServizi);
        assert_eq!(
            classify("Costi per godimento beni di terzi"),
            Category::CostiGodimento
        );
        assert_eq!(classify("Salari e stipendi"), Category::CostiPersonale);
        assert_eq!(classify("Ammortamento imm. materiali"), Category::Ammortamenti);
        assert_eq!(classify("Interessi passivi su mutui"), Category::OneriFinanziari);
        assert_eq!(classify("Oneri diversi di gestione"), Category::AltriCosti);
    }

    #[test]
    fn classify_accent_insensitive() {
        assert_eq!(classify("LIQUIDITÀ IMMEDIATE"), Category::LiquiditaImmediate);
        assert_eq!(classify("Liquidita' immediate"), Category::LiquiditaImmediate);
    }

    #[test]
    fn unmatched_voce_is_unclassified() {
        assert_eq!(classify("Voce misteriosa"), Category::Unclassified);
    }

    // ── priority + section interplay ──────────────────────────────────────────

    #[test]
    fn contributi_previdenziali_beat_generic_contributi() {
        // "contributi" alone is revenue, but the previdenziali form is a
        // personnel cost and must win on priority.
        assert_eq!(classify("Contributi previdenziali"), Category::CostiPersonale);
        assert_eq!(classify("Contributi in conto esercizio"), Category::Ricavi);
    }

    #[test]
    fn rimanenze_in_conto_economico_are_a_variation() {
        let c = Classifier::with_defaults();
        assert_eq!(
            c.classify("Rimanenze finali di merci", Some(Section::Attivita)),
            Category::Rimanenze
        );
        assert_eq!(
            c.classify(
                "Variazione delle rimanenze di materie prime",
                Some(Section::ContoEconomico)
            ),
            Category::CostiMaterie
        );
    }

    #[test]
    fn section_guard_skips_incompatible_categories() {
        let c = Classifier::with_defaults();
        // "mutui" under CONTO ECONOMICO cannot be a consolidated liability:
        // the interest rule wins instead.
        assert_eq!(
            c.classify("Interessi passivi su mutui", Some(Section::ContoEconomico)),
            Category::OneriFinanziari
        );
    }

    #[test]
    fn interessi_passivi_beat_mutui_without_section() {
        assert_eq!(classify("Interessi passivi su mutui"), Category::OneriFinanziari);
    }

    // ── TOML loading ──────────────────────────────────────────────────────────

    #[test]
    fn from_toml_layers_over_defaults() {
        let toml = r#"
            [[rules]]
            name = "fidi"
            pattern = "anticipi su fatture"
            category = "debiti_breve"
        "#;
        let c = Classifier::from_toml(toml).unwrap();
        assert_eq!(
            c.classify("Anticipi su fatture SBF", None),
            Category::DebitiBreve
        );
        // defaults still present
        assert_eq!(c.classify("Cassa", None), Category::LiquiditaImmediate);
    }

    #[test]
    fn from_toml_replace_drops_defaults() {
        let toml = r#"
            replace = true

            [[rules]]
            name = "only"
            pattern = "cassa"
            category = "liquidita_immediate"
        "#;
        let c = Classifier::from_toml(toml).unwrap();
        assert_eq!(c.classify("Cassa", None), Category::LiquiditaImmediate);
        assert_eq!(c.classify("Debiti verso fornitori", None), Category::Unclassified);
    }

    #[test]
    fn from_toml_user_rule_outranks_default() {
        // Priority defaults to 50, above the whole built-in table.
        let toml = r#"
            [[rules]]
            name = "cassa edile"
            pattern = "cassa edile"
            category = "debiti_breve"
        "#;
        let c = Classifier::from_toml(toml).unwrap();
        assert_eq!(c.classify("Versamenti cassa edile", None), Category::DebitiBreve);
    }

    #[test]
    fn from_toml_invalid_errors() {
        assert!(Classifier::from_toml("rules = 3").is_err());
    }

    // ── other match types ─────────────────────────────────────────────────────

    #[test]
    fn regex_rule_matches_raw_voce() {
        let c = Classifier::new(vec![ClassificationRule {
            name: "conti 15xx".to_string(),
            priority: 1,
            pattern: r"^15\d\d\b".to_string(),
            match_type: MatchType::Regex,
            category: Category::LiquiditaImmediate,
        }]);
        assert_eq!(c.classify("1501 Banca Intesa c/c", None), Category::LiquiditaImmediate);
        assert_eq!(c.classify("2501 Fornitori", None), Category::Unclassified);
    }

    #[test]
    fn fuzzy_rule_tolerates_typos() {
        let c = Classifier::new(vec![ClassificationRule {
            name: "fuzzy rimanenze".to_string(),
            priority: 1,
            pattern: "rimanenze".to_string(),
            match_type: MatchType::Fuzzy { threshold: 0.8 },
            category: Category::Rimanenze,
        }]);
        assert_eq!(c.classify("rimanenza", None), Category::Rimanenze);
        assert_eq!(c.classify("fornitori", None), Category::Unclassified);
    }

    #[test]
    fn invalid_regex_rule_never_matches() {
        let c = Classifier::new(vec![ClassificationRule {
            name: "broken".to_string(),
            priority: 1,
            pattern: "(".to_string(),
            match_type: MatchType::Regex,
            category: Category::Rimanenze,
        }]);
        assert_eq!(c.classify("(", None), Category::Unclassified);
    }
}
