// 辞書ベースの極性スコアリング。
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Deserialize;

use super::tokenizer::{WordToken, count_exclamations, has_caps_differential, tokenize};
use super::{ClassifierError, LabelSet, NormalizedText, PolarityScore, SentimentClassifier};

const DEFAULT_LEXICON_JSON: &str = include_str!("../resources/sentiment_lexicon.json");
const LEXICON_RESOURCE: &str = "sentiment lexicon";

const VALENCE_LIMIT: f64 = 4.0;
const BOOSTER_LIMIT: f64 = 1.0;
const COMPOUND_ALPHA: f64 = 15.0;
const NEGATION_SCALAR: f64 = -0.74;
const CAPS_INCREMENT: f64 = 0.733;
const EXCLAMATION_INCREMENT: f64 = 0.292;
const MAX_EXCLAMATIONS: usize = 4;
const CONTRAST_BEFORE: f64 = 0.5;
const CONTRAST_AFTER: f64 = 1.5;
const LOOKBACK_DECAY: [f64; 3] = [1.0, 0.95, 0.9];

#[derive(Debug, Deserialize)]
struct LexiconFile {
    valences: HashMap<String, f64>,
    #[serde(default)]
    boosters: HashMap<String, f64>,
    #[serde(default)]
    negations: Vec<String>,
}

impl LexiconFile {
    fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.valences.is_empty(), "lexicon has no valence entries");
        for (word, valence) in &self.valences {
            anyhow::ensure!(
                valence.is_finite() && valence.abs() <= VALENCE_LIMIT,
                "valence for `{word}` must lie in [-{VALENCE_LIMIT}, {VALENCE_LIMIT}], got {valence}"
            );
        }
        for (word, boost) in &self.boosters {
            anyhow::ensure!(
                boost.is_finite() && boost.abs() <= BOOSTER_LIMIT,
                "booster for `{word}` must lie in [-{BOOSTER_LIMIT}, {BOOSTER_LIMIT}], got {boost}"
            );
        }
        Ok(())
    }
}

/// 語ごとの感情価・強調語・否定語の表。
#[derive(Debug, Clone)]
pub struct LexiconTable {
    valences: HashMap<String, f64>,
    boosters: HashMap<String, f64>,
    negations: HashSet<String>,
}

impl LexiconTable {
    /// 組み込みの辞書を読み込む。
    ///
    /// # Errors
    /// 組み込み JSON が壊れている場合は [`ClassifierError::Configuration`]。
    pub fn builtin() -> Result<Self, ClassifierError> {
        Self::from_json(DEFAULT_LEXICON_JSON)
    }

    /// # Errors
    /// ファイルの読み込み・解析・検証のいずれかに失敗した場合は
    /// [`ClassifierError::Configuration`]。
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ClassifierError> {
        let raw = fs::read_to_string(path.as_ref())
            .with_context(|| format!("failed to read lexicon from {:?}", path.as_ref()))
            .map_err(|error| ClassifierError::configuration(LEXICON_RESOURCE, error))?;
        Self::from_json(&raw)
    }

    /// # Errors
    /// JSON の解析または値域の検証に失敗した場合は [`ClassifierError::Configuration`]。
    pub fn from_json(raw: &str) -> Result<Self, ClassifierError> {
        parse_table(raw).map_err(|error| ClassifierError::configuration(LEXICON_RESOURCE, error))
    }

    #[must_use]
    pub fn valence(&self, word: &str) -> Option<f64> {
        self.valences.get(word).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.valences.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.valences.is_empty()
    }

    fn booster(&self, word: &str) -> Option<f64> {
        self.boosters.get(word).copied()
    }

    fn is_negation(&self, word: &str) -> bool {
        self.negations.contains(word) || word.ends_with("n't")
    }
}

fn parse_table(raw: &str) -> Result<LexiconTable> {
    let file: LexiconFile =
        serde_json::from_str(raw).context("failed to parse sentiment lexicon json")?;
    file.validate()?;
    Ok(LexiconTable {
        valences: lowercase_keys(file.valences),
        boosters: lowercase_keys(file.boosters),
        negations: file
            .negations
            .into_iter()
            .map(|word| word.to_lowercase())
            .collect(),
    })
}

fn lowercase_keys(map: HashMap<String, f64>) -> HashMap<String, f64> {
    map.into_iter()
        .map(|(word, value)| (word.to_lowercase(), value))
        .collect()
}

/// ルールベースの三値分類器。
///
/// 状態を持たず決定的なので、1件ずつでもまとめてでも同じ結果になる。
#[derive(Debug, Clone)]
pub struct LexiconClassifier {
    table: Arc<LexiconTable>,
}

impl LexiconClassifier {
    #[must_use]
    pub fn new(table: LexiconTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    /// # Errors
    /// 組み込み辞書の読み込みに失敗した場合。
    pub fn with_builtin() -> Result<Self, ClassifierError> {
        LexiconTable::builtin().map(Self::new)
    }

    /// テキストの compound スコアを -1.0〜1.0 で返す。語が一つもなければ 0.0。
    #[must_use]
    pub fn compound(&self, text: &str) -> f64 {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return 0.0;
        }
        let caps_differential = has_caps_differential(&tokens);
        let mut valences = (0..tokens.len())
            .map(|index| self.token_valence(&tokens, index, caps_differential))
            .collect::<Vec<_>>();
        apply_contrast(&tokens, &mut valences);

        let sum: f64 = valences.iter().sum();
        let emphasis = exclamation_emphasis(text);
        let total = if sum > 0.0 {
            sum + emphasis
        } else if sum < 0.0 {
            sum - emphasis
        } else {
            sum
        };
        normalize(total)
    }

    fn token_valence(&self, tokens: &[WordToken], index: usize, caps_differential: bool) -> f64 {
        let token = &tokens[index];
        if self.table.booster(&token.lower).is_some() {
            return 0.0;
        }
        let Some(mut valence) = self.table.valence(&token.lower) else {
            return 0.0;
        };
        if caps_differential && token.is_shouting() {
            valence += CAPS_INCREMENT.copysign(valence);
        }

        let mut negated = false;
        for (distance, decay) in LOOKBACK_DECAY.iter().enumerate() {
            let Some(prior_index) = index.checked_sub(distance + 1) else {
                break;
            };
            let prior = &tokens[prior_index];
            if let Some(boost) = self.table.booster(&prior.lower) {
                let scalar = boost * decay;
                valence += if valence < 0.0 { -scalar } else { scalar };
            }
            if self.table.is_negation(&prior.lower) {
                negated = true;
            }
        }
        if negated {
            valence *= NEGATION_SCALAR;
        }
        valence
    }
}

impl SentimentClassifier for LexiconClassifier {
    fn name(&self) -> &'static str {
        "lexicon"
    }

    fn label_set(&self) -> LabelSet {
        LabelSet::Ternary
    }

    fn classify_batch(
        &self,
        texts: &[NormalizedText],
    ) -> Result<Vec<PolarityScore>, ClassifierError> {
        Ok(texts
            .par_iter()
            .map(|text| PolarityScore::Compound(self.compound(text.as_str())))
            .collect())
    }
}

/// "but" より前の語を弱め、後ろの語を強める。
fn apply_contrast(tokens: &[WordToken], valences: &mut [f64]) {
    let Some(pivot) = tokens.iter().position(|token| token.lower == "but") else {
        return;
    };
    for (index, valence) in valences.iter_mut().enumerate() {
        if index < pivot {
            *valence *= CONTRAST_BEFORE;
        } else if index > pivot {
            *valence *= CONTRAST_AFTER;
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn exclamation_emphasis(text: &str) -> f64 {
    count_exclamations(text).min(MAX_EXCLAMATIONS) as f64 * EXCLAMATION_INCREMENT
}

fn normalize(score: f64) -> f64 {
    (score / (score * score + COMPOUND_ALPHA).sqrt()).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn classifier() -> LexiconClassifier {
        LexiconClassifier::with_builtin().expect("builtin lexicon")
    }

    #[test]
    fn builtin_table_loads() {
        let table = LexiconTable::builtin().expect("builtin lexicon");
        assert!(!table.is_empty());
        assert_eq!(table.valence("love"), Some(3.2));
        assert_eq!(table.valence("box"), None);
    }

    #[rstest]
    #[case("I love this product", 0.5, 1.0)]
    #[case("This is terrible", -1.0, -0.5)]
    #[case("It is a box", -0.5, 0.5)]
    fn reference_sentences_land_in_expected_band(
        #[case] text: &str,
        #[case] low: f64,
        #[case] high: f64,
    ) {
        let score = classifier().compound(text);
        assert!(
            score > low && score < high,
            "compound for {text:?} was {score}"
        );
    }

    #[test]
    fn single_word_score_matches_normalization() {
        let expected = 3.2 / (3.2_f64 * 3.2 + 15.0).sqrt();
        assert!((classifier().compound("love") - expected).abs() < 1e-9);
    }

    #[test]
    fn empty_text_scores_zero() {
        let lexicon = classifier();
        assert!(lexicon.compound("").abs() < f64::EPSILON);
        assert!(lexicon.compound("   ").abs() < f64::EPSILON);
    }

    #[test]
    fn negation_flips_polarity() {
        let lexicon = classifier();
        assert!(lexicon.compound("the battery is good") > 0.0);
        assert!(lexicon.compound("the battery is not good") < 0.0);
        assert!(lexicon.compound("it isn't bad") > 0.0);
    }

    #[test]
    fn boosters_and_dampeners_scale_magnitude() {
        let lexicon = classifier();
        let plain = lexicon.compound("good");
        assert!(lexicon.compound("very good") > plain);
        assert!(lexicon.compound("slightly good") < plain);
        assert!(lexicon.compound("very bad") < lexicon.compound("bad"));
    }

    #[test]
    fn contrast_weights_the_second_clause() {
        let score = classifier().compound("The screen is good but the battery is horrible");
        assert!(score < 0.0, "got {score}");
    }

    #[test]
    fn exclamations_and_caps_add_emphasis() {
        let lexicon = classifier();
        let plain = lexicon.compound("great phone");
        assert!(lexicon.compound("great phone!!") > plain);
        assert!(lexicon.compound("GREAT phone") > plain);
    }

    #[test]
    fn compound_is_bounded() {
        let lexicon = classifier();
        let gushing = "love love love amazing excellent perfect best!!!!".repeat(20);
        let score = lexicon.compound(&gushing);
        assert!(score <= 1.0 && score > 0.9);
        let ranting = "worst awful terrible garbage".repeat(20);
        assert!(lexicon.compound(&ranting) >= -1.0);
    }

    #[test]
    fn batch_matches_per_record_scoring() {
        let lexicon = classifier();
        let raw = ["I love this product", "", "This is terrible", "meh"];
        let texts: Vec<NormalizedText> = raw
            .iter()
            .map(|text| NormalizedText::new((*text).to_string()))
            .collect();

        let scores = lexicon.classify_batch(&texts).expect("lexicon never fails");

        assert_eq!(scores.len(), raw.len());
        for (score, text) in scores.iter().zip(raw) {
            assert_eq!(*score, PolarityScore::Compound(lexicon.compound(text)));
        }
    }

    #[rstest]
    #[case("not json")]
    #[case(r#"{"valences": {}}"#)]
    #[case(r#"{"valences": {"good": 9.5}}"#)]
    #[case(r#"{"valences": {"good": 1.0}, "boosters": {"very": 3.0}}"#)]
    fn invalid_tables_are_configuration_errors(#[case] raw: &str) {
        let error = LexiconTable::from_json(raw).expect_err("table must be rejected");
        assert!(matches!(
            error,
            ClassifierError::Configuration {
                resource: "sentiment lexicon",
                ..
            }
        ));
    }

    #[test]
    fn custom_table_keys_are_case_insensitive() {
        let table = LexiconTable::from_json(
            r#"{"valences": {"Stellar": 3.0}, "negations": ["NEVER"]}"#,
        )
        .expect("valid table");
        let lexicon = LexiconClassifier::new(table);
        assert!(lexicon.compound("stellar service") > 0.5);
        assert!(lexicon.compound("never stellar") < 0.0);
    }
}
