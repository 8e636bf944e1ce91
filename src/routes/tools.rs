//! Simulated text tools
//!
//! Deterministic stand-ins for language processing: statistics over the
//! corpus, word-level similarity, keyword extraction, quizzes and plans.
//! Nothing here calls an external model.

use hyper::StatusCode;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};

use super::{ok, text_response, HandlerResult, RequestContext};
use crate::auth::roles::{RESEARCHER, TEACHER};
use crate::store::Sequence;
use crate::types::ServiceError;

const MAX_SUGGESTIONS: usize = 3;
const TOP_WORDS: usize = 10;
const KEYWORD_MIN_CHARS: usize = 7;

#[derive(Debug, Default, Deserialize)]
struct IdSelection {
    #[serde(default)]
    ids: Vec<u64>,
}

#[derive(Debug, Serialize)]
pub struct SequenceStats {
    pub levels: BTreeMap<String, usize>,
    pub themes: BTreeMap<String, usize>,
    pub modalities: BTreeMap<String, usize>,
    pub total_sequences: usize,
}

pub fn sequence_stats(sequences: &[Sequence]) -> SequenceStats {
    let mut stats = SequenceStats {
        levels: BTreeMap::new(),
        themes: BTreeMap::new(),
        modalities: BTreeMap::new(),
        total_sequences: sequences.len(),
    };
    for seq in sequences {
        if let Some(level) = &seq.level {
            *stats.levels.entry(level.clone()).or_default() += 1;
        }
        if let Some(theme) = &seq.theme {
            *stats.themes.entry(theme.clone()).or_default() += 1;
        }
        *stats.modalities.entry(seq.modality.clone()).or_default() += 1;
    }
    stats
}

/// GET /api/stats
pub fn stats(ctx: &RequestContext<'_>) -> HandlerResult {
    ok(&sequence_stats(&ctx.state.store.sequences.all()))
}

#[derive(Debug, Serialize)]
pub struct CorpusAnalysis {
    pub total_words: usize,
    pub unique_words: usize,
    /// `[word, count]` pairs, most frequent first; ties keep first appearance
    pub most_common: Vec<(String, usize)>,
}

pub fn analyze_corpus<'a>(texts: impl IntoIterator<Item = &'a str>) -> CorpusAnalysis {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let mut total_words = 0;
    for text in texts {
        for word in text.to_lowercase().split_whitespace() {
            let first_seen = counts.len();
            counts.entry(word.to_string()).or_insert((0, first_seen)).0 += 1;
            total_words += 1;
        }
    }

    let unique_words = counts.len();
    let mut ranked: Vec<(String, usize, usize)> = counts
        .into_iter()
        .map(|(word, (count, first))| (word, count, first))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));

    CorpusAnalysis {
        total_words,
        unique_words,
        most_common: ranked
            .into_iter()
            .take(TOP_WORDS)
            .map(|(word, count, _)| (word, count))
            .collect(),
    }
}

/// GET /api/corpus-analysis
///
/// Sequence descriptions followed by resource contents.
pub fn corpus_analysis(ctx: &RequestContext<'_>) -> HandlerResult {
    let sequences = ctx.state.store.sequences.all();
    let resources = ctx.state.store.resources.all();
    let texts = sequences
        .iter()
        .filter_map(|s| s.description.as_deref())
        .chain(resources.iter().map(|r| r.content.as_str()).filter(|c| !c.is_empty()));
    ok(&analyze_corpus(texts))
}

/// GET /api/progression-plan
pub fn progression_plan(ctx: &RequestContext<'_>) -> HandlerResult {
    let recommended = ctx.state.store.sequences.len().min(MAX_SUGGESTIONS);
    ok(&json!({
        "user": ctx.username()?,
        "objectives": [
            "Découvrir la grammaire maya",
            "Pratiquer l'oral",
            "Lire un texte authentique",
            "Créer une séquence didactique",
        ],
        "next_steps": [
            format!("Compléter {} séquences recommandées", recommended),
            "Participer à une activité collaborative",
        ],
    }))
}

/// GET /api/suggestions
///
/// Teachers get sequences, researchers documents, everyone else resources.
/// Only the first claimed role counts.
pub fn suggestions(ctx: &RequestContext<'_>) -> HandlerResult {
    let claims = ctx.claims()?;
    let mut rng = rand::thread_rng();
    let store = &ctx.state.store;

    let picked: Vec<Value> = match claims.roles.first().map(String::as_str) {
        Some(TEACHER) => sample(&store.sequences.all(), &mut rng)?,
        Some(RESEARCHER) => sample(&store.documents.all(), &mut rng)?,
        _ => sample(&store.resources.all(), &mut rng)?,
    };
    ok(&picked)
}

fn sample<T: Serialize, R: rand::Rng>(items: &[T], rng: &mut R) -> Result<Vec<Value>, ServiceError> {
    items
        .choose_multiple(rng, MAX_SUGGESTIONS)
        .map(|item| {
            serde_json::to_value(item)
                .map_err(|e| ServiceError::Internal(format!("Failed to serialize suggestion: {}", e)))
        })
        .collect()
}

/// `[src->tgt]` followed by the text reversed character by character
pub fn simulate_translation(text: &str, source: &str, target: &str) -> String {
    format!("[{}->{}] {}", source, target, text.chars().rev().collect::<String>())
}

/// POST /api/translate
pub fn translate(ctx: &RequestContext<'_>) -> HandlerResult {
    let text = ctx.request.required_string("text")?;
    let source = ctx.request.string_field("source")?.unwrap_or_else(|| "fr".into());
    let target = ctx.request.string_field("target")?.unwrap_or_else(|| "es".into());
    ok(&json!({"translation": simulate_translation(&text, &source, &target)}))
}

/// Distinct words longer than six characters, in order of appearance
pub fn extract_keywords(text: &str) -> Vec<&str> {
    let mut seen = HashSet::new();
    text.split_whitespace()
        .filter(|w| w.chars().count() >= KEYWORD_MIN_CHARS)
        .filter(|w| seen.insert(*w))
        .collect()
}

/// POST /api/keywords
pub fn keywords(ctx: &RequestContext<'_>) -> HandlerResult {
    let text = ctx.request.required_string("text")?;
    ok(&json!({"keywords": extract_keywords(&text)}))
}

/// Jaccard index of the lowercase word sets, rounded to three decimals
pub fn jaccard(a: &str, b: &str) -> f64 {
    let left: HashSet<String> = a.to_lowercase().split_whitespace().map(str::to_string).collect();
    let right: HashSet<String> = b.to_lowercase().split_whitespace().map(str::to_string).collect();
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }
    let shared = left.intersection(&right).count() as f64;
    let union = left.union(&right).count() as f64;
    (shared / union * 1000.0).round() / 1000.0
}

/// POST /api/similarity
pub fn similarity(ctx: &RequestContext<'_>) -> HandlerResult {
    let text1 = ctx.request.required_string("text1")?;
    let text2 = ctx.request.required_string("text2")?;
    ok(&json!({"similarity": jaccard(&text1, &text2)}))
}

/// POST /api/quiz-from-text
pub fn quiz_from_text(ctx: &RequestContext<'_>) -> HandlerResult {
    let text = ctx.request.required_string("text")?;
    ok(&json!({
        "questions": [
            {"q": "Quel est le thème principal du texte ?", "type": "ouverte"},
            {
                "q": "Combien de mots contient le texte ?",
                "type": "ouverte",
                "answer": text.split_whitespace().count(),
            },
            {"q": "Citez un mot du texte de plus de 6 lettres.", "type": "ouverte"},
        ]
    }))
}

/// POST /api/semantic-search
///
/// Case-insensitive substring match over the serialized record. An empty
/// query matches everything.
pub fn semantic_search(ctx: &RequestContext<'_>) -> HandlerResult {
    let query = ctx
        .request
        .string_field("query")?
        .unwrap_or_default()
        .to_lowercase();
    let store = &ctx.state.store;

    let mut results = Vec::new();
    for seq in store.sequences.all() {
        let item = serde_json::to_value(&seq)?;
        if item.to_string().to_lowercase().contains(&query) {
            results.push(json!({"type": "sequence", "item": item}));
        }
    }
    for res in store.resources.all() {
        let item = serde_json::to_value(&res)?;
        if item.to_string().to_lowercase().contains(&query) {
            results.push(json!({"type": "resource", "item": item}));
        }
    }
    ok(&results)
}

/// POST /api/lesson-plan
pub fn lesson_plan(ctx: &RequestContext<'_>) -> HandlerResult {
    let selection: IdSelection = ctx.request.json_or_default()?;
    let selected = ctx.state.store.sequences.select(&selection.ids);

    let objectives: Vec<String> = selected
        .iter()
        .map(|s| {
            format!(
                "Maîtriser le thème {} (niveau {})",
                s.theme.as_deref().unwrap_or("inconnu"),
                s.level.as_deref().unwrap_or("inconnu")
            )
        })
        .collect();
    let mut modalities: Vec<&str> = Vec::new();
    for seq in &selected {
        if !modalities.contains(&seq.modality.as_str()) {
            modalities.push(&seq.modality);
        }
    }

    ok(&json!({
        "title": "Plan de cours généré",
        "objectives": objectives,
        "modalities": modalities,
        "sequences": selected,
    }))
}

pub fn plain_text_export(sequences: &[Sequence]) -> String {
    sequences
        .iter()
        .map(|s| format!("Séquence {}: {} ({})", s.id, s.title, s.modality))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// POST /api/export-text
pub fn export_text(ctx: &RequestContext<'_>) -> HandlerResult {
    let selection: IdSelection = ctx.request.json_or_default()?;
    let selected = ctx.state.store.sequences.select(&selection.ids);
    Ok(text_response(
        StatusCode::OK,
        "text/plain; charset=utf-8",
        plain_text_export(&selected),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translation_reverses_text() {
        assert_eq!(simulate_translation("hola", "es", "maya"), "[es->maya] aloh");
    }

    #[test]
    fn test_keywords_are_long_and_unique() {
        let words = extract_keywords("la grammaire maya et la grammaire orale pratique");
        assert_eq!(words, vec!["grammaire", "pratique"]);
    }

    #[test]
    fn test_jaccard() {
        assert_eq!(jaccard("a b c", "b c d"), 0.5);
        assert_eq!(jaccard("Un deux trois", "un"), 0.333);
        assert_eq!(jaccard("", "x"), 0.0);
    }

    #[test]
    fn test_corpus_ranking() {
        let analysis = analyze_corpus(["Le chat le chien", "le maya"]);
        assert_eq!(analysis.total_words, 6);
        assert_eq!(analysis.unique_words, 4);
        assert_eq!(analysis.most_common[0], ("le".to_string(), 3));
        assert_eq!(analysis.most_common[1], ("chat".to_string(), 1));
    }

    #[test]
    fn test_stats_counts_fields() {
        let seqs = vec![
            Sequence::new("a", "en ligne").with_level("A1"),
            Sequence::new("b", "en ligne").with_level("A1").with_theme("famille"),
            Sequence::new("c", "présentiel"),
        ];
        let stats = sequence_stats(&seqs);
        assert_eq!(stats.total_sequences, 3);
        assert_eq!(stats.levels["A1"], 2);
        assert_eq!(stats.themes.len(), 1);
        assert_eq!(stats.modalities["en ligne"], 2);
    }

    #[test]
    fn test_plain_text_export() {
        let mut a = Sequence::new("Saludos", "en ligne");
        a.id = 1;
        let mut b = Sequence::new("Números", "présentiel");
        b.id = 2;
        assert_eq!(
            plain_text_export(&[a, b]),
            "Séquence 1: Saludos (en ligne)\n\nSéquence 2: Números (présentiel)"
        );
    }
}
