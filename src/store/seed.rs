//! Default catalogue and record generators used by the admin endpoints

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use serde_json::Value;

use super::catalog::CatalogItem;
use super::sequence::Sequence;

/// Upper bound on records produced by one generator call
pub const MAX_GENERATED: usize = 1000;

pub fn default_documents() -> Vec<CatalogItem> {
    [
        ("1", "Document 1", "Description du Document 1", "http://example.com/doc1", "2023-01-01", "Contenu du Document 1"),
        ("2", "Document 2", "Description du Document 2", "http://example.com/doc2", "2023-01-02", "Contenu du Document 2"),
        ("3", "Grammaire de la langue maya", "Ouvrage de référence sur la grammaire maya.", "http://example.com/maya-grammaire", "2023-02-01", "Contenu sur la grammaire maya."),
        ("4", "Histoire du peuple maya", "Document historique sur la civilisation maya.", "http://example.com/maya-histoire", "2023-03-01", "Contenu historique maya."),
    ]
    .into_iter()
    .map(|(id, title, description, url, date, content)| {
        let mut item = CatalogItem::new(title, description, url, date, content);
        item.id = id.to_string();
        item
    })
    .collect()
}

pub fn default_resources() -> Vec<CatalogItem> {
    [
        ("1", "Ressource 1", "Description de la Ressource 1", "http://example.com/res1", "2023-01-01", "Contenu de la Ressource 1"),
        ("2", "Ressource 2", "Description de la Ressource 2", "http://example.com/res2", "2023-01-02", "Contenu de la Ressource 2"),
        ("3", "Cours de maya en ligne", "Ressource pédagogique pour apprendre le maya.", "http://example.com/maya-cours", "2023-04-01", "Cours interactif de langue maya."),
        ("4", "Podcast sur la culture maya", "Podcast audio sur la culture et la langue maya.", "http://example.com/maya-podcast", "2023-05-01", "Podcast en langue maya."),
    ]
    .into_iter()
    .map(|(id, title, description, url, date, content)| {
        let mut item = CatalogItem::new(title, description, url, date, content);
        item.id = id.to_string();
        item
    })
    .collect()
}

/// Placeholder sequence for bulk generation
pub fn auto_sequence(id: u64) -> Sequence {
    let modality = if id % 2 == 0 { "présentiel" } else { "en ligne" };
    Sequence::new(format!("Séquence auto {}", id), modality)
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn default_levels() -> Vec<String> {
    strings(&["A1", "A2", "B1", "B2"])
}

fn default_sequence_themes() -> Vec<String> {
    strings(&["salutations", "famille", "école", "nature"])
}

fn default_modalities() -> Vec<String> {
    strings(&["présentiel", "en ligne"])
}

fn default_resource_types() -> Vec<String> {
    strings(&["document", "podcast", "lien"])
}

fn default_resource_themes() -> Vec<String> {
    strings(&["grammaire", "culture", "oral", "écrit"])
}

fn default_count() -> usize {
    8
}

fn pick<R: Rng>(rng: &mut R, values: &[String]) -> String {
    values.choose(rng).cloned().unwrap_or_default()
}

/// Body of the custom sequence generator
#[derive(Debug, Clone, Deserialize)]
pub struct SequenceBlueprint {
    #[serde(alias = "niveaux", default = "default_levels")]
    pub levels: Vec<String>,
    #[serde(default = "default_sequence_themes")]
    pub themes: Vec<String>,
    #[serde(alias = "modalites", default = "default_modalities")]
    pub modalities: Vec<String>,
    #[serde(default = "default_count")]
    pub count: usize,
}

impl Default for SequenceBlueprint {
    fn default() -> Self {
        Self {
            levels: default_levels(),
            themes: default_sequence_themes(),
            modalities: default_modalities(),
            count: default_count(),
        }
    }
}

impl SequenceBlueprint {
    /// Empty choice lists fall back to the defaults
    pub fn normalized(mut self) -> Self {
        if self.levels.is_empty() {
            self.levels = default_levels();
        }
        if self.themes.is_empty() {
            self.themes = default_sequence_themes();
        }
        if self.modalities.is_empty() {
            self.modalities = default_modalities();
        }
        self
    }

    pub fn generate<R: Rng>(&self, rng: &mut R) -> Sequence {
        Sequence::new(
            format!("Séquence {} - {}", pick(rng, &self.levels), pick(rng, &self.themes)),
            pick(rng, &self.modalities),
        )
        .with_level(pick(rng, &self.levels))
        .with_theme(pick(rng, &self.themes))
    }
}

/// Body of the resource generator
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceBlueprint {
    #[serde(default = "default_resource_types")]
    pub types: Vec<String>,
    #[serde(default = "default_resource_themes")]
    pub themes: Vec<String>,
    #[serde(alias = "niveaux", default = "default_levels")]
    pub levels: Vec<String>,
    #[serde(default = "default_count")]
    pub count: usize,
}

impl Default for ResourceBlueprint {
    fn default() -> Self {
        Self {
            types: default_resource_types(),
            themes: default_resource_themes(),
            levels: default_levels(),
            count: default_count(),
        }
    }
}

impl ResourceBlueprint {
    pub fn normalized(mut self) -> Self {
        if self.types.is_empty() {
            self.types = default_resource_types();
        }
        if self.themes.is_empty() {
            self.themes = default_resource_themes();
        }
        if self.levels.is_empty() {
            self.levels = default_levels();
        }
        self
    }

    pub fn generate<R: Rng>(&self, rng: &mut R, id: &str) -> CatalogItem {
        let kind = pick(rng, &self.types);
        let mut title_kind = kind.clone();
        if let Some(first) = title_kind.get(..1) {
            let upper = first.to_uppercase();
            title_kind.replace_range(..1, &upper);
        }

        CatalogItem::new(
            format!("{} {} {}", title_kind, pick(rng, &self.themes), pick(rng, &self.levels)),
            format!(
                "Ressource pédagogique sur {} pour le niveau {}.",
                pick(rng, &self.themes),
                pick(rng, &self.levels)
            ),
            format!("http://example.com/auto-resource-{}", id),
            format!("2023-07-{}", rng.gen_range(10..=28)),
            format!("Contenu auto-généré pour {}.", pick(rng, &self.themes)),
        )
        .with("type", kind)
        .with("theme", pick(rng, &self.themes))
        .with("level", pick(rng, &self.levels))
    }
}

/// One sample sequence per supported language
pub fn multilang_sequences() -> Vec<Sequence> {
    [
        ("U yookotil k'iimil", "en ligne", "A1", "salutations", "maya", "yucatèque", "communautaire"),
        ("Séquence de présentation", "présentiel", "A2", "présentation", "fr", "", "scolaire"),
        ("Greetings sequence", "online", "B1", "greetings", "en", "", "international"),
        ("Secuencia de saludos", "presencial", "A1", "saludos", "es", "", "escolar"),
        ("Sequenza di saluti", "presenziale", "A2", "saluti", "it", "", "scolastico"),
    ]
    .into_iter()
    .map(|(title, modality, level, theme, language, dialect, context)| {
        let mut seq = Sequence::new(title, modality)
            .with_level(level)
            .with_theme(theme)
            .with_language(language);
        seq.dialect = dialect.to_string();
        seq.cultural_context = context.to_string();
        seq
    })
    .collect()
}

/// Audio and video sample resources; ids are allocated on insertion
pub fn multilang_resources() -> Vec<CatalogItem> {
    vec![
        CatalogItem::new(
            "Audio maya",
            "Enregistrement natif maya",
            "http://example.com/maya-audio",
            "2025-07-16",
            "Audio maya",
        )
        .with("type", "audio")
        .with("theme", "salutations")
        .with("level", "A1")
        .with("language", "maya")
        .with("dialect", "yucatèque")
        .with("cultural_context", "communautaire")
        .with("audio_support", "http://example.com/maya-audio.mp3")
        .with("video_support", Value::Null),
        CatalogItem::new(
            "Vidéo présentation FR",
            "Vidéo de présentation en français",
            "http://example.com/fr-video",
            "2025-07-16",
            "Vidéo FR",
        )
        .with("type", "video")
        .with("theme", "présentation")
        .with("level", "A2")
        .with("language", "fr")
        .with("dialect", "")
        .with("cultural_context", "scolaire")
        .with("audio_support", Value::Null)
        .with("video_support", "http://example.com/fr-video.mp4"),
    ]
}

fn prompt_head(prompt: &str) -> String {
    prompt.chars().take(30).collect()
}

pub fn prompt_sequence(prompt: &str) -> Sequence {
    Sequence::new(format!("Séquence IA : {}", prompt_head(prompt)), "en ligne")
        .with_level("A2")
        .with_theme("auto-ia")
        .with_description(format!("Généré à partir du prompt : {}", prompt))
}

pub fn prompt_resource(prompt: &str, id: &str) -> CatalogItem {
    CatalogItem::new(
        format!("Ressource IA : {}", prompt_head(prompt)),
        format!("Ressource générée à partir du prompt : {}", prompt),
        format!("http://example.com/ia-resource-{}", id),
        "2025-07-16",
        format!("Contenu IA pour : {}", prompt),
    )
    .with("type", "ia")
    .with("theme", "auto-ia")
    .with("level", "A2")
    .with("dialect", "yucatèque")
    .with("cultural_context", "communautaire")
}

/// Test accounts created by the user generator: (username, secret)
pub fn test_accounts() -> Vec<(String, String)> {
    (1..=5)
        .map(|i| (format!("testuser{}", i), format!("test{}pass", i)))
        .collect()
}
