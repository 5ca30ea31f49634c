//! Text-to-knowledge-base extraction pipeline
//!
//! Text → Tokenizer → windows → Generator → TripletParser → KnowledgeBase
//!
//! Candidates are consumed in window order, then in the order the generator
//! returned them, so provenance and insertion order are reproducible.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use relkg_core::{
    Encoding, EntityResolver, ExtractionConfig, GenerationBatch, GenerationParams, Generator,
    RelkgError, Result, Span, Tokenizer,
};
use serde::{Deserialize, Serialize};

use crate::knowledge_base::{AddOutcome, KnowledgeBase};
use crate::parser::TripletParser;
use crate::segmenter::SpanSegmenter;

// ============================================================================
// Extraction Modes
// ============================================================================

/// Selects window length and whether endpoints are canonicalized
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMode {
    /// Single truncated window, plain knowledge base
    ShortText,
    /// Overlapping windows, plain knowledge base
    #[default]
    LongText,
    /// Overlapping windows, canonicalizing knowledge base
    Wikipedia,
}

impl ExtractionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShortText => "short_text",
            Self::LongText => "long_text",
            Self::Wikipedia => "wikipedia",
        }
    }

    /// Whether this mode resolves entities before deduplication
    pub fn canonicalizes(&self) -> bool {
        matches!(self, Self::Wikipedia)
    }
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractionMode {
    type Err = RelkgError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "short_text" => Ok(Self::ShortText),
            "long_text" => Ok(Self::LongText),
            "wikipedia" => Ok(Self::Wikipedia),
            other => Err(RelkgError::InvalidInput(format!(
                "unknown extraction mode '{other}'"
            ))),
        }
    }
}

// ============================================================================
// Extraction Results
// ============================================================================

/// Counters collected while populating the knowledge base
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Decoded sequences returned by the generator
    pub sequences: usize,
    /// Triplets produced by the parser
    pub parsed: usize,
    pub inserted: usize,
    pub merged: usize,
    pub duplicates: usize,
    /// Triplets dropped because an entity did not resolve
    pub dropped: usize,
}

impl ExtractionStats {
    fn record(&mut self, outcome: AddOutcome) {
        match outcome {
            AddOutcome::Inserted => self.inserted += 1,
            AddOutcome::Merged { .. } => self.merged += 1,
            AddOutcome::Duplicate => self.duplicates += 1,
            AddOutcome::Dropped => self.dropped += 1,
        }
    }
}

/// Result of one extraction request
#[derive(Debug)]
pub struct Extraction {
    pub mode: ExtractionMode,
    pub knowledge_base: KnowledgeBase,
    /// Token windows sent to the generator, clipped to the input
    pub windows: Vec<Span>,
    pub stats: ExtractionStats,
}

impl Extraction {
    fn empty(mode: ExtractionMode, knowledge_base: KnowledgeBase) -> Self {
        Self {
            mode,
            knowledge_base,
            windows: Vec::new(),
            stats: ExtractionStats::default(),
        }
    }
}

// ============================================================================
// Extractor
// ============================================================================

/// Runs extraction against injected tokenizer, generator and resolver
pub struct Extractor {
    generator: Arc<dyn Generator>,
    tokenizer: Arc<dyn Tokenizer>,
    resolver: Option<Arc<dyn EntityResolver>>,
    parser: TripletParser,
    config: ExtractionConfig,
}

impl Extractor {
    /// Create an extractor; the configuration is validated up front
    pub fn new(
        generator: Arc<dyn Generator>,
        tokenizer: Arc<dyn Tokenizer>,
        config: ExtractionConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            generator,
            tokenizer,
            resolver: None,
            parser: TripletParser::with_markers(config.markers.clone()),
            config,
        })
    }

    /// Enable the canonicalizing mode
    pub fn with_resolver(mut self, resolver: Arc<dyn EntityResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    pub fn has_resolver(&self) -> bool {
        self.resolver.is_some()
    }

    /// Extract a knowledge base from `text`
    ///
    /// Only tokenizer and generator failures are errors; unparseable output
    /// and unresolved entities just reduce the number of triplets.
    pub async fn extract(&self, text: &str, mode: ExtractionMode) -> Result<Extraction> {
        let mut knowledge_base = self.knowledge_base_for(mode)?;

        if text.trim().is_empty() {
            tracing::debug!("Empty input, skipping generation");
            return Ok(Extraction::empty(mode, knowledge_base));
        }

        let encoding = self.tokenizer.encode(text)?;
        let windows = self.windows(encoding.len(), mode)?;
        if windows.is_empty() {
            return Ok(Extraction::empty(mode, knowledge_base));
        }

        tracing::info!(
            mode = %mode,
            tokens = encoding.len(),
            windows = windows.len(),
            "Extraction started"
        );

        let batch = build_batch(&encoding, &windows, self.tokenizer.pad_token_id());
        let params = self.params_for(mode);
        let sequences = self.generator.generate(&batch, &params).await?;

        let expected = windows.len() * params.num_return_sequences;
        if sequences.len() != expected {
            return Err(RelkgError::Generation(format!(
                "{} returned {} sequences, expected {expected}",
                self.generator.name(),
                sequences.len()
            )));
        }

        let mut stats = ExtractionStats {
            sequences: sequences.len(),
            ..Default::default()
        };

        for (index, sequence) in sequences.iter().enumerate() {
            let span = windows[index / params.num_return_sequences];
            let triplets = self.parser.parse(sequence);
            tracing::debug!(window = %span, candidate = index, triplets = triplets.len(), "Parsed candidate");

            for triplet in triplets {
                stats.parsed += 1;
                let outcome = knowledge_base.add(triplet.with_span(span)).await;
                stats.record(outcome);
            }
        }

        tracing::info!(
            mode = %mode,
            triplets = knowledge_base.len(),
            parsed = stats.parsed,
            dropped = stats.dropped,
            "Extraction complete"
        );

        Ok(Extraction {
            mode,
            knowledge_base,
            windows,
            stats,
        })
    }

    /// Windows for an input of `total_tokens`, clipped to the input
    pub fn windows(&self, total_tokens: usize, mode: ExtractionMode) -> Result<Vec<Span>> {
        if total_tokens == 0 {
            return Ok(Vec::new());
        }
        match mode {
            ExtractionMode::ShortText => Ok(vec![Span::new(
                0,
                total_tokens.min(self.config.short_text_max_tokens),
            )]),
            ExtractionMode::LongText | ExtractionMode::Wikipedia => {
                let segmenter = SpanSegmenter::new(self.config.window_length)?;
                Ok(segmenter
                    .segment(total_tokens)
                    .into_iter()
                    .map(|span| span.clip(total_tokens))
                    .collect())
            }
        }
    }

    fn params_for(&self, mode: ExtractionMode) -> GenerationParams {
        match mode {
            ExtractionMode::ShortText => self.config.short_text_params(),
            ExtractionMode::LongText | ExtractionMode::Wikipedia => {
                self.config.long_text_params()
            }
        }
    }

    fn knowledge_base_for(&self, mode: ExtractionMode) -> Result<KnowledgeBase> {
        if !mode.canonicalizes() {
            return Ok(KnowledgeBase::new());
        }
        self.resolver
            .clone()
            .map(KnowledgeBase::with_resolver)
            .ok_or_else(|| {
                RelkgError::Config(format!("{mode} mode requires an entity resolver"))
            })
    }
}

/// Slice `encoding` into one row per window, right-padding shorter rows
pub fn build_batch(encoding: &Encoding, windows: &[Span], pad_token_id: u32) -> GenerationBatch {
    let width = windows.iter().map(Span::len).max().unwrap_or(0);
    let mut batch = GenerationBatch::default();

    for window in windows {
        let window = window.clip(encoding.len());
        let mut ids = encoding.ids[window.start..window.end].to_vec();
        let mut mask = encoding
            .attention_mask
            .get(window.start..window.end)
            .map(<[u32]>::to_vec)
            .unwrap_or_else(|| vec![1; ids.len()]);

        ids.resize(width, pad_token_id);
        mask.resize(width, 0);
        batch.input_ids.push(ids);
        batch.attention_mask.push(mask);
    }

    batch
}

#[cfg(test)]
mod tests {
    use super::*;
    use relkg_core::{Entity, Resolution};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// One token per whitespace-separated word, ids are word positions
    struct WordTokenizer;

    impl Tokenizer for WordTokenizer {
        fn encode(&self, text: &str) -> Result<Encoding> {
            let ids: Vec<u32> = (0..text.split_whitespace().count() as u32).collect();
            let mask = vec![1; ids.len()];
            Ok(Encoding::new(ids, mask))
        }

        fn decode(&self, ids: &[u32]) -> Result<String> {
            Ok(ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(" "))
        }

        fn pad_token_id(&self) -> u32 {
            u32::MAX
        }
    }

    /// Returns canned sequences and records the batch it was given
    struct ScriptedGenerator {
        sequences: Vec<String>,
        seen: Mutex<Vec<(GenerationBatch, GenerationParams)>>,
    }

    impl ScriptedGenerator {
        fn new(sequences: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                sequences: sequences.iter().map(|s| s.to_string()).collect(),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl Generator for ScriptedGenerator {
        async fn generate(
            &self,
            batch: &GenerationBatch,
            params: &GenerationParams,
        ) -> Result<Vec<String>> {
            self.seen.lock().unwrap().push((batch.clone(), *params));
            Ok(self.sequences.clone())
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    struct FailingGenerator;

    #[async_trait::async_trait]
    impl Generator for FailingGenerator {
        async fn generate(&self, _: &GenerationBatch, _: &GenerationParams) -> Result<Vec<String>> {
            Err(RelkgError::Generation("model offline".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct AliasResolver(HashMap<&'static str, &'static str>);

    #[async_trait::async_trait]
    impl EntityResolver for AliasResolver {
        async fn resolve(&self, candidate: &str) -> Resolution {
            match self.0.get(candidate) {
                Some(title) => Resolution::Resolved(Entity::new(*title, "", "")),
                None => Resolution::Absent,
            }
        }

        fn name(&self) -> &str {
            "alias"
        }
    }

    fn small_config() -> ExtractionConfig {
        ExtractionConfig {
            window_length: 4,
            short_text_max_tokens: 5,
            num_beams: 2,
            num_return_sequences: 2,
            ..Default::default()
        }
    }

    fn words(n: usize) -> String {
        vec!["w"; n].join(" ")
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("short_text".parse::<ExtractionMode>().unwrap(), ExtractionMode::ShortText);
        assert_eq!("long-text".parse::<ExtractionMode>().unwrap(), ExtractionMode::LongText);
        assert_eq!("Wikipedia".parse::<ExtractionMode>().unwrap(), ExtractionMode::Wikipedia);
        assert!("graph".parse::<ExtractionMode>().is_err());
        assert_eq!(ExtractionMode::Wikipedia.to_string(), "wikipedia");
    }

    #[test]
    fn test_build_batch_pads_short_rows() {
        let encoding = Encoding::new(vec![10, 11, 12, 13, 14], vec![1; 5]);
        let batch = build_batch(&encoding, &[Span::new(0, 4), Span::new(3, 5)], 0);

        assert_eq!(batch.input_ids, vec![vec![10, 11, 12, 13], vec![13, 14, 0, 0]]);
        assert_eq!(batch.attention_mask, vec![vec![1, 1, 1, 1], vec![1, 1, 0, 0]]);
    }

    #[tokio::test]
    async fn test_long_text_assigns_window_provenance() {
        // 6 tokens, window 4 -> [0, 4), [2, 6); two candidates per window
        let generator = ScriptedGenerator::new(&[
            "<s><triplet> A <subj> B <obj> r</s>",
            "<s><triplet> A <subj> B <obj> r <subj> C <obj> s</s>",
            "<s><triplet> A <subj> B <obj> r</s>",
            "<s><triplet> D <subj> E <obj> t</s><pad>",
        ]);
        let extractor =
            Extractor::new(generator.clone(), Arc::new(WordTokenizer), small_config()).unwrap();

        let extraction = extractor.extract(&words(6), ExtractionMode::LongText).await.unwrap();
        let kb = &extraction.knowledge_base;

        assert_eq!(extraction.windows, vec![Span::new(0, 4), Span::new(2, 6)]);
        let keys: Vec<_> = kb.triplets().iter().map(|t| t.key()).collect();
        assert_eq!(keys, vec![("A", "r", "B"), ("A", "s", "C"), ("D", "t", "E")]);
        assert_eq!(kb.triplets()[0].provenance.spans(), &[Span::new(0, 4)]);
        assert_eq!(kb.triplets()[2].provenance.spans(), &[Span::new(2, 6)]);
        assert_eq!(extraction.stats.parsed, 5);
        assert_eq!(extraction.stats.inserted, 3);
        assert_eq!(extraction.stats.duplicates, 2);

        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen[0].0.len(), 2);
        assert_eq!(seen[0].1.max_length, 256);
    }

    #[tokio::test]
    async fn test_short_text_truncates_to_single_window() {
        let generator = ScriptedGenerator::new(&["<triplet> A <subj> B <obj> r", ""]);
        let extractor =
            Extractor::new(generator.clone(), Arc::new(WordTokenizer), small_config()).unwrap();

        let extraction = extractor.extract(&words(9), ExtractionMode::ShortText).await.unwrap();

        assert_eq!(extraction.windows, vec![Span::new(0, 5)]);
        assert_eq!(extraction.knowledge_base.len(), 1);
        let seen = generator.seen.lock().unwrap();
        assert_eq!(seen[0].0.input_ids, vec![vec![0, 1, 2, 3, 4]]);
        assert_eq!(seen[0].1.max_length, 216);
    }

    #[tokio::test]
    async fn test_wikipedia_mode_canonicalizes_and_merges() {
        let generator = ScriptedGenerator::new(&[
            "<triplet> NYC <subj> US <obj> country",
            "<triplet> Atlantis <subj> US <obj> country",
            "<triplet> New York <subj> US <obj> country",
            "",
        ]);
        let resolver = AliasResolver(
            [
                ("NYC", "New York City"),
                ("New York", "New York City"),
                ("US", "United States"),
            ]
            .into_iter()
            .collect(),
        );
        let extractor = Extractor::new(generator, Arc::new(WordTokenizer), small_config())
            .unwrap()
            .with_resolver(Arc::new(resolver));

        let extraction = extractor.extract(&words(6), ExtractionMode::Wikipedia).await.unwrap();
        let kb = &extraction.knowledge_base;

        assert_eq!(kb.len(), 1);
        assert_eq!(kb.triplets()[0].key(), ("New York City", "country", "United States"));
        assert_eq!(
            kb.triplets()[0].provenance.spans(),
            &[Span::new(0, 4), Span::new(2, 6)]
        );
        assert_eq!(extraction.stats.dropped, 1);
        assert_eq!(extraction.stats.merged, 1);
    }

    #[tokio::test]
    async fn test_wikipedia_mode_requires_resolver() {
        let extractor = Extractor::new(
            ScriptedGenerator::new(&[]),
            Arc::new(WordTokenizer),
            small_config(),
        )
        .unwrap();

        let result = extractor.extract("some text", ExtractionMode::Wikipedia).await;
        assert!(matches!(result, Err(RelkgError::Config(_))));
    }

    #[tokio::test]
    async fn test_empty_text_skips_generation() {
        let generator = ScriptedGenerator::new(&[]);
        let extractor =
            Extractor::new(generator.clone(), Arc::new(WordTokenizer), small_config()).unwrap();

        let extraction = extractor.extract("   ", ExtractionMode::LongText).await.unwrap();

        assert!(extraction.knowledge_base.is_empty());
        assert!(extraction.windows.is_empty());
        assert!(generator.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generator_failure_propagates() {
        let extractor =
            Extractor::new(Arc::new(FailingGenerator), Arc::new(WordTokenizer), small_config())
                .unwrap();

        let result = extractor.extract(&words(3), ExtractionMode::LongText).await;
        assert!(matches!(result, Err(RelkgError::Generation(_))));
    }

    #[tokio::test]
    async fn test_sequence_count_mismatch_is_an_error() {
        let generator = ScriptedGenerator::new(&["<triplet> A <subj> B <obj> r"]);
        let extractor =
            Extractor::new(generator, Arc::new(WordTokenizer), small_config()).unwrap();

        let result = extractor.extract(&words(3), ExtractionMode::LongText).await;
        assert!(matches!(result, Err(RelkgError::Generation(msg)) if msg.contains("expected 2")));
    }

    #[tokio::test]
    async fn test_garbage_output_yields_empty_graph() {
        let generator = ScriptedGenerator::new(&["no markers here", "<obj> <subj> <triplet>"]);
        let extractor =
            Extractor::new(generator, Arc::new(WordTokenizer), small_config()).unwrap();

        let extraction = extractor.extract(&words(3), ExtractionMode::LongText).await.unwrap();
        assert!(extraction.knowledge_base.is_empty());
        assert_eq!(extraction.stats.sequences, 2);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = ExtractionConfig {
            window_length: 0,
            ..Default::default()
        };
        let result = Extractor::new(
            Arc::new(FailingGenerator),
            Arc::new(WordTokenizer),
            config,
        );
        assert!(matches!(result, Err(RelkgError::Config(_))));
    }
}
