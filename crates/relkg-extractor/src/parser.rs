//! Decoding of linearized relation-extraction output
//!
//! The generator emits a flat token stream such as
//! `<triplet> Paris <subj> France <obj> capital of`, where marker tokens
//! switch which field subsequent words belong to. One head may be followed
//! by any number of `(tail, type)` pairs that share it.
//!
//! Parsing is total: malformed streams yield fewer triplets, never an error.

use relkg_core::{MarkerConfig, Triplet};

/// Sentinel tokens removed before parsing
pub const SENTINEL_TOKENS: [&str; 3] = ["<s>", "<pad>", "</s>"];

/// A classified token from the decoded stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Head,
    Tail,
    Relation,
    Word(&'a str),
}

/// Accumulator currently receiving word tokens
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Target {
    #[default]
    None,
    Head,
    Tail,
    Relation,
}

/// Parser state between tokens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserState {
    head: String,
    tail: String,
    relation: String,
    target: Target,
}

impl ParserState {
    /// Apply one token, returning the next state and any completed triplet
    pub fn step(mut self, token: Token<'_>) -> (Self, Option<Triplet>) {
        match token {
            Token::Head => {
                let emitted = self.pending_triplet();
                if emitted.is_some() {
                    self.relation.clear();
                }
                self.head.clear();
                self.target = Target::Head;
                (self, emitted)
            }
            Token::Tail => {
                // The relation is kept: it may be followed by another tail.
                let emitted = self.pending_triplet();
                self.tail.clear();
                self.target = Target::Tail;
                (self, emitted)
            }
            Token::Relation => {
                self.relation.clear();
                self.target = Target::Relation;
                (self, None)
            }
            Token::Word(word) => {
                if let Some(buffer) = self.active_buffer() {
                    buffer.push(' ');
                    buffer.push_str(word);
                }
                (self, None)
            }
        }
    }

    /// Flush the final triplet at end of stream
    pub fn finish(self) -> Option<Triplet> {
        if self.head.is_empty() || self.relation.is_empty() || self.tail.is_empty() {
            return None;
        }
        self.pending_triplet()
    }

    pub fn target(&self) -> Target {
        self.target
    }

    fn pending_triplet(&self) -> Option<Triplet> {
        if self.relation.is_empty() {
            return None;
        }
        Some(Triplet::new(
            self.head.trim(),
            self.relation.trim(),
            self.tail.trim(),
        ))
    }

    fn active_buffer(&mut self) -> Option<&mut String> {
        match self.target {
            Target::None => None,
            Target::Head => Some(&mut self.head),
            Target::Tail => Some(&mut self.tail),
            Target::Relation => Some(&mut self.relation),
        }
    }
}

/// Parser for decoded generator output
#[derive(Debug, Clone, Default)]
pub struct TripletParser {
    markers: MarkerConfig,
}

impl TripletParser {
    /// Create a parser with the default `<triplet>`/`<subj>`/`<obj>` markers
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with custom marker tokens
    pub fn with_markers(markers: MarkerConfig) -> Self {
        Self { markers }
    }

    pub fn markers(&self) -> &MarkerConfig {
        &self.markers
    }

    /// Classify a whitespace-separated token
    pub fn classify<'a>(&self, token: &'a str) -> Token<'a> {
        if token == self.markers.head {
            Token::Head
        } else if token == self.markers.tail {
            Token::Tail
        } else if token == self.markers.relation {
            Token::Relation
        } else {
            Token::Word(token)
        }
    }

    /// Parse one decoded sequence, stripping sentinel tokens first
    pub fn parse(&self, decoded: &str) -> Vec<Triplet> {
        let cleaned = strip_sentinels(decoded);
        self.parse_tokens(cleaned.split_whitespace())
    }

    /// Parse an already cleaned token sequence
    pub fn parse_tokens<'a, I>(&self, tokens: I) -> Vec<Triplet>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut triplets = Vec::new();
        let mut state = ParserState::default();

        for token in tokens {
            let (next, emitted) = state.step(self.classify(token));
            triplets.extend(emitted);
            state = next;
        }
        triplets.extend(state.finish());

        triplets
    }
}

/// Remove sentinel tokens from a decoded sequence
pub fn strip_sentinels(decoded: &str) -> String {
    SENTINEL_TOKENS
        .iter()
        .fold(decoded.trim().to_string(), |text, sentinel| {
            text.replace(sentinel, "")
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(triplets: &[Triplet]) -> Vec<(&str, &str, &str)> {
        triplets.iter().map(Triplet::key).collect()
    }

    #[test]
    fn test_parse_shared_head_and_new_head() {
        let parser = TripletParser::new();
        let triplets = parser.parse(
            "<triplet> Paris <subj> France <obj> capital of <subj> Europe <obj> located in \
             <triplet> France <subj> Europe <obj> part of",
        );

        assert_eq!(
            keys(&triplets),
            vec![
                ("Paris", "capital of", "France"),
                ("Paris", "located in", "Europe"),
                ("France", "part of", "Europe"),
            ]
        );
    }

    #[test]
    fn test_parse_strips_sentinels() {
        let parser = TripletParser::new();
        let triplets = parser.parse(
            "<s><triplet> Punta Cana <subj> Dominican Republic <obj> country</s><pad><pad>",
        );

        assert_eq!(
            keys(&triplets),
            vec![("Punta Cana", "country", "Dominican Republic")]
        );
    }

    #[test]
    fn test_parse_without_markers_is_empty() {
        let parser = TripletParser::new();
        assert!(parser.parse("just some words without structure").is_empty());
        assert!(parser.parse("").is_empty());
        assert!(parser.parse("<s></s>").is_empty());
    }

    #[test]
    fn test_trailing_incomplete_relation_is_dropped() {
        let parser = TripletParser::new();
        let triplets = parser.parse("<triplet> Paris <subj> France <obj>");
        assert!(triplets.is_empty());

        let triplets = parser.parse("<triplet> Paris <subj> France <obj> capital of <triplet>");
        assert_eq!(keys(&triplets), vec![("Paris", "capital of", "France")]);
    }

    #[test]
    fn test_tail_marker_flushes_pending_relation() {
        let parser = TripletParser::new();
        // Emitted on the tail marker with an empty tail; the empty tail then
        // blocks the end-of-stream flush.
        let triplets = parser.parse("<triplet> Paris <obj> capital of <subj>");
        assert_eq!(keys(&triplets), vec![("Paris", "capital of", "")]);
    }

    #[test]
    fn test_relation_kept_across_tail_marker() {
        let mut state = ParserState::default();
        for token in [Token::Head, Token::Word("A"), Token::Tail, Token::Word("B")] {
            state = state.step(token).0;
        }
        let (state, emitted) = state.step(Token::Relation);
        assert!(emitted.is_none());
        let state = state.step(Token::Word("r")).0;

        let (state, emitted) = state.step(Token::Tail);
        assert_eq!(emitted.map(|t| t.to_string()), Some("(A, r, B)".to_string()));
        assert_eq!(state.target(), Target::Tail);

        // Relation survives, so a new tail completes a second triplet.
        let state = state.step(Token::Word("C")).0;
        assert_eq!(state.finish().map(|t| t.to_string()), Some("(A, r, C)".to_string()));
    }

    #[test]
    fn test_words_before_any_marker_are_ignored() {
        let parser = TripletParser::new();
        let triplets = parser.parse("noise <triplet> A <subj> B <obj> r");
        assert_eq!(keys(&triplets), vec![("A", "r", "B")]);
    }

    #[test]
    fn test_custom_markers() {
        let parser = TripletParser::with_markers(MarkerConfig {
            head: "[H]".to_string(),
            tail: "[T]".to_string(),
            relation: "[R]".to_string(),
        });
        let triplets = parser.parse("[H] Rust [T] Mozilla [R] developer");
        assert_eq!(keys(&triplets), vec![("Rust", "developer", "Mozilla")]);
        assert!(parser.parse("<triplet> A <subj> B <obj> r").is_empty());
    }

    #[test]
    fn test_strip_sentinels() {
        assert_eq!(strip_sentinels("  <s>a b</s><pad> "), "a b");
    }
}
