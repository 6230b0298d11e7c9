//! Tantivy schema and analyzers for the `pins` index
//!
//! Text fields are indexed as per-word edge n-grams so a query word matches
//! every indexed word it is a prefix of. Queries are analyzed without n-grams
//! to avoid matching on fragments of the query itself.

use chrono::DateTime;
use tantivy::schema::{
    Field, IndexRecordOption, Schema, SchemaBuilder, TextFieldIndexing, TextOptions, Value, FAST,
    INDEXED, STORED, STRING,
};
use tantivy::tokenizer::{
    AsciiFoldingFilter, LowerCaser, SimpleTokenizer, TextAnalyzer, Token, TokenStream, Tokenizer,
};
use tantivy::{Index, TantivyDocument};
use thumbtrack_core::{PinId, SearchDocument, UserId};

use crate::error::{Result, SearchError};

/// Name of the single index holding pin projections
pub const INDEX_NAME: &str = "pins";

/// Indexing-time analyzer: words, edge n-grams, lowercase, ASCII folding
pub const INDEX_ANALYZER: &str = "pin_ngram";

/// Search-time analyzer: words, lowercase, ASCII folding
pub const SEARCH_ANALYZER: &str = "pin_search";

/// Shortest edge n-gram emitted at index time
pub const MIN_GRAM: usize = 2;

/// Longest edge n-gram emitted at index time
pub const MAX_GRAM: usize = 20;

/// Field handles for the `pins` index
#[derive(Debug, Clone, Copy)]
pub struct PinFields {
    /// Pin id (raw string, the upsert/delete key)
    pub id: Field,
    pub title: Field,
    pub description: Field,
    /// Tags, analyzed for free-text matching
    pub tags: Field,
    /// Tags, raw, for exact filtering and aggregation
    pub tags_keyword: Field,
    pub image_url: Field,
    pub author_id: Field,
    /// Author username, raw (matched as a whole)
    pub author_username: Field,
    /// Milliseconds since epoch (fast, sort key)
    pub created_at: Field,
}

/// Build the schema and return its field handles
pub fn build_schema() -> (Schema, PinFields) {
    let mut builder = SchemaBuilder::new();

    let ngram_text = TextOptions::default()
        .set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(INDEX_ANALYZER)
                .set_index_option(IndexRecordOption::WithFreqsAndPositions),
        )
        .set_stored();

    let fields = PinFields {
        id: builder.add_text_field("id", STRING | STORED),
        title: builder.add_text_field("title", ngram_text.clone()),
        description: builder.add_text_field("description", ngram_text.clone()),
        tags: builder.add_text_field("tags", ngram_text),
        tags_keyword: builder.add_text_field("tags_keyword", STRING | FAST),
        image_url: builder.add_text_field("image_url", STORED),
        author_id: builder.add_text_field("author_id", STRING | STORED),
        author_username: builder.add_text_field("author_username", STRING | STORED),
        created_at: builder.add_i64_field("created_at", INDEXED | STORED | FAST),
    };

    (builder.build(), fields)
}

/// Register both analyzers with an index
///
/// Must run after opening or creating the index and before any read or write.
pub fn register_analyzers(index: &Index) {
    index.tokenizers().register(INDEX_ANALYZER, index_analyzer());
    index.tokenizers().register(SEARCH_ANALYZER, search_analyzer());
}

pub fn index_analyzer() -> TextAnalyzer {
    TextAnalyzer::builder(EdgeNgramTokenizer::new(MIN_GRAM, MAX_GRAM))
        .filter(LowerCaser)
        .filter(AsciiFoldingFilter)
        .build()
}

pub fn search_analyzer() -> TextAnalyzer {
    TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(LowerCaser)
        .filter(AsciiFoldingFilter)
        .build()
}

/// Run `text` through an analyzer and collect the token texts
pub fn analyze(analyzer: &TextAnalyzer, text: &str) -> Vec<String> {
    let mut analyzer = analyzer.clone();
    let mut stream = analyzer.token_stream(text);
    let mut terms = Vec::new();
    while stream.advance() {
        terms.push(stream.token().text.clone());
    }
    terms
}

/// Splits text into alphanumeric words and emits the leading
/// `min_gram..=max_gram` characters of each word, all at the word's position
///
/// Words shorter than `min_gram` produce no tokens.
#[derive(Debug, Clone)]
pub struct EdgeNgramTokenizer {
    min_gram: usize,
    max_gram: usize,
}

impl EdgeNgramTokenizer {
    pub fn new(min_gram: usize, max_gram: usize) -> Self {
        Self {
            min_gram: min_gram.max(1),
            max_gram: max_gram.max(min_gram.max(1)),
        }
    }

    fn grams(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut position = 0;

        for (start, word) in words(text) {
            // byte offset at the end of each char of the word
            let ends: Vec<usize> = word
                .char_indices()
                .map(|(i, c)| i + c.len_utf8())
                .collect();
            for n in self.min_gram..=self.max_gram.min(ends.len()) {
                let end = ends[n - 1];
                tokens.push(Token {
                    offset_from: start,
                    offset_to: start + end,
                    position,
                    text: word[..end].to_string(),
                    position_length: 1,
                });
            }
            position += 1;
        }
        tokens
    }
}

/// Alphanumeric runs of `text` with their byte offsets
fn words(text: &str) -> Vec<(usize, &str)> {
    let mut words = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        match (c.is_alphanumeric(), start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                words.push((s, &text[s..i]));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        words.push((s, &text[s..]));
    }
    words
}

impl Tokenizer for EdgeNgramTokenizer {
    type TokenStream<'a> = EdgeNgramTokenStream;

    fn token_stream<'a>(&'a mut self, text: &'a str) -> Self::TokenStream<'a> {
        EdgeNgramTokenStream {
            tokens: self.grams(text),
            cursor: None,
        }
    }
}

pub struct EdgeNgramTokenStream {
    tokens: Vec<Token>,
    cursor: Option<usize>,
}

impl TokenStream for EdgeNgramTokenStream {
    fn advance(&mut self) -> bool {
        let next = self.cursor.map_or(0, |c| c + 1);
        self.cursor = Some(next);
        next < self.tokens.len()
    }

    fn token(&self) -> &Token {
        &self.tokens[self.cursor.unwrap_or(0)]
    }

    fn token_mut(&mut self) -> &mut Token {
        &mut self.tokens[self.cursor.unwrap_or(0)]
    }
}

/// Convert a projection into an index document
pub fn to_index_document(fields: &PinFields, doc: &SearchDocument) -> TantivyDocument {
    let mut out = TantivyDocument::default();
    out.add_text(fields.id, doc.id.to_string());
    out.add_text(fields.title, &doc.title);
    if let Some(description) = &doc.description {
        out.add_text(fields.description, description);
    }
    for tag in &doc.tags {
        out.add_text(fields.tags, tag);
        out.add_text(fields.tags_keyword, tag);
    }
    out.add_text(fields.image_url, &doc.image_url);
    out.add_text(fields.author_id, doc.author_user_id.to_string());
    out.add_text(fields.author_username, &doc.author_username);
    out.add_i64(fields.created_at, doc.created_at.timestamp_millis());
    out
}

/// Read a projection back from a stored index document
pub fn from_index_document(fields: &PinFields, stored: &TantivyDocument) -> Result<SearchDocument> {
    let text = |field: Field| -> Option<String> {
        stored
            .get_first(field)
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };
    let missing = |name: &str| SearchError::Query(format!("stored document has no {}", name));

    let id = text(fields.id).ok_or_else(|| missing("id"))?;
    let author_id = text(fields.author_id).ok_or_else(|| missing("author_id"))?;
    let millis = stored
        .get_first(fields.created_at)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| missing("created_at"))?;

    Ok(SearchDocument {
        id: PinId::parse(&id).map_err(|e| SearchError::Query(e.to_string()))?,
        title: text(fields.title).unwrap_or_default(),
        description: text(fields.description),
        image_url: text(fields.image_url).unwrap_or_default(),
        tags: stored
            .get_all(fields.tags)
            .filter_map(|v| v.as_str())
            .map(str::to_string)
            .collect(),
        author_user_id: UserId::parse(&author_id).map_err(|e| SearchError::Query(e.to_string()))?,
        author_username: text(fields.author_username).unwrap_or_default(),
        created_at: DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| SearchError::Query(format!("bad timestamp {}", millis)))?,
    })
}
