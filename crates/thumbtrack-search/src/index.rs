//! Index store adapter: the Tantivy-backed searchable projection of pins
//!
//! Every public operation absorbs index failures: writes log and return,
//! reads log and return an empty result. Callers never branch on an index
//! error, and a failure never changes `IndexHealth`.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tantivy::aggregation::agg_req::Aggregations;
use tantivy::aggregation::agg_result::AggregationResults;
use tantivy::aggregation::AggregationCollector;
use tantivy::collector::{Count, TopDocs};
use tantivy::directory::MmapDirectory;
use tantivy::query::{AllQuery, BooleanQuery, BoostQuery, Occur, Query, TermQuery};
use tantivy::schema::IndexRecordOption;
use tantivy::tokenizer::TextAnalyzer;
use tantivy::{
    DocAddress, DocId, Index, IndexReader, IndexWriter, ReloadPolicy, Score, Searcher,
    SegmentReader, TantivyDocument, TantivyError, Term,
};
use thumbtrack_core::{
    PageRequest, Pagination, PinId, ScoredDocument, SearchDocument, SearchResult, TagCount,
};
use tracing::{debug, info, warn};

use crate::error::{Result, SearchError};
use crate::health::IndexHealth;
use crate::schema::{
    analyze, build_schema, from_index_document, register_analyzers, search_analyzer,
    to_index_document, PinFields, INDEX_NAME, MAX_GRAM, MIN_GRAM,
};

/// Field boosts for free-text search
pub const TITLE_BOOST: f32 = 3.0;
pub const TAGS_BOOST: f32 = 2.0;
pub const DESCRIPTION_BOOST: f32 = 1.0;
pub const USERNAME_BOOST: f32 = 1.0;

/// Upper bound on index hits examined for suggestions
pub const SUGGEST_MAX_EXPANSIONS: usize = 50;

const WRITER_HEAP_BYTES: usize = 50_000_000;

/// Where the index lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexLocation {
    /// Volatile, process-local index
    InMemory,
    /// Root directory; the index is kept in its `pins` subdirectory
    Directory(PathBuf),
}

/// Ordering key: relevance first, then recency
type RankKey = (Score, i64);

/// The live index, present only when the startup probe succeeded
struct IndexInner {
    fields: PinFields,
    writer: Mutex<IndexWriter>,
    reader: IndexReader,
    query_analyzer: TextAnalyzer,
    #[cfg(test)]
    faulted: std::sync::atomic::AtomicBool,
}

impl IndexInner {
    fn open(location: &IndexLocation) -> Result<Self> {
        let (schema, fields) = build_schema();

        let index = match location {
            IndexLocation::InMemory => Index::create_in_ram(schema),
            IndexLocation::Directory(root) => {
                let path = root.join(INDEX_NAME);
                std::fs::create_dir_all(&path)?;
                let directory = MmapDirectory::open(&path).map_err(TantivyError::from)?;
                Index::open_or_create(directory, schema)?
            }
        };
        register_analyzers(&index);

        let writer: IndexWriter = index.writer(WRITER_HEAP_BYTES)?;
        let reader: IndexReader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        Ok(Self {
            fields,
            writer: Mutex::new(writer),
            reader,
            query_analyzer: search_analyzer(),
            #[cfg(test)]
            faulted: std::sync::atomic::AtomicBool::new(false),
        })
    }

    /// Apply deletes and upserts in one commit, then make them visible to readers
    fn write(&self, upserts: &[SearchDocument], deletes: &[PinId]) -> Result<()> {
        self.check_fault()?;
        {
            let mut writer = self
                .writer
                .lock()
                .map_err(|_| SearchError::Task("index writer lock poisoned".to_string()))?;

            for id in deletes {
                writer.delete_term(self.id_term(id));
            }
            for doc in upserts {
                writer.delete_term(self.id_term(&doc.id));
                writer.add_document(to_index_document(&self.fields, doc))?;
            }
            writer.commit()?;
        }
        self.reader.reload()?;
        Ok(())
    }

    fn searcher(&self) -> Result<Searcher> {
        self.check_fault()?;
        Ok(self.reader.searcher())
    }

    #[cfg(test)]
    fn check_fault(&self) -> Result<()> {
        if self.faulted.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(SearchError::Query("index fault".to_string()));
        }
        Ok(())
    }

    #[cfg(not(test))]
    fn check_fault(&self) -> Result<()> {
        Ok(())
    }

    fn id_term(&self, id: &PinId) -> Term {
        Term::from_field_text(self.fields.id, &id.to_string())
    }

    /// OR of the analyzed terms of `text` against one analyzed field
    fn match_query(&self, field: tantivy::schema::Field, text: &str, boost: f32) -> Option<Box<dyn Query>> {
        let clauses: Vec<(Occur, Box<dyn Query>)> = analyze(&self.query_analyzer, text)
            .into_iter()
            .map(|term| {
                let query: Box<dyn Query> = Box::new(TermQuery::new(
                    Term::from_field_text(field, &term),
                    IndexRecordOption::WithFreqs,
                ));
                (Occur::Should, query)
            })
            .collect();
        if clauses.is_empty() {
            return None;
        }
        Some(Box::new(BoostQuery::new(Box::new(BooleanQuery::new(clauses)), boost)))
    }

    /// AND of the analyzed terms of `text` against one edge n-gram field: every
    /// query word must prefix some indexed word
    ///
    /// Words shorter than the smallest gram have no indexed term and are left
    /// to the caller's substring check. Longer words are cut to the largest gram.
    fn prefix_query(&self, field: tantivy::schema::Field, text: &str) -> Option<Box<dyn Query>> {
        let clauses: Vec<(Occur, Box<dyn Query>)> = analyze(&self.query_analyzer, text)
            .into_iter()
            .filter(|term| term.chars().count() >= MIN_GRAM)
            .map(|term| {
                let gram: String = term.chars().take(MAX_GRAM).collect();
                let query: Box<dyn Query> = Box::new(TermQuery::new(
                    Term::from_field_text(field, &gram),
                    IndexRecordOption::WithFreqs,
                ));
                (Occur::Must, query)
            })
            .collect();
        (!clauses.is_empty()).then(|| Box::new(BooleanQuery::new(clauses)) as Box<dyn Query>)
    }

    fn raw_term_query(&self, field: tantivy::schema::Field, value: &str) -> Box<dyn Query> {
        Box::new(TermQuery::new(
            Term::from_field_text(field, value),
            IndexRecordOption::Basic,
        ))
    }

    /// Free-text clause across title, description, tags and username
    fn text_query(&self, text: &str) -> Box<dyn Query> {
        let f = self.fields;
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = [
            self.match_query(f.title, text, TITLE_BOOST),
            self.match_query(f.description, text, DESCRIPTION_BOOST),
            self.match_query(f.tags, text, TAGS_BOOST),
        ]
        .into_iter()
        .flatten()
        .map(|q| (Occur::Should, q))
        .collect();

        let username: Box<dyn Query> = Box::new(BoostQuery::new(
            self.raw_term_query(f.author_username, text.trim()),
            USERNAME_BOOST,
        ));
        clauses.push((Occur::Should, username));

        Box::new(BooleanQuery::new(clauses))
    }

    /// Exact tag intersection clause
    fn tags_query(&self, tags: &[String]) -> Box<dyn Query> {
        let clauses = tags
            .iter()
            .map(|tag| (Occur::Should, self.raw_term_query(self.fields.tags_keyword, tag)))
            .collect();
        Box::new(BooleanQuery::new(clauses))
    }

    /// Run `query` and return one page ordered by `RankKey`, plus the total match count
    ///
    /// With `ranked == false` relevance is ignored and only recency orders hits.
    fn ranked_page(
        &self,
        searcher: &Searcher,
        query: &dyn Query,
        offset: usize,
        limit: usize,
        ranked: bool,
    ) -> Result<(Vec<(RankKey, DocAddress)>, usize)> {
        let collector = TopDocs::with_limit(limit.max(1))
            .and_offset(offset)
            .tweak_score(move |segment: &SegmentReader| {
                let created = segment.fast_fields().i64("created_at").ok();
                move |doc: DocId, score: Score| -> RankKey {
                    let ts = created
                        .as_ref()
                        .and_then(|column| column.first(doc))
                        .unwrap_or(i64::MIN);
                    (if ranked { score } else { 0.0 }, ts)
                }
            });
        Ok(searcher.search(query, &(collector, Count))?)
    }

    fn load(&self, searcher: &Searcher, address: DocAddress) -> Result<SearchDocument> {
        let stored: TantivyDocument = searcher.doc(address)?;
        from_index_document(&self.fields, &stored)
    }

    fn search(&self, text: &str, tags: &[String], page: PageRequest) -> Result<SearchResult<ScoredDocument>> {
        let text = text.trim();
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        if !text.is_empty() {
            clauses.push((Occur::Must, self.text_query(text)));
        }
        if !tags.is_empty() {
            clauses.push((Occur::Must, self.tags_query(tags)));
        }
        let query: Box<dyn Query> = if clauses.is_empty() {
            Box::new(AllQuery)
        } else {
            Box::new(BooleanQuery::new(clauses))
        };

        let searcher = self.searcher()?;
        let (hits, total) = self.ranked_page(
            &searcher,
            query.as_ref(),
            page.offset(),
            page.limit as usize,
            !text.is_empty(),
        )?;

        let pins = hits
            .into_iter()
            .map(|((score, _), address)| {
                Ok(ScoredDocument {
                    document: self.load(&searcher, address)?,
                    score,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(SearchResult {
            pins,
            pagination: Pagination::new(page, total as u64),
        })
    }

    fn suggest(&self, text: &str, limit: usize) -> Result<Vec<String>> {
        let f = self.fields;
        let clauses: Vec<(Occur, Box<dyn Query>)> =
            [self.prefix_query(f.title, text), self.prefix_query(f.tags, text)]
                .into_iter()
                .flatten()
                .map(|q| (Occur::Should, q))
                .collect();
        if clauses.is_empty() {
            return Ok(Vec::new());
        }

        let searcher = self.searcher()?;
        let hits = searcher.search(
            &BooleanQuery::new(clauses),
            &TopDocs::with_limit(SUGGEST_MAX_EXPANSIONS),
        )?;

        let needle = text.to_lowercase();
        let mut seen = HashSet::new();
        let mut suggestions = Vec::new();
        for (_, address) in hits {
            let doc = self.load(&searcher, address)?;
            let candidates = std::iter::once(doc.title).chain(doc.tags);
            for candidate in candidates {
                if candidate.to_lowercase().contains(&needle) && seen.insert(candidate.clone()) {
                    suggestions.push(candidate);
                }
            }
        }
        suggestions.truncate(limit);
        Ok(suggestions)
    }

    fn popular_tags(&self, limit: usize) -> Result<Vec<TagCount>> {
        let request: Aggregations = serde_json::from_value(serde_json::json!({
            "popular_tags": { "terms": { "field": "tags_keyword", "size": limit.max(1) } }
        }))
        .map_err(|e| SearchError::Query(e.to_string()))?;

        let collector = AggregationCollector::from_aggs(request, Default::default());
        let results: AggregationResults = self.searcher()?.search(&AllQuery, &collector)?;
        let value = serde_json::to_value(results).map_err(|e| SearchError::Query(e.to_string()))?;

        let mut tags: Vec<TagCount> = value["popular_tags"]["buckets"]
            .as_array()
            .map(|buckets| {
                buckets
                    .iter()
                    .filter_map(|bucket| {
                        Some(TagCount {
                            tag: bucket["key"].as_str()?.to_string(),
                            count: bucket["doc_count"].as_u64()?,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        tags.sort_by(|a, b| b.count.cmp(&a.count));
        tags.truncate(limit);
        Ok(tags)
    }

    fn recommend(
        &self,
        affinities: &[(String, f64)],
        exclude: &HashSet<PinId>,
        size: usize,
    ) -> Result<Vec<PinId>> {
        let mut clauses: Vec<(Occur, Box<dyn Query>)> = affinities
            .iter()
            .filter_map(|(tag, weight)| self.match_query(self.fields.tags, tag, *weight as f32))
            .map(|q| (Occur::Should, q))
            .collect();
        if clauses.is_empty() {
            return Ok(Vec::new());
        }
        for id in exclude {
            let term: Box<dyn Query> = self.raw_term_query(self.fields.id, &id.to_string());
            clauses.push((Occur::MustNot, term));
        }

        let searcher = self.searcher()?;
        let (hits, _) = self.ranked_page(&searcher, &BooleanQuery::new(clauses), 0, size, true)?;
        hits.into_iter()
            .map(|(_, address)| self.load(&searcher, address).map(|doc| doc.id))
            .collect()
    }
}

/// Adapter over the inverted index holding one `SearchDocument` per pin
///
/// Cheap to clone; clones share the same index and health flag.
#[derive(Clone)]
pub struct IndexStore {
    health: Arc<IndexHealth>,
    inner: Option<Arc<IndexInner>>,
}

impl IndexStore {
    /// Probe the index backend and record the outcome in `health`
    ///
    /// Opens (or creates) the `pins` index with its analyzers. Any failure
    /// leaves the index unavailable; this never fails process startup.
    pub async fn initialize(location: IndexLocation, health: Arc<IndexHealth>) -> Self {
        let probe = {
            let location = location.clone();
            tokio::task::spawn_blocking(move || IndexInner::open(&location)).await
        };

        let inner = match probe {
            Ok(Ok(inner)) => {
                info!("Search index available at {:?}", location);
                Some(Arc::new(inner))
            }
            Ok(Err(e)) => {
                warn!("Search index unavailable, using database fallback: {}", e);
                None
            }
            Err(e) => {
                warn!("Search index probe did not complete, using database fallback: {}", e);
                None
            }
        };

        health.set_available(inner.is_some());
        Self { health, inner }
    }

    /// An adapter for a process whose index is known to be down
    pub fn unavailable(health: Arc<IndexHealth>) -> Self {
        health.set_available(false);
        Self {
            health,
            inner: None,
        }
    }

    /// The shared availability flag
    pub fn health(&self) -> &Arc<IndexHealth> {
        &self.health
    }

    pub fn is_available(&self) -> bool {
        self.health.is_available() && self.inner.is_some()
    }

    /// Run blocking index work off the async executor
    async fn run<T, F>(&self, op: F) -> Option<Result<T>>
    where
        T: Send + 'static,
        F: FnOnce(&IndexInner) -> Result<T> + Send + 'static,
    {
        if !self.health.is_available() {
            return None;
        }
        let inner = Arc::clone(self.inner.as_ref()?);
        let joined = tokio::task::spawn_blocking(move || op(inner.as_ref())).await;
        Some(joined.unwrap_or_else(|e| Err(SearchError::Task(e.to_string()))))
    }

    /// Upsert one document
    pub async fn index_document(&self, doc: SearchDocument) {
        let id = doc.id;
        match self.run(move |inner| inner.write(&[doc], &[])).await {
            Some(Ok(())) => debug!("Indexed pin {}", id),
            Some(Err(e)) => warn!("Failed to index pin {}: {}", id, e),
            None => {}
        }
    }

    /// Upsert many documents in one commit
    pub async fn bulk_index(&self, docs: Vec<SearchDocument>) {
        if docs.is_empty() {
            return;
        }
        let count = docs.len();
        match self.run(move |inner| inner.write(&docs, &[])).await {
            Some(Ok(())) => debug!("Bulk indexed {} pins", count),
            Some(Err(e)) => warn!("Failed to bulk index {} pins: {}", count, e),
            None => {}
        }
    }

    /// Delete one document by pin id
    pub async fn remove_document(&self, id: PinId) {
        if let Some(Err(e)) = self.run(move |inner| inner.write(&[], &[id])).await {
            warn!("Failed to remove pin {} from index: {}", id, e);
        }
    }

    /// Ranked free-text and tag search
    ///
    /// With text: OR across title (x3), tags (x2), description and username,
    /// at least one must match, sorted by score then recency. Tags add an
    /// exact-match intersection filter. Without text hits are newest first.
    pub async fn search(
        &self,
        text: &str,
        tags: &[String],
        page: PageRequest,
    ) -> SearchResult<ScoredDocument> {
        let text = text.to_string();
        let tags = tags.to_vec();
        match self.run(move |inner| inner.search(&text, &tags, page)).await {
            Some(Ok(result)) => result,
            Some(Err(e)) => {
                warn!("Index search failed: {}", e);
                SearchResult::empty(page)
            }
            None => SearchResult::empty(page),
        }
    }

    /// Distinct titles and tags containing `text`, in order of first match
    pub async fn suggest(&self, text: &str, limit: usize) -> Vec<String> {
        let text = text.to_string();
        match self.run(move |inner| inner.suggest(&text, limit)).await {
            Some(Ok(suggestions)) => suggestions,
            Some(Err(e)) => {
                warn!("Index suggestions failed: {}", e);
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Most used tags, by number of pins, descending
    pub async fn popular_tags(&self, limit: usize) -> Vec<TagCount> {
        match self.run(move |inner| inner.popular_tags(limit)).await {
            Some(Ok(tags)) => tags,
            Some(Err(e)) => {
                warn!("Index tag aggregation failed: {}", e);
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Ids of pins matching any of the weighted tags, excluding `exclude`,
    /// ordered by weighted relevance then recency
    pub async fn recommend(
        &self,
        affinities: Vec<(String, f64)>,
        exclude: HashSet<PinId>,
        size: usize,
    ) -> Vec<PinId> {
        match self
            .run(move |inner| inner.recommend(&affinities, &exclude, size))
            .await
        {
            Some(Ok(ids)) => ids,
            Some(Err(e)) => {
                warn!("Index recommendation query failed: {}", e);
                Vec::new()
            }
            None => Vec::new(),
        }
    }
}
