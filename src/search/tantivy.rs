//! Ephemeral tantivy index over flattened catalog documents.
//!
//! Every resolve call builds its own [`EphemeralIndex`] in RAM and drops it
//! when the call returns, so concurrent queries never share index state and
//! nothing is left on disk.

use std::collections::BTreeSet;

use tantivy::collector::{DocSetCollector, TopDocs};
use tantivy::query::{AllQuery, BooleanQuery, Occur, Query, QueryParser, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, STORED, Schema, TEXT, Term, Value};
use tantivy::{DocAddress, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, doc};
use tracing::trace;

use crate::error::ResolveError;
use crate::model::types::{Document, FieldTag};
use crate::search::canonicalize::fold_case;

/// Indexing heap for the single writer thread.
const WRITER_HEAP_BYTES: usize = 50_000_000;

#[derive(Clone, Copy)]
pub struct Fields {
    pub owner_id: Field,
    pub sequence_no: Field,
    pub field_tag: Field,
    pub content: Field,
}

/// One ranked document hit.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    pub score: f32,
    pub owner_id: i64,
    pub sequence_no: u64,
    pub field_tag: FieldTag,
}

pub struct EphemeralIndex {
    index: Index,
    reader: IndexReader,
    fields: Fields,
    num_docs: usize,
}

impl EphemeralIndex {
    /// Build a fresh in-memory index. Documents are added by one writer
    /// thread in sequence order and committed once.
    pub fn build(docs: &[Document]) -> Result<Self, ResolveError> {
        let schema = build_schema();
        let fields = fields_from_schema(&schema)?;
        let index = Index::create_in_ram(schema);

        let mut writer: IndexWriter = index.writer_with_num_threads(1, WRITER_HEAP_BYTES)?;
        for d in docs {
            writer.add_document(doc! {
                fields.owner_id => d.owner_id,
                fields.sequence_no => d.sequence_no,
                fields.field_tag => d.field_tag.as_str(),
                fields.content => d.content.clone(),
            })?;
        }
        writer.commit()?;
        drop(writer);

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        trace!(docs = docs.len(), "ephemeral_index_built");
        Ok(Self {
            index,
            reader,
            fields,
            num_docs: docs.len(),
        })
    }

    pub fn num_docs(&self) -> usize {
        self.num_docs
    }

    /// Parse `query` as a disjunction over `content` ("match any token").
    /// Each whitespace token is escaped first, so free text never reaches
    /// the grammar as operators, field prefixes or ranges.
    pub fn parse_disjunction(&self, query: &str) -> Result<Box<dyn Query>, ResolveError> {
        // QueryParser defaults to OR between terms.
        let parser = QueryParser::for_index(&self.index, vec![self.fields.content]);
        parser
            .parse_query(&escape_query_text(query))
            .map_err(|e| ResolveError::MalformedQuery(e.to_string()))
    }

    /// Indexed `content` terms that start with the first `prefix_len`
    /// characters of `term` and are within `max_distance` edits of it.
    pub fn expand_fuzzy_terms(
        &self,
        term: &str,
        max_distance: usize,
        prefix_len: usize,
    ) -> Result<BTreeSet<String>, ResolveError> {
        let prefix: String = term.chars().take(prefix_len).collect();
        let searcher = self.reader.searcher();
        let mut found = BTreeSet::new();

        for segment in searcher.segment_readers() {
            let inverted = segment.inverted_index(self.fields.content)?;
            let mut stream = inverted.terms().range().ge(prefix.as_bytes()).into_stream()?;
            while stream.advance() {
                let key = stream.key();
                if !key.starts_with(prefix.as_bytes()) {
                    break;
                }
                let Ok(candidate) = std::str::from_utf8(key) else {
                    continue;
                };
                if strsim::levenshtein(candidate, term) <= max_distance {
                    found.insert(candidate.to_string());
                }
            }
        }
        Ok(found)
    }

    /// Disjunction of exact term queries over `content`; `None` when there
    /// are no terms to look for.
    pub fn terms_query<'a, I>(&self, terms: I) -> Option<Box<dyn Query>>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let clauses: Vec<(Occur, Box<dyn Query>)> = terms
            .into_iter()
            .map(|t| {
                (
                    Occur::Should,
                    Box::new(TermQuery::new(
                        Term::from_field_text(self.fields.content, t),
                        IndexRecordOption::WithFreqs,
                    )) as Box<dyn Query>,
                )
            })
            .collect();
        if clauses.is_empty() {
            None
        } else {
            Some(Box::new(BooleanQuery::new(clauses)))
        }
    }

    /// Run `query` and return every hit, best score first, ties broken by
    /// ascending sequence number.
    pub fn search_ranked(&self, query: &dyn Query) -> Result<Vec<IndexHit>, ResolveError> {
        let searcher = self.reader.searcher();
        let collector = TopDocs::with_limit(self.num_docs.max(1)).order_by_score();
        let top_docs = searcher.search(query, &collector)?;
        let mut hits = Vec::with_capacity(top_docs.len());
        for (score, addr) in top_docs {
            hits.push(self.load_hit(&searcher, addr, score)?);
        }
        sort_hits(&mut hits);
        Ok(hits)
    }

    /// Documents whose stored content contains `needle` verbatim. All hits
    /// score 1.0, so sequence order decides.
    pub fn scan_substring(
        &self,
        needle: &str,
        case_sensitive: bool,
    ) -> Result<Vec<IndexHit>, ResolveError> {
        let searcher = self.reader.searcher();
        let needle = if case_sensitive {
            needle.to_string()
        } else {
            fold_case(needle)
        };

        let addrs = searcher.search(&AllQuery, &DocSetCollector)?;
        let mut hits = Vec::new();
        for addr in addrs {
            let doc: TantivyDocument = searcher.doc(addr)?;
            let content = doc
                .get_first(self.fields.content)
                .and_then(|v| v.as_str())
                .unwrap_or("");
            let contains = if case_sensitive {
                content.contains(needle.as_str())
            } else {
                fold_case(content).contains(needle.as_str())
            };
            if contains {
                hits.push(self.hit_from_doc(&doc, 1.0)?);
            }
        }
        sort_hits(&mut hits);
        Ok(hits)
    }

    fn load_hit(
        &self,
        searcher: &tantivy::Searcher,
        addr: DocAddress,
        score: f32,
    ) -> Result<IndexHit, ResolveError> {
        let doc: TantivyDocument = searcher.doc(addr)?;
        self.hit_from_doc(&doc, score)
    }

    fn hit_from_doc(&self, doc: &TantivyDocument, score: f32) -> Result<IndexHit, ResolveError> {
        let owner_id = doc
            .get_first(self.fields.owner_id)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| ResolveError::IndexBuild("stored document missing owner_id".into()))?;
        let sequence_no = doc
            .get_first(self.fields.sequence_no)
            .and_then(|v| v.as_u64())
            .ok_or_else(|| ResolveError::IndexBuild("stored document missing sequence_no".into()))?;
        let field_tag = doc
            .get_first(self.fields.field_tag)
            .and_then(|v| v.as_str())
            .ok_or_else(|| ResolveError::IndexBuild("stored document missing field_tag".into()))?
            .parse::<FieldTag>()
            .map_err(ResolveError::IndexBuild)?;
        Ok(IndexHit {
            score,
            owner_id,
            sequence_no,
            field_tag,
        })
    }
}

/// Rewrite free text as whitespace-separated plain words for the query
/// grammar: every non-alphanumeric character is backslash-escaped and the
/// bare operator words are prefixed with a backslash.
pub fn escape_query_text(query: &str) -> String {
    query
        .split_whitespace()
        .map(escape_token)
        .collect::<Vec<_>>()
        .join(" ")
}

fn escape_token(token: &str) -> String {
    if matches!(token, "AND" | "OR" | "NOT" | "IN") {
        return format!("\\{token}");
    }
    let mut escaped = String::with_capacity(token.len() * 2);
    for c in token.chars() {
        if !c.is_alphanumeric() && c != '_' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn sort_hits(hits: &mut [IndexHit]) {
    hits.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.sequence_no.cmp(&b.sequence_no))
    });
}

pub fn build_schema() -> Schema {
    let mut schema_builder = Schema::builder();
    schema_builder.add_i64_field("owner_id", STORED);
    schema_builder.add_u64_field("sequence_no", STORED);
    schema_builder.add_text_field("field_tag", STORED);
    schema_builder.add_text_field("content", TEXT | STORED);
    schema_builder.build()
}

pub fn fields_from_schema(schema: &Schema) -> Result<Fields, ResolveError> {
    let field = |name: &str| {
        schema
            .get_field(name)
            .map_err(|_| ResolveError::IndexBuild(format!("schema missing {name}")))
    };
    Ok(Fields {
        owner_id: field("owner_id")?,
        sequence_no: field("sequence_no")?,
        field_tag: field("field_tag")?,
        content: field("content")?,
    })
}
