//! Knowledge store: in-memory chunks of résumé, website and document text,
//! searched by bag-of-words overlap.
//!
//! There is no index: every search scans every chunk. Résumé chunks are
//! boosted so questions about the person prefer the résumé over website copy.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use tracing::debug;

pub mod chunker;
pub mod loader;
pub mod terms;

pub use chunker::chunk_text;
use terms::{query_terms, term_set};

/// Multiplier applied to the overlap score of résumé chunks.
pub const RESUME_BOOST: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkSource {
    Resume,
    Website,
    Document,
    Profile,
}

impl ChunkSource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Resume => "resume",
            Self::Website => "website",
            Self::Document => "document",
            Self::Profile => "profile",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Chunk {
    pub source: ChunkSource,
    /// File name or URL the chunk came from.
    pub origin: String,
    pub text: String,
    terms: HashSet<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchHit {
    pub source: ChunkSource,
    pub origin: String,
    pub text: String,
    pub score: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct KnowledgeStats {
    pub total_chunks: usize,
    pub chunks_by_source: BTreeMap<&'static str, usize>,
    pub origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    chunks: Vec<Chunk>,
    chunk_size: usize,
    overlap: usize,
}

impl KnowledgeBase {
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunks: Vec::new(),
            chunk_size,
            overlap,
        }
    }

    /// Chunks `text` and appends the chunks. Returns how many were added.
    pub fn add_text(&mut self, source: ChunkSource, origin: &str, text: &str) -> usize {
        let before = self.chunks.len();
        for piece in chunk_text(text, self.chunk_size, self.overlap) {
            let terms = term_set(&piece);
            self.chunks.push(Chunk {
                source,
                origin: origin.to_string(),
                text: piece,
                terms,
            });
        }
        let added = self.chunks.len() - before;
        debug!("Indexed {added} {} chunks from {origin}", source.label());
        added
    }

    /// Drops every chunk of `source`, then indexes `text` under it.
    pub fn replace_source(&mut self, source: ChunkSource, origin: &str, text: &str) -> usize {
        self.remove_source(source);
        self.add_text(source, origin, text)
    }

    /// Drops the chunks previously indexed from `origin`, then indexes `text`
    /// under it. Chunks from other origins of the same source stay.
    pub fn replace_origin(&mut self, source: ChunkSource, origin: &str, text: &str) -> usize {
        self.chunks.retain(|c| !(c.source == source && c.origin == origin));
        self.add_text(source, origin, text)
    }

    pub fn remove_source(&mut self, source: ChunkSource) -> usize {
        let before = self.chunks.len();
        self.chunks.retain(|c| c.source != source);
        before - self.chunks.len()
    }

    /// Returns up to `top_k` chunks sharing at least one query term, best first.
    ///
    /// Score = distinct query terms found in the chunk, times `RESUME_BOOST` for
    /// résumé chunks. Equal scores keep insertion order.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<SearchHit> {
        let terms = query_terms(query);
        if terms.is_empty() || top_k == 0 {
            return Vec::new();
        }

        let mut scored: Vec<(f64, &Chunk)> = self
            .chunks
            .iter()
            .filter_map(|chunk| {
                let overlap = terms.iter().filter(|t| chunk.terms.contains(*t)).count();
                if overlap == 0 {
                    return None;
                }
                let boost = if chunk.source == ChunkSource::Resume {
                    RESUME_BOOST
                } else {
                    1.0
                };
                Some((overlap as f64 * boost, chunk))
            })
            .collect();

        // Stable sort keeps insertion order among ties.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        scored
            .into_iter()
            .take(top_k)
            .map(|(score, chunk)| SearchHit {
                source: chunk.source,
                origin: chunk.origin.clone(),
                text: chunk.text.clone(),
                score,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn has_source(&self, source: ChunkSource) -> bool {
        self.chunks.iter().any(|c| c.source == source)
    }

    pub fn stats(&self) -> KnowledgeStats {
        let mut stats = KnowledgeStats {
            total_chunks: self.chunks.len(),
            ..Default::default()
        };
        for chunk in &self.chunks {
            *stats.chunks_by_source.entry(chunk.source.label()).or_default() += 1;
            if !stats.origins.contains(&chunk.origin) {
                stats.origins.push(chunk.origin.clone());
            }
        }
        stats
    }
}
