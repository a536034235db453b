use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::EssayError;
use crate::essay::term::TermFrequency;
use crate::utils::normalizer::clean_text;

/// One raw text of the corpus together with its normalized form and term counts.
#[derive(Debug, Clone)]
pub struct Document {
    raw: String,
    cleaned: String,
    terms: TermFrequency,
}

impl Document {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let cleaned = clean_text(&raw);
        let terms = TermFrequency::from_text(&cleaned);
        Self { raw, cleaned, terms }
    }

    /// Text as submitted
    #[inline]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// `clean_text(raw)`
    #[inline]
    pub fn cleaned(&self) -> &str {
        &self.cleaned
    }

    /// Term counts of the whole document
    #[inline]
    pub fn terms(&self) -> &TermFrequency {
        &self.terms
    }
}

/// An uploaded file before decoding.
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self { name: name.into(), bytes: bytes.into() }
    }
}

/// Ordered collection of the documents submitted together in one request.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    /// Build a corpus from already decoded texts, keeping their order.
    pub fn new<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let documents = texts.into_iter().map(Document::new).collect();
        Self { documents }
    }

    /// Decode uploads as UTF-8.
    ///
    /// A file that fails to decode is excluded from the corpus and returned
    /// as a per-file error; the rest of the batch goes on.
    pub fn from_uploads(uploads: Vec<Upload>) -> (Self, Vec<EssayError>) {
        let mut documents = Vec::with_capacity(uploads.len());
        let mut rejected = Vec::new();
        for Upload { name, bytes } in uploads {
            match String::from_utf8(bytes) {
                Ok(text) => documents.push(Document::new(text)),
                Err(source) => {
                    warn!(upload = %name, "Rejecting upload: not valid UTF-8");
                    rejected.push(EssayError::Decode { name, source });
                }
            }
        }
        debug!(documents = documents.len(), rejected = rejected.len(), "Corpus decoded");
        (Self { documents }, rejected)
    }

    /// Append a document
    pub fn push(&mut self, text: impl Into<String>) -> &mut Self {
        self.documents.push(Document::new(text));
        self
    }

    /// Number of documents (`|Corpus|`)
    #[inline]
    pub fn doc_num(&self) -> usize {
        self.documents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    #[inline]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Document frequency with the default substring rule.
    pub fn document_frequency(&self, term: &str) -> usize {
        SubstringFrequency.document_frequency(self, term)
    }
}

/// Number of documents that contain a term.
///
/// The scorer only depends on this capability, so the counting rule can be
/// swapped without touching it.
pub trait DocumentFrequency: Send + Sync {
    /// # Returns
    /// * `usize` - in `[0, corpus.doc_num()]`; 0 for an empty term
    fn document_frequency(&self, corpus: &Corpus, term: &str) -> usize;
}

/// Counts documents whose normalized text contains the term as a substring.
///
/// Over-counts terms that are part of longer words (`"cat"` in `"concatenate"`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringFrequency;

impl DocumentFrequency for SubstringFrequency {
    fn document_frequency(&self, corpus: &Corpus, term: &str) -> usize {
        if term.is_empty() {
            return 0;
        }
        corpus
            .documents
            .iter()
            .filter(|doc| doc.cleaned().contains(term))
            .count()
    }
}

/// Counts documents whose term list contains the term exactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenMembership;

impl DocumentFrequency for TokenMembership {
    fn document_frequency(&self, corpus: &Corpus, term: &str) -> usize {
        if term.is_empty() {
            return 0;
        }
        corpus
            .documents
            .iter()
            .filter(|doc| doc.terms().contains_term(term))
            .count()
    }
}

/// Configurable choice of [`DocumentFrequency`] rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFrequencyKind {
    /// [`SubstringFrequency`]
    #[default]
    Substring,
    /// [`TokenMembership`]
    Token,
}

impl DocumentFrequency for DocumentFrequencyKind {
    fn document_frequency(&self, corpus: &Corpus, term: &str) -> usize {
        match self {
            DocumentFrequencyKind::Substring => SubstringFrequency.document_frequency(corpus, term),
            DocumentFrequencyKind::Token => TokenMembership.document_frequency(corpus, term),
        }
    }
}
