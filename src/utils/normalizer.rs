/// Characters removed by [`clean_text`].
pub const STRIPPED_PUNCTUATION: [char; 7] = ['–', ',', '.', ';', ':', '!', '?'];

/// Characters that terminate a sentence in [`split_sentences`].
pub const SENTENCE_TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Normalize a text for term statistics.
///
/// - drops every character of [`STRIPPED_PUNCTUATION`]
/// - turns `\n`, `\r` and `\t` into a space
/// - collapses runs of spaces into a single space
/// - lower-cases the result
///
/// Leading and trailing single spaces survive. The function is idempotent:
/// `clean_text(&clean_text(x)) == clean_text(x)`.
///
/// # Examples
/// ```
/// use tf_idf_essay::utils::normalizer::clean_text;
/// assert_eq!(clean_text("Hello,  World!\nBye."), "hello world bye");
/// ```
pub fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if STRIPPED_PUNCTUATION.contains(&c) {
            continue;
        }
        let c = match c {
            '\n' | '\r' | '\t' => ' ',
            other => other,
        };
        if c == ' ' {
            if !out.ends_with(' ') {
                out.push(' ');
            }
            continue;
        }
        out.extend(c.to_lowercase());
    }
    out
}

/// Split a normalized text into terms.
///
/// Empty tokens (from a leading or trailing space) are dropped, so
/// `split_words(&clean_text(x)) == split_words(x)`.
pub fn split_words(text: &str) -> Vec<String> {
    clean_text(text)
        .split(' ')
        .filter(|word| !word.is_empty())
        .map(String::from)
        .collect()
}

/// `true` when the text yields at least one term.
#[inline]
pub fn has_words(text: &str) -> bool {
    clean_text(text).split(' ').any(|word| !word.is_empty())
}

/// Split a text into sentences on any of `.`, `!`, `?`.
///
/// Sentences keep their surrounding whitespace and are returned verbatim.
/// Pieces without a single term (`"a..b"` yields an empty piece between the
/// dots) are dropped here, so every later stage sees the same sentence list.
pub fn split_sentences(text: &str) -> Vec<&str> {
    text.split(SENTENCE_TERMINATORS)
        .filter(|sentence| has_words(sentence))
        .collect()
}

/// A sentence with its position inside the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment<'a> {
    /// verbatim sentence text
    pub text: &'a str,
    /// index among the sentences of the document
    pub ordinal: usize,
    /// index of the paragraph the sentence starts in
    pub paragraph: usize,
    /// index among the sentences of that paragraph
    pub paragraph_ordinal: usize,
}

/// Positioned sentences of one document.
#[derive(Debug, Clone, Default)]
pub struct Segmentation<'a> {
    pub segments: Vec<Segment<'a>>,
    /// sentence count of every paragraph, indexed by `Segment::paragraph`
    pub paragraph_sizes: Vec<usize>,
}

impl<'a> Segmentation<'a> {
    /// Split a document into positioned sentences.
    ///
    /// The sentence list is exactly [`split_sentences`]; a paragraph is a run
    /// of text separated from the next one by a blank line.
    pub fn new(document: &'a str) -> Self {
        let breaks = paragraph_breaks(document);

        let mut segments = Vec::new();
        let mut paragraph_sizes: Vec<usize> = Vec::new();
        let mut last_raw_paragraph: Option<usize> = None;

        let mut start = 0usize;
        let mut pieces = Vec::new();
        for (idx, c) in document.char_indices() {
            if SENTENCE_TERMINATORS.contains(&c) {
                pieces.push((start, &document[start..idx]));
                start = idx + c.len_utf8();
            }
        }
        pieces.push((start, &document[start..]));

        for (offset, text) in pieces {
            if !has_words(text) {
                continue;
            }
            let anchor = offset + (text.len() - text.trim_start().len());
            let raw_paragraph = breaks.iter().take_while(|&&b| b < anchor).count();
            if last_raw_paragraph != Some(raw_paragraph) {
                paragraph_sizes.push(0);
                last_raw_paragraph = Some(raw_paragraph);
            }
            let paragraph = paragraph_sizes.len() - 1;
            let paragraph_ordinal = paragraph_sizes[paragraph];
            paragraph_sizes[paragraph] += 1;

            segments.push(Segment {
                text,
                ordinal: segments.len(),
                paragraph,
                paragraph_ordinal,
            });
        }

        Self { segments, paragraph_sizes }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Sentence count of the paragraph a segment belongs to.
    #[inline]
    pub fn paragraph_len(&self, segment: &Segment<'_>) -> usize {
        self.paragraph_sizes.get(segment.paragraph).copied().unwrap_or(0)
    }
}

/// Byte offsets of the blank lines that separate paragraphs.
/// A run of blank lines counts once.
fn paragraph_breaks(document: &str) -> Vec<usize> {
    let mut breaks = Vec::new();
    let mut offset = 0usize;
    let mut previous_blank = false;
    for line in document.split_inclusive('\n') {
        let blank = line.trim().is_empty();
        if blank && !previous_blank && offset > 0 {
            breaks.push(offset);
        }
        previous_blank = blank;
        offset += line.len();
    }
    breaks
}
