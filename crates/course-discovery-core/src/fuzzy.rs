//! Weighted multi-field approximate-match index.
//!
//! Each query is parsed with an extended syntax, matched field by field,
//! and reduced to a raw score in `[0, 1]` where `0` is a perfect match.
//!
//! # Query syntax
//!
//! Whitespace separates terms that must all match (AND); a standalone `|`
//! separates alternatives (OR). Double quotes keep a phrase together.
//!
//! | Token | Match |
//! |-------|-------|
//! | `jscript` | fuzzy (typo tolerant) |
//! | `=scheme` | field equals `scheme` |
//! | `'python` | field contains `python` |
//! | `^java` | field starts with `java` |
//! | `.js$` | field ends with `.js` |
//! | `!ruby` | field does not contain `ruby` |
//! | `!^java` | field does not start with `java` |
//! | `!.go$` | field does not end with `.go` |
//!
//! # Scoring
//!
//! A term scores `0` on an exact hit and `1 - normalized Damerau-Levenshtein
//! similarity` otherwise (best over the field's words, also comparing the
//! word prefix of the term's length). A field matches when every term of
//! some OR-group scores at most `threshold`; the field score is the mean
//! term score of the best group. The document score multiplies the matched
//! field scores, each raised to its normalized weight, so heavier fields
//! pull the score further towards `0`. Documents with no matched field are
//! excluded.

use strsim::normalized_damerau_levenshtein;

use crate::models::Course;

/// Maximum accepted per-field distance (0 exact, 1 no match).
pub const DEFAULT_THRESHOLD: f64 = 0.45;

/// Upper bound on candidates returned by one search.
pub const DEFAULT_CANDIDATE_LIMIT: usize = 1000;

/// Stand-in for a perfect field score so it does not zero the product.
const PERFECT: f64 = f64::EPSILON;

/// Searchable course fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Tags,
    ShortDescription,
    LongDescription,
    Category,
}

impl Field {
    fn values(self, course: &Course) -> Vec<&str> {
        match self {
            Field::Title => vec![course.title.as_str()],
            Field::Tags => course.tags.iter().map(String::as_str).collect(),
            Field::ShortDescription => vec![course.short_description.as_str()],
            Field::LongDescription => vec![course.long_description.as_str()],
            Field::Category => vec![course.category.as_str()],
        }
    }
}

/// Field weights used by the course index.
pub fn default_weights() -> Vec<(Field, f64)> {
    vec![
        (Field::Title, 0.45),
        (Field::Tags, 0.25),
        (Field::ShortDescription, 0.15),
        (Field::LongDescription, 0.10),
        (Field::Category, 0.05),
    ]
}

#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub weights: Vec<(Field, f64)>,
    pub threshold: f64,
    pub limit: usize,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            weights: default_weights(),
            threshold: DEFAULT_THRESHOLD,
            limit: DEFAULT_CANDIDATE_LIMIT,
        }
    }
}

/// A surviving candidate: position in the indexed slice plus raw score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub index: usize,
    pub score: f64,
}

#[derive(Debug)]
struct FieldValue {
    text: String,
    words: Vec<String>,
}

impl FieldValue {
    fn new(raw: &str) -> Self {
        let text = raw.to_lowercase();
        let words = split_words(&text);
        Self { text, words }
    }
}

#[derive(Debug)]
struct IndexedField {
    weight: f64,
    values: Vec<FieldValue>,
}

/// In-memory index over a slice of courses, built per request.
#[derive(Debug)]
pub struct FuzzyIndex {
    docs: Vec<Vec<IndexedField>>,
    threshold: f64,
    limit: usize,
}

impl FuzzyIndex {
    pub fn build(courses: &[Course], options: &IndexOptions) -> Self {
        let total_weight: f64 = options.weights.iter().map(|(_, w)| w.max(0.0)).sum();
        let norm = if total_weight > 0.0 { total_weight } else { 1.0 };

        let docs = courses
            .iter()
            .map(|course| {
                options
                    .weights
                    .iter()
                    .map(|(field, weight)| IndexedField {
                        weight: weight.max(0.0) / norm,
                        values: field
                            .values(course)
                            .into_iter()
                            .filter(|v| !v.trim().is_empty())
                            .map(FieldValue::new)
                            .collect(),
                    })
                    .collect()
            })
            .collect();

        Self {
            docs,
            threshold: options.threshold,
            limit: options.limit,
        }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Matches sorted by ascending raw score (ties keep index order),
    /// truncated to the candidate limit.
    pub fn search(&self, query: &str) -> Vec<Match> {
        let parsed = Query::parse(query);
        if parsed.is_empty() {
            return Vec::new();
        }

        let mut matches: Vec<Match> = self
            .docs
            .iter()
            .enumerate()
            .filter_map(|(index, fields)| {
                self.score_document(&parsed, fields)
                    .map(|score| Match { index, score })
            })
            .collect();

        matches.sort_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(self.limit);
        matches
    }

    fn score_document(&self, query: &Query, fields: &[IndexedField]) -> Option<f64> {
        let mut total = 1.0;
        let mut matched = false;

        for field in fields {
            let best = field
                .values
                .iter()
                .filter_map(|value| query.score(value, self.threshold))
                .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.min(s))));

            if let Some(score) = best {
                matched = true;
                total *= score.max(PERFECT).powf(field.weight);
            }
        }

        matched.then(|| total.clamp(0.0, 1.0))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum TermKind {
    Fuzzy,
    Exact,
    Include,
    Prefix,
    Suffix,
    InverseInclude,
    InversePrefix,
    InverseSuffix,
}

#[derive(Debug, Clone, PartialEq)]
struct Term {
    kind: TermKind,
    text: String,
}

impl Term {
    fn parse(token: &str) -> Option<Term> {
        let (kind, body) = if let Some(rest) = token.strip_prefix("!^") {
            (TermKind::InversePrefix, rest)
        } else if let Some(rest) = token.strip_prefix('!') {
            match rest.strip_suffix('$') {
                Some(inner) => (TermKind::InverseSuffix, inner),
                None => (TermKind::InverseInclude, rest),
            }
        } else if let Some(rest) = token.strip_prefix('^') {
            (TermKind::Prefix, rest)
        } else if let Some(rest) = token.strip_prefix('=') {
            (TermKind::Exact, rest)
        } else if let Some(rest) = token.strip_prefix('\'') {
            (TermKind::Include, rest)
        } else if let Some(rest) = token.strip_suffix('$') {
            (TermKind::Suffix, rest)
        } else {
            (TermKind::Fuzzy, token)
        };

        let text = body.trim_matches('"').trim().to_lowercase();
        if text.is_empty() {
            return None;
        }
        Some(Term { kind, text })
    }

    fn score(&self, value: &FieldValue) -> f64 {
        let hit = |ok: bool| if ok { 0.0 } else { 1.0 };
        let text = value.text.as_str();
        let t = self.text.as_str();

        match self.kind {
            TermKind::Exact => hit(text == t),
            TermKind::Include => hit(text.contains(t)),
            TermKind::Prefix => hit(text.starts_with(t)),
            TermKind::Suffix => hit(text.ends_with(t)),
            TermKind::InverseInclude => hit(!text.contains(t)),
            TermKind::InversePrefix => hit(!text.starts_with(t)),
            TermKind::InverseSuffix => hit(!text.ends_with(t)),
            TermKind::Fuzzy => fuzzy_score(t, value),
        }
    }
}

/// OR of AND-groups.
#[derive(Debug, Clone, PartialEq)]
struct Query {
    groups: Vec<Vec<Term>>,
}

impl Query {
    fn parse(input: &str) -> Query {
        let mut groups = Vec::new();
        let mut current = Vec::new();

        for token in tokenize(input) {
            if token == "|" {
                if !current.is_empty() {
                    groups.push(std::mem::take(&mut current));
                }
                continue;
            }
            if let Some(term) = Term::parse(&token) {
                current.push(term);
            }
        }
        if !current.is_empty() {
            groups.push(current);
        }

        Query { groups }
    }

    fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Best group score for one field value, if any group matches.
    fn score(&self, value: &FieldValue, threshold: f64) -> Option<f64> {
        self.groups
            .iter()
            .filter_map(|group| {
                let mut sum = 0.0;
                for term in group {
                    let s = term.score(value);
                    if s > threshold {
                        return None;
                    }
                    sum += s;
                }
                Some(sum / group.len() as f64)
            })
            .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.min(s))))
    }
}

/// Split on whitespace, keeping double-quoted phrases (and any prefix
/// operator glued to them) as single tokens.
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in input.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn split_words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(String::from)
        .collect()
}

fn distance(a: &str, b: &str) -> f64 {
    1.0 - normalized_damerau_levenshtein(a, b)
}

/// Distance of one term word to the closest word of the field, comparing
/// both the whole word and its prefix of the term's length.
fn word_score(term: &str, words: &[String]) -> f64 {
    let term_len = term.chars().count();
    words
        .iter()
        .map(|word| {
            let full = distance(term, word);
            if word.chars().count() > term_len {
                let prefix: String = word.chars().take(term_len).collect();
                full.min(distance(term, &prefix))
            } else {
                full
            }
        })
        .fold(1.0, f64::min)
}

fn fuzzy_score(term: &str, value: &FieldValue) -> f64 {
    if value.text.contains(term) {
        return 0.0;
    }
    let term_words = split_words(term);
    if term_words.is_empty() {
        return 1.0;
    }
    let sum: f64 = term_words
        .iter()
        .map(|w| word_score(w, &value.words))
        .sum();
    sum / term_words.len() as f64
}
