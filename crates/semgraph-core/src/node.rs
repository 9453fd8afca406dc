//! Graph node (vertex) types

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Printed in place of an unset or empty word
pub const MISSING_WORD: &str = "_";

/// Positional identity of a word node.
///
/// Two nodes denote the same vertex iff their keys are equal. The derived
/// ordering is lexicographic over `(sent_index, index, empty_index, copy_count)`
/// and is the natural order used for every sorted listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct NodeKey {
    pub sent_index: u32,
    pub index: u32,
    #[serde(default)]
    pub empty_index: u32,
    #[serde(default)]
    pub copy_count: u32,
}

impl NodeKey {
    /// Key for the word at `index` of sentence 0
    pub fn new(index: u32) -> Self {
        Self {
            index,
            ..Default::default()
        }
    }

    pub fn in_sentence(mut self, sent_index: u32) -> Self {
        self.sent_index = sent_index;
        self
    }

    pub fn with_empty_index(mut self, empty_index: u32) -> Self {
        self.empty_index = empty_index;
        self
    }

    pub fn with_copy_count(mut self, copy_count: u32) -> Self {
        self.copy_count = copy_count;
        self
    }
}

impl std::fmt::Display for NodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.sent_index, self.index)?;
        if self.empty_index != 0 {
            write!(f, ".{}", self.empty_index)?;
        }
        for _ in 0..self.copy_count {
            write!(f, "'")?;
        }
        Ok(())
    }
}

/// A word node in a semantic graph.
///
/// Equality, hashing and ordering only look at the [`NodeKey`]; the display
/// attributes can be edited freely without changing which vertex this is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphNode {
    pub key: NodeKey,

    /// Surface text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lemma: Option<String>,

    /// Part-of-speech tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

impl GraphNode {
    /// Create a node with no display attributes
    pub fn new(key: NodeKey) -> Self {
        Self {
            key,
            word: None,
            lemma: None,
            tag: None,
        }
    }

    /// Create a node for `word` at `index` of sentence 0
    pub fn indexed(word: impl Into<String>, index: u32) -> Self {
        Self::new(NodeKey::new(index)).with_word(word)
    }

    pub fn with_word(mut self, word: impl Into<String>) -> Self {
        self.word = Some(word.into());
        self
    }

    pub fn with_lemma(mut self, lemma: impl Into<String>) -> Self {
        self.lemma = Some(lemma.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn index(&self) -> u32 {
        self.key.index
    }

    pub fn sent_index(&self) -> u32 {
        self.key.sent_index
    }

    pub fn empty_index(&self) -> u32 {
        self.key.empty_index
    }

    pub fn copy_count(&self) -> u32 {
        self.key.copy_count
    }

    /// Surface text, or the empty string when unset
    pub fn word(&self) -> &str {
        self.word.as_deref().unwrap_or("")
    }

    pub fn lemma(&self) -> Option<&str> {
        self.lemma.as_deref()
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// `word` or `word/tag`. A node without a word prints as
    /// [`MISSING_WORD`] so the compact form still parses.
    pub fn label(&self, show_tags: bool) -> String {
        let mut label = self.display_word().to_string();
        if show_tags {
            label.push('/');
            label.push_str(self.tag().unwrap_or(""));
        }
        label
    }

    /// `word-index`, with `.empty` and one `'` per copy when present
    pub fn to_index_string(&self) -> String {
        let mut out = format!("{}-{}", self.display_word(), self.key.index);
        if self.key.empty_index != 0 {
            out.push_str(&format!(".{}", self.key.empty_index));
        }
        for _ in 0..self.key.copy_count {
            out.push('\'');
        }
        out
    }
}

impl GraphNode {
    fn display_word(&self) -> &str {
        match self.word.as_deref() {
            Some(word) if !word.is_empty() => word,
            _ => MISSING_WORD,
        }
    }
}

impl From<NodeKey> for GraphNode {
    fn from(key: NodeKey) -> Self {
        Self::new(key)
    }
}

impl PartialEq for GraphNode {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for GraphNode {}

impl Hash for GraphNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for GraphNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GraphNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}
