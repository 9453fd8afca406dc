//! Compact bracket notation
//!
//! ```text
//! node  := leaf | '[' leaf (reln '>' node)* ']'
//! leaf  := WORD ['/' TAG] ['-' INDEX ['.' EMPTYINDEX]]
//! ```
//!
//! For example `[ate subj>Bill obj>[muffins compound>blueberry]]`. A leaf
//! carrying an explicit index suffix refers back to any earlier node with the
//! same `(index, empty index)`, so `[ate-1 dobj>Bill-1.1 nsubj>Bill-1.1]` has
//! two nodes and two edges.

use crate::edge::Edge;
use crate::graph::SemanticGraph;
use crate::node::{GraphNode, NodeKey};
use crate::relation::Relation;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

const EMPTY_GRAPH: &str = "[EMPTY_SEMANTIC_GRAPH]";
const UNROOTED_GRAPH: &str = "[UNROOTED_SEMANTIC_GRAPH]";

#[derive(Error, Debug)]
enum ParseError {
    #[error("expected {expected} at offset {offset}")]
    Expected { expected: &'static str, offset: usize },

    #[error("index out of range in {0:?}")]
    BadIndex(String),
}

type ParseResult<T> = std::result::Result<T, ParseError>;

fn is_punct(c: char) -> bool {
    matches!(c, '[' | ']' | '>')
}

/// Split `WORD-INDEX[.EMPTY]` into its parts; `None` when there is no
/// numeric suffix
fn split_index_suffix(label: &str) -> Option<(&str, &str, Option<&str>)> {
    let (word, suffix) = label.rsplit_once('-')?;
    let (index, empty) = match suffix.split_once('.') {
        Some((index, empty)) => (index, Some(empty)),
        None => (suffix, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if all_digits(index) && empty.map_or(true, all_digits) {
        Some((word, index, empty))
    } else {
        None
    }
}

struct CompactParser<'a> {
    input: &'a str,
    pos: usize,
    sent_index: u32,
    graph: SemanticGraph,
    indexes_used: BTreeMap<(u32, u32), NodeKey>,
    /// Indices taken under any empty index
    taken: BTreeSet<u32>,
    /// Every index below this one is taken
    free_from: u32,
}

impl<'a> CompactParser<'a> {
    fn new(input: &'a str, sent_index: u32) -> Self {
        Self {
            input,
            pos: 0,
            sent_index,
            graph: SemanticGraph::new(),
            indexes_used: BTreeMap::new(),
            taken: BTreeSet::new(),
            free_from: 0,
        }
    }

    fn parse(mut self) -> ParseResult<Option<SemanticGraph>> {
        self.skip_whitespace();
        if self.peek() != Some('[') {
            return Ok(None);
        }
        self.read_graph()?;
        Ok(Some(self.graph))
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
            self.pos += c.len_utf8();
        }
    }

    fn expect(&mut self, wanted: char, expected: &'static str) -> ParseResult<()> {
        self.skip_whitespace();
        match self.peek() {
            Some(c) if c == wanted => {
                self.pos += c.len_utf8();
                Ok(())
            }
            _ => Err(ParseError::Expected {
                expected,
                offset: self.pos,
            }),
        }
    }

    /// Next run of characters up to whitespace or punctuation
    fn read_name(&mut self) -> ParseResult<&'a str> {
        self.skip_whitespace();
        let start = self.pos;
        while let Some(c) = self.peek().filter(|c| !c.is_whitespace() && !is_punct(*c)) {
            self.pos += c.len_utf8();
        }
        if self.pos == start {
            return Err(ParseError::Expected {
                expected: "a word",
                offset: start,
            });
        }
        Ok(&self.input[start..self.pos])
    }

    /// Read the whole bracketed graph. Open brackets live on an explicit
    /// stack of governors, so nesting depth is bounded only by memory.
    fn read_graph(&mut self) -> ParseResult<()> {
        let mut open: Vec<NodeKey> = Vec::new();
        let mut attach_to: Option<(NodeKey, &'a str)> = None;

        loop {
            let (dep, bracketed) = self.read_dep()?;
            match attach_to {
                Some((gov, reln)) => {
                    self.graph
                        .add_edge(gov, dep, Relation::parse(reln), f64::NEG_INFINITY, false);
                }
                None => {
                    if let Some(node) = self.graph.node(&dep).cloned() {
                        self.graph.add_root(node);
                    }
                }
            }
            if bracketed {
                open.push(dep);
            }

            // Close finished brackets until the next `reln>` or the end
            attach_to = loop {
                let Some(&gov) = open.last() else {
                    return Ok(());
                };
                self.skip_whitespace();
                if matches!(self.peek(), Some(']') | None) {
                    self.expect(']', "']'")?;
                    open.pop();
                    continue;
                }
                let reln = self.read_name()?;
                self.skip_whitespace();
                if self.peek() == Some('>') {
                    self.pos += 1;
                }
                break Some((gov, reln));
            };
        }
    }

    /// One node, opening its bracket when present
    fn read_dep(&mut self) -> ParseResult<(NodeKey, bool)> {
        self.skip_whitespace();
        let bracketed = self.peek() == Some('[');
        if bracketed {
            self.expect('[', "'['")?;
        }
        let label = self.read_name()?;
        Ok((self.make_vertex(label)?, bracketed))
    }

    fn make_vertex(&mut self, label: &str) -> ParseResult<NodeKey> {
        let (word_and_tag, index, empty_index) = match split_index_suffix(label) {
            Some((word, index, empty)) => {
                let index = index.parse().map_err(|_| ParseError::BadIndex(label.to_string()))?;
                let empty = match empty {
                    Some(e) => e.parse().map_err(|_| ParseError::BadIndex(label.to_string()))?,
                    None => 0,
                };
                (word, index, empty)
            }
            None => (label, self.next_free_index(), 0),
        };

        if let Some(existing) = self.indexes_used.get(&(index, empty_index)) {
            return Ok(*existing);
        }

        let key = NodeKey::new(index)
            .with_empty_index(empty_index)
            .in_sentence(self.sent_index);
        let mut parts = word_and_tag.split('/');
        let mut node = GraphNode::new(key).with_word(parts.next().unwrap_or_default());
        if let Some(tag) = parts.next().filter(|t| !t.is_empty()) {
            node = node.with_tag(tag);
        }

        self.graph.add_vertex(node);
        self.indexes_used.insert((index, empty_index), key);
        self.taken.insert(index);
        Ok(key)
    }

    /// Smallest index not used under any empty index
    fn next_free_index(&mut self) -> u32 {
        while self.taken.contains(&self.free_from) {
            self.free_from += 1;
        }
        self.free_from
    }
}

impl SemanticGraph {
    /// Parse a graph in compact notation.
    ///
    /// Returns `None` if the text does not start with `[` or is malformed;
    /// malformed input is logged at warn level.
    pub fn from_compact(s: &str) -> Option<Self> {
        Self::parse_compact(s, 0)
    }

    /// Like [`Self::from_compact`], stamping every node with `sent_index`
    pub fn from_compact_in_sentence(s: &str, sent_index: u32) -> Option<Self> {
        Self::parse_compact(s, sent_index)
    }

    fn parse_compact(s: &str, sent_index: u32) -> Option<Self> {
        match CompactParser::new(s, sent_index).parse() {
            Ok(graph) => graph,
            Err(e) => {
                tracing::warn!("Could not parse compact graph {:?}: {}", s, e);
                None
            }
        }
    }

    /// Render in compact notation.
    ///
    /// Walks depth first from each root in turn. A vertex reached a second
    /// time is written as its bare word, dropping that occurrence's subtree.
    pub fn to_compact_string(&self, show_tags: bool) -> String {
        if self.roots().is_empty() {
            return if self.is_empty() { EMPTY_GRAPH } else { UNROOTED_GRAPH }.to_string();
        }

        let mut out = String::new();
        let mut used: BTreeSet<NodeKey> = BTreeSet::new();
        for root in self.roots() {
            self.write_compact(*root, show_tags, &mut used, &mut out);
        }
        out
    }

    fn write_compact(&self, start: NodeKey, show_tags: bool, used: &mut BTreeSet<NodeKey>, out: &mut String) {
        let mut stack: Vec<(Vec<&Edge>, usize, bool)> = Vec::new();
        stack.push(self.enter_compact(start, show_tags, used, out));

        while let Some((edges, next, bracketed)) = stack.last_mut() {
            let Some(edge) = edges.get(*next).copied() else {
                if *bracketed {
                    out.push(']');
                }
                stack.pop();
                continue;
            };
            *next += 1;

            out.push(' ');
            out.push_str(&edge.relation().to_string());
            out.push('>');
            let target = edge.target();
            if used.contains(&target) {
                out.push_str(&self.compact_label(&target, show_tags));
            } else {
                let frame = self.enter_compact(target, show_tags, used, out);
                stack.push(frame);
            }
        }
    }

    fn enter_compact<'g>(
        &'g self,
        node: NodeKey,
        show_tags: bool,
        used: &mut BTreeSet<NodeKey>,
        out: &mut String,
    ) -> (Vec<&'g Edge>, usize, bool) {
        used.insert(node);
        let bracketed = self.out_degree(&node) > 0;
        if bracketed {
            out.push('[');
        }
        out.push_str(&self.compact_label(&node, show_tags));
        (self.outgoing_edges_sorted(&node), 0, bracketed)
    }

    fn compact_label(&self, key: &NodeKey, show_tags: bool) -> String {
        match self.node(key) {
            Some(node) => node.label(show_tags),
            None => GraphNode::new(*key).label(show_tags),
        }
    }
}
