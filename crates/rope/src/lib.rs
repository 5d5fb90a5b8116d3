//! A balanced text rope supporting O(log n) insert/erase/replace while
//! tracking byte, codepoint and line-break counts per subtree.
//!
//! Two node kinds, a leaf holding raw UTF-8 bytes and an inner node
//! holding child subtree statistics alongside child pointers, as a
//! plain sum type (`RopeNode`) boxed where needed rather than a
//! tagged pointer.

use std::borrow::Cow;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Leaves hold at most this many bytes before splitting.
pub const LEAF_CAPACITY: usize = 1024;
/// Inner nodes hold at most this many children before splitting.
pub const INNER_FANOUT: usize = 32;

/// Aggregate statistics maintained at every rope node.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TextStats {
    pub text_bytes: usize,
    pub utf8_codepoints: usize,
    pub line_breaks: usize,
}

impl TextStats {
    pub fn of(bytes: &[u8]) -> Self {
        TextStats {
            text_bytes: bytes.len(),
            utf8_codepoints: count_codepoints(bytes),
            line_breaks: count_line_breaks(bytes),
        }
    }
}

impl Add for TextStats {
    type Output = TextStats;
    fn add(self, rhs: TextStats) -> TextStats {
        TextStats {
            text_bytes: self.text_bytes + rhs.text_bytes,
            utf8_codepoints: self.utf8_codepoints + rhs.utf8_codepoints,
            line_breaks: self.line_breaks + rhs.line_breaks,
        }
    }
}

impl AddAssign for TextStats {
    fn add_assign(&mut self, rhs: TextStats) {
        *self = *self + rhs;
    }
}

impl Sub for TextStats {
    type Output = TextStats;
    fn sub(self, rhs: TextStats) -> TextStats {
        TextStats {
            text_bytes: self.text_bytes - rhs.text_bytes,
            utf8_codepoints: self.utf8_codepoints - rhs.utf8_codepoints,
            line_breaks: self.line_breaks - rhs.line_breaks,
        }
    }
}

impl SubAssign for TextStats {
    fn sub_assign(&mut self, rhs: TextStats) {
        *self = *self - rhs;
    }
}

impl Sum for TextStats {
    fn sum<I: Iterator<Item = TextStats>>(iter: I) -> Self {
        iter.fold(TextStats::default(), Add::add)
    }
}

fn count_codepoints(bytes: &[u8]) -> usize {
    bytes.iter().filter(|&&b| (b & 0xC0) != 0x80).count()
}

fn count_line_breaks(bytes: &[u8]) -> usize {
    let mut n = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                n += 1;
                i += 1;
            }
            b'\r' => {
                n += 1;
                i += if bytes.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
            }
            _ => i += 1,
        }
    }
    n
}

/// A byte position is a valid split point iff it isn't a UTF-8
/// continuation byte and doesn't fall inside a CRLF pair.
fn is_valid_split(bytes: &[u8], pos: usize) -> bool {
    if pos > 0 && pos < bytes.len() && (bytes[pos] & 0xC0) == 0x80 {
        return false;
    }
    if pos > 0 && pos < bytes.len() && bytes[pos - 1] == b'\r' && bytes[pos] == b'\n' {
        return false;
    }
    true
}

/// Finds the split point nearest `target`, searching outward. Returns
/// `0` or `bytes.len()` if no interior boundary exists (a single huge
/// codepoint spans the whole buffer) — callers must treat that as "no
/// split possible" and let the leaf exceed its target capacity.
fn find_split_point(bytes: &[u8], target: usize) -> usize {
    let target = target.min(bytes.len());
    for delta in 0..=bytes.len() {
        let right = target + delta;
        if right <= bytes.len() && is_valid_split(bytes, right) {
            return right;
        }
        if delta <= target {
            let left = target - delta;
            if is_valid_split(bytes, left) {
                return left;
            }
        }
    }
    bytes.len()
}

/// Largest prefix length of `s`, at most `max_bytes`, that lands on a
/// char boundary.
fn chunk_boundary(s: &str, max_bytes: usize) -> usize {
    if s.len() <= max_bytes {
        return s.len();
    }
    let mut k = max_bytes;
    while !s.is_char_boundary(k) {
        k -= 1;
    }
    k
}

fn char_to_byte(bytes: &[u8], char_idx: usize) -> usize {
    if char_idx == 0 {
        return 0;
    }
    std::str::from_utf8(bytes)
        .expect("rope leaf must hold valid utf8")
        .char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(bytes.len())
}

#[derive(Debug, Clone)]
struct LeafNode {
    bytes: Vec<u8>,
}

impl LeafNode {
    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.bytes).expect("rope leaf must hold valid utf8")
    }
}

#[derive(Debug, Clone)]
struct InnerNode {
    children: Vec<(TextStats, Box<RopeNode>)>,
}

#[derive(Debug, Clone)]
enum RopeNode {
    Leaf(LeafNode),
    Inner(InnerNode),
}

fn compute_stats(node: &RopeNode) -> TextStats {
    match node {
        RopeNode::Leaf(leaf) => TextStats::of(&leaf.bytes),
        RopeNode::Inner(inner) => inner.children.iter().map(|(s, _)| *s).sum(),
    }
}

/// Result of inserting into a subtree: `Some` carries a new right
/// sibling (with its own stats) that the caller must splice in after
/// the node that was inserted into.
type Overflow = Option<(TextStats, Box<RopeNode>)>;

fn insert_into(node: &mut RopeNode, char_idx: usize, text: &str) -> Overflow {
    match node {
        RopeNode::Leaf(leaf) => {
            let byte_idx = char_to_byte(&leaf.bytes, char_idx);
            leaf.bytes.splice(byte_idx..byte_idx, text.bytes());
            if leaf.bytes.len() <= LEAF_CAPACITY {
                return None;
            }
            let split_at = find_split_point(&leaf.bytes, leaf.bytes.len() / 2);
            if split_at == 0 || split_at == leaf.bytes.len() {
                // No interior boundary; let this leaf exceed capacity.
                return None;
            }
            let right_bytes = leaf.bytes.split_off(split_at);
            let right = RopeNode::Leaf(LeafNode { bytes: right_bytes });
            let right_stats = compute_stats(&right);
            Some((right_stats, Box::new(right)))
        }
        RopeNode::Inner(inner) => {
            let mut offset = 0usize;
            let mut target = inner.children.len().saturating_sub(1);
            for (i, (stats, _)) in inner.children.iter().enumerate() {
                if char_idx < offset + stats.utf8_codepoints || i == inner.children.len() - 1 {
                    target = i;
                    break;
                }
                offset += stats.utf8_codepoints;
            }
            let local_idx = char_idx - offset;
            let overflow = insert_into(&mut inner.children[target].1, local_idx, text);
            inner.children[target].0 = compute_stats(&inner.children[target].1);
            if let Some((stats, node)) = overflow {
                inner.children.insert(target + 1, (stats, node));
            }
            if inner.children.len() <= INNER_FANOUT {
                return None;
            }
            let split_at = inner.children.len() / 2;
            let right_children = inner.children.split_off(split_at);
            let right = RopeNode::Inner(InnerNode {
                children: right_children,
            });
            let right_stats = compute_stats(&right);
            Some((right_stats, Box::new(right)))
        }
    }
}

fn remove_from(node: &mut RopeNode, start: usize, end: usize) {
    if start >= end {
        return;
    }
    match node {
        RopeNode::Leaf(leaf) => {
            let byte_start = char_to_byte(&leaf.bytes, start);
            let byte_end = char_to_byte(&leaf.bytes, end);
            leaf.bytes.drain(byte_start..byte_end);
        }
        RopeNode::Inner(inner) => {
            let mut offset = 0usize;
            for (stats, child) in inner.children.iter_mut() {
                let child_len = stats.utf8_codepoints;
                let child_start = offset;
                let child_end = offset + child_len;
                if child_end > start && child_start < end {
                    let local_start = start.saturating_sub(child_start).min(child_len);
                    let local_end = end.saturating_sub(child_start).min(child_len);
                    remove_from(child, local_start, local_end);
                    *stats = compute_stats(child);
                }
                offset = child_end;
            }
            inner.children.retain(|(s, _)| s.text_bytes > 0);
            if inner.children.is_empty() {
                inner.children.push((
                    TextStats::default(),
                    Box::new(RopeNode::Leaf(LeafNode { bytes: Vec::new() })),
                ));
            }
        }
    }
}

/// Descends to a single leaf fully containing `[char_idx, char_idx+count)`,
/// returning its text and the local char offset within it. Returns
/// `None` if the range spans more than one leaf.
fn find_leaf_span(node: &RopeNode, char_idx: usize, count: usize) -> Option<(&str, usize)> {
    match node {
        RopeNode::Leaf(leaf) => {
            let total = count_codepoints(&leaf.bytes);
            if char_idx + count <= total {
                Some((leaf.as_str(), char_idx))
            } else {
                None
            }
        }
        RopeNode::Inner(inner) => {
            let mut offset = 0usize;
            for (stats, child) in &inner.children {
                let child_len = stats.utf8_codepoints;
                if char_idx >= offset && char_idx + count <= offset + child_len {
                    return find_leaf_span(child, char_idx - offset, count);
                }
                offset += child_len;
            }
            None
        }
    }
}

fn read_into(node: &RopeNode, start: usize, end: usize, out: &mut String) {
    if start >= end {
        return;
    }
    match node {
        RopeNode::Leaf(leaf) => {
            let s = leaf.as_str();
            let byte_start = char_to_byte(leaf.bytes.as_slice(), start);
            let byte_end = char_to_byte(leaf.bytes.as_slice(), end);
            out.push_str(&s[byte_start..byte_end]);
        }
        RopeNode::Inner(inner) => {
            let mut offset = 0usize;
            for (stats, child) in &inner.children {
                let child_len = stats.utf8_codepoints;
                let child_start = offset;
                let child_end = offset + child_len;
                if child_end > start && child_start < end {
                    let local_start = start.saturating_sub(child_start).min(child_len);
                    let local_end = end.saturating_sub(child_start).min(child_len);
                    read_into(child, local_start, local_end, out);
                }
                offset = child_end;
            }
        }
    }
}

/// A mutable text buffer backed by a balanced tree of bounded-size pages.
#[derive(Debug, Clone)]
pub struct Rope {
    root: Box<RopeNode>,
    stats: TextStats,
}

impl Default for Rope {
    fn default() -> Self {
        Rope::new()
    }
}

impl Rope {
    pub fn new() -> Self {
        Rope {
            root: Box::new(RopeNode::Leaf(LeafNode { bytes: Vec::new() })),
            stats: TextStats::default(),
        }
    }

    pub fn stats(&self) -> TextStats {
        self.stats
    }

    pub fn len_bytes(&self) -> usize {
        self.stats.text_bytes
    }

    pub fn len_codepoints(&self) -> usize {
        self.stats.utf8_codepoints
    }

    pub fn line_breaks(&self) -> usize {
        self.stats.line_breaks
    }

    /// Inserts `text` at codepoint offset `char_idx`, chunking it into
    /// leaf-sized, codepoint-boundary-respecting pieces first.
    pub fn insert(&mut self, char_idx: usize, text: &str) {
        let mut idx = char_idx;
        let mut rest = text;
        while !rest.is_empty() {
            let len = chunk_boundary(rest, LEAF_CAPACITY);
            let (chunk, remainder) = rest.split_at(len);
            self.insert_bounded(idx, chunk);
            idx += chunk.chars().count();
            rest = remainder;
        }
    }

    fn insert_bounded(&mut self, char_idx: usize, text: &str) {
        if let Some((stats, sibling)) = insert_into(&mut self.root, char_idx, text) {
            let placeholder = Box::new(RopeNode::Leaf(LeafNode { bytes: Vec::new() }));
            let old_root = std::mem::replace(&mut self.root, placeholder);
            let old_stats = compute_stats(&old_root);
            self.root = Box::new(RopeNode::Inner(InnerNode {
                children: vec![(old_stats, old_root), (stats, sibling)],
            }));
        }
        self.stats = compute_stats(&self.root);
    }

    /// Removes `count` codepoints starting at `char_idx`.
    pub fn remove(&mut self, char_idx: usize, count: usize) {
        let end = (char_idx + count).min(self.stats.utf8_codepoints);
        if char_idx >= end {
            return;
        }
        remove_from(&mut self.root, char_idx, end);
        self.stats = compute_stats(&self.root);
    }

    /// Replaces `count` codepoints starting at `char_idx` with `text`.
    pub fn replace(&mut self, char_idx: usize, count: usize, text: &str) {
        self.remove(char_idx, count);
        self.insert(char_idx, text);
    }

    /// Reads `count` codepoints starting at `char_idx`. Borrows a
    /// single leaf when the range doesn't cross a leaf boundary,
    /// otherwise materializes an owned string.
    pub fn read(&self, char_idx: usize, count: usize) -> Cow<'_, str> {
        if count == 0 {
            return Cow::Borrowed("");
        }
        if let Some((leaf, local_idx)) = find_leaf_span(&self.root, char_idx, count) {
            let byte_start = char_to_byte(leaf.as_bytes(), local_idx);
            let byte_end = char_to_byte(leaf.as_bytes(), local_idx + count);
            return Cow::Borrowed(&leaf[byte_start..byte_end]);
        }
        let mut out = String::new();
        read_into(&self.root, char_idx, char_idx + count, &mut out);
        Cow::Owned(out)
    }

    pub fn to_text_string(&self) -> String {
        self.read(0, self.stats.utf8_codepoints).into_owned()
    }

    /// Splits off everything from `char_idx` onward into a new `Rope`;
    /// `self` retains the prefix.
    pub fn split_off(&mut self, char_idx: usize) -> Rope {
        let total = self.stats.utf8_codepoints;
        let tail = self.read(char_idx, total - char_idx).into_owned();
        self.remove(char_idx, total - char_idx);
        Rope::from(tail.as_str())
    }

    /// Appends `other`'s text to the end of `self`.
    pub fn append(&mut self, other: &Rope) {
        let text = other.to_text_string();
        let at = self.stats.utf8_codepoints;
        self.insert(at, &text);
    }
}

impl From<&str> for Rope {
    fn from(s: &str) -> Self {
        let mut rope = Rope::new();
        rope.insert(0, s);
        rope
    }
}

impl From<String> for Rope {
    fn from(s: String) -> Self {
        Rope::from(s.as_str())
    }
}

impl std::fmt::Display for Rope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_text_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_roundtrip_small_and_large() {
        for text in [
            "",
            "hello world",
            &"abcdefghij".repeat(500),
            "line one\r\nline two\nline three",
        ] {
            let rope = Rope::from(text);
            assert_eq!(rope.to_text_string(), text);
            assert_eq!(rope.len_codepoints(), text.chars().count());
        }
    }

    #[test]
    fn test_insert_empty_is_noop() {
        let text = "select * from foo where bar = 1";
        for i in 0..=text.chars().count() {
            let mut rope = Rope::from(text);
            let stats_before = rope.stats();
            rope.insert(i, "");
            assert_eq!(rope.to_text_string(), text);
            assert_eq!(rope.stats(), stats_before);
        }
    }

    #[test]
    fn test_split_off_reconstructs_original() {
        let text = "abcdefghijklmnopqrstuvwxyz".repeat(100);
        for cut in [0, 1, 5, 50, text.chars().count(), text.chars().count() / 2] {
            let mut left = Rope::from(text.as_str());
            let right = left.split_off(cut);
            let mut reassembled = left.to_text_string();
            reassembled.push_str(&right.to_text_string());
            assert_eq!(reassembled, text);
        }
    }

    #[test]
    fn test_insert_triggers_leaf_split() {
        let mut rope = Rope::new();
        let chunk = "x".repeat(LEAF_CAPACITY + 10);
        rope.insert(0, &chunk);
        assert_eq!(rope.to_text_string(), chunk);
        assert!(matches!(*rope.root, RopeNode::Inner(_)));
    }

    #[test]
    fn test_remove_and_replace() {
        let mut rope = Rope::from("select a, b from t");
        rope.remove(7, 6); // remove "a, b f"
        assert_eq!(rope.to_text_string(), "select rom t");
        let mut rope = Rope::from("select a from t");
        rope.replace(7, 1, "b");
        assert_eq!(rope.to_text_string(), "select b from t");
    }

    #[test]
    fn test_append() {
        let mut left = Rope::from("select * ");
        let right = Rope::from("from foo");
        left.append(&right);
        assert_eq!(left.to_text_string(), "select * from foo");
    }

    #[test]
    fn test_stats_track_line_breaks_and_crlf() {
        let rope = Rope::from("a\r\nb\nc\rd");
        let stats = rope.stats();
        assert_eq!(stats.line_breaks, 3);
        assert_eq!(stats.text_bytes, 8);
        assert_eq!(stats.utf8_codepoints, 8);
    }

    #[test]
    fn test_no_split_inside_crlf() {
        // Force many inserts around a CRLF boundary and make sure the
        // leaf capacity boundary never lands between \r and \n.
        let mut rope = Rope::new();
        let mut text = String::new();
        for _ in 0..2000 {
            text.push_str("ab\r\n");
        }
        rope.insert(0, &text);
        assert_eq!(rope.to_text_string(), text);
    }

    #[test]
    fn test_unicode_multibyte_boundaries() {
        let text = "héllo wörld 日本語のテキスト".repeat(200);
        let rope = Rope::from(text.as_str());
        assert_eq!(rope.to_text_string(), text);
        assert_eq!(rope.len_codepoints(), text.chars().count());
    }
}
