//! Incremental multi-pattern stream matching.
//!
//! Hosts hand `expect` one of four shapes: a single string, a byte sequence,
//! a list of strings, or a list of byte sequences. All of them normalize into
//! one ordered [`PatternSet`] at the call boundary; ordering defines tie-break
//! priority. The [`Matcher`] then consumes the stream one byte at a time,
//! tracking for every candidate the longest pattern prefix that ends at the
//! current position, so a byte that breaks one partial match can still begin
//! or extend another.

/// A candidate byte sequence to match against the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// Match these exact bytes.
    Bytes(Vec<u8>),
    /// Match the ASCII bytes of this text.
    Text(String),
}

impl Pattern {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Pattern::Bytes(b) => b,
            Pattern::Text(s) => s.as_bytes(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl From<&str> for Pattern {
    fn from(s: &str) -> Self {
        Pattern::Text(s.to_string())
    }
}

impl From<String> for Pattern {
    fn from(s: String) -> Self {
        Pattern::Text(s)
    }
}

impl From<Vec<u8>> for Pattern {
    fn from(b: Vec<u8>) -> Self {
        Pattern::Bytes(b)
    }
}

impl From<&[u8]> for Pattern {
    fn from(b: &[u8]) -> Self {
        Pattern::Bytes(b.to_vec())
    }
}

/// An ordered list of candidate patterns. Index order is match priority.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl From<Pattern> for PatternSet {
    fn from(p: Pattern) -> Self {
        Self { patterns: vec![p] }
    }
}

impl From<Vec<Pattern>> for PatternSet {
    fn from(patterns: Vec<Pattern>) -> Self {
        Self { patterns }
    }
}

impl From<&str> for PatternSet {
    fn from(s: &str) -> Self {
        Pattern::from(s).into()
    }
}

impl From<String> for PatternSet {
    fn from(s: String) -> Self {
        Pattern::from(s).into()
    }
}

impl From<Vec<u8>> for PatternSet {
    fn from(b: Vec<u8>) -> Self {
        Pattern::from(b).into()
    }
}

impl From<&[u8]> for PatternSet {
    fn from(b: &[u8]) -> Self {
        Pattern::from(b).into()
    }
}

impl From<Vec<&str>> for PatternSet {
    fn from(items: Vec<&str>) -> Self {
        Self {
            patterns: items.into_iter().map(Pattern::from).collect(),
        }
    }
}

impl From<Vec<String>> for PatternSet {
    fn from(items: Vec<String>) -> Self {
        Self {
            patterns: items.into_iter().map(Pattern::from).collect(),
        }
    }
}

impl From<Vec<Vec<u8>>> for PatternSet {
    fn from(items: Vec<Vec<u8>>) -> Self {
        Self {
            patterns: items.into_iter().map(Pattern::from).collect(),
        }
    }
}

/// Per-candidate match state: the pattern bytes, a prefix-function table, and
/// how many leading bytes currently match.
#[derive(Debug)]
struct Candidate {
    bytes: Vec<u8>,
    // failure[i] = length of the longest proper prefix of bytes[..=i] that is
    // also a suffix of it.
    failure: Vec<usize>,
    matched: usize,
}

impl Candidate {
    fn new(bytes: Vec<u8>) -> Self {
        let mut failure = vec![0usize; bytes.len()];
        let mut k = 0;
        for i in 1..bytes.len() {
            while k > 0 && bytes[i] != bytes[k] {
                k = failure[k - 1];
            }
            if bytes[i] == bytes[k] {
                k += 1;
            }
            failure[i] = k;
        }
        Self {
            bytes,
            failure,
            matched: 0,
        }
    }

    /// Extend the prefix match with one byte; true when the whole pattern has
    /// been seen.
    fn advance(&mut self, byte: u8) -> bool {
        while self.matched > 0 && self.bytes[self.matched] != byte {
            self.matched = self.failure[self.matched - 1];
        }
        if self.bytes[self.matched] == byte {
            self.matched += 1;
        }
        if self.matched == self.bytes.len() {
            self.matched = 0;
            return true;
        }
        false
    }
}

/// Streaming matcher over a [`PatternSet`]. State lives only for one `expect`
/// call; partial progress is discarded when the call returns.
#[derive(Debug)]
pub struct Matcher {
    candidates: Vec<(usize, Candidate)>,
}

impl Matcher {
    /// Build the match state. Zero-length patterns can never complete and are
    /// left out.
    pub fn new(set: &PatternSet) -> Self {
        let candidates = set
            .patterns()
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_empty())
            .map(|(i, p)| (i, Candidate::new(p.as_bytes().to_vec())))
            .collect();
        Self { candidates }
    }

    /// True when no candidate can ever complete.
    pub fn is_inert(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Feed one byte to every candidate. Returns the index of the first
    /// pattern that completes on this byte; the lowest index wins when several
    /// complete simultaneously.
    pub fn push(&mut self, byte: u8) -> Option<usize> {
        let mut winner: Option<usize> = None;
        for (index, candidate) in &mut self.candidates {
            if candidate.advance(byte) && winner.is_none() {
                winner = Some(*index);
            }
        }
        winner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(matcher: &mut Matcher, stream: &[u8]) -> Option<usize> {
        for &b in stream {
            if let Some(i) = matcher.push(b) {
                return Some(i);
            }
        }
        None
    }

    #[test]
    fn single_pattern_matches_at_index_zero() {
        let set = PatternSet::from("OK");
        let mut matcher = Matcher::new(&set);
        assert_eq!(feed(&mut matcher, b"...OK"), Some(0));
    }

    #[test]
    fn second_pattern_reports_its_index() {
        let set = PatternSet::from(vec!["foo", "bar"]);
        let mut matcher = Matcher::new(&set);
        assert_eq!(feed(&mut matcher, b"bar"), Some(1));
    }

    #[test]
    fn earlier_completion_beats_later_pattern() {
        let set = PatternSet::from(vec!["foo", "bar"]);
        let mut matcher = Matcher::new(&set);
        assert_eq!(feed(&mut matcher, b"foobar"), Some(0));
    }

    #[test]
    fn completion_order_beats_length() {
        // "ab" completes one byte before "abc" can.
        let set = PatternSet::from(vec!["ab", "abc"]);
        let mut matcher = Matcher::new(&set);
        assert_eq!(feed(&mut matcher, b"abc"), Some(0));
    }

    #[test]
    fn simultaneous_completion_takes_lowest_index() {
        let set = PatternSet::from(vec!["xab", "ab"]);
        let mut matcher = Matcher::new(&set);
        // Both complete on the final 'b'; index 0 wins.
        assert_eq!(feed(&mut matcher, b"xab"), Some(0));
    }

    #[test]
    fn broken_partial_match_restarts_incrementally() {
        // Naive skip-ahead would miss "aab" in "aaab".
        let set = PatternSet::from("aab");
        let mut matcher = Matcher::new(&set);
        assert_eq!(feed(&mut matcher, b"aaab"), Some(0));
    }

    #[test]
    fn failure_table_restart_across_patterns() {
        let set = PatternSet::from(vec!["abc", "bd"]);
        let mut matcher = Matcher::new(&set);
        // "ab" makes progress on "abc"; 'd' breaks it but completes "bd".
        assert_eq!(feed(&mut matcher, b"abd"), Some(1));
    }

    #[test]
    fn no_match_reports_none() {
        let set = PatternSet::from(vec!["yes", "no"]);
        let mut matcher = Matcher::new(&set);
        assert_eq!(feed(&mut matcher, b"maybe?"), None);
    }

    #[test]
    fn byte_sequences_match_raw_data() {
        let set = PatternSet::from(vec![vec![0x01u8, 0x02], vec![0xff, 0xfe]]);
        let mut matcher = Matcher::new(&set);
        assert_eq!(feed(&mut matcher, &[0x00, 0xff, 0xfe]), Some(1));
    }

    #[test]
    fn empty_patterns_are_inert() {
        let set = PatternSet::from(vec![Pattern::Bytes(vec![]), Pattern::Text(String::new())]);
        let matcher = Matcher::new(&set);
        assert!(matcher.is_inert());
        assert!(Matcher::new(&PatternSet::default()).is_inert());
    }

    #[test]
    fn normalization_shapes() {
        assert_eq!(PatternSet::from("one").len(), 1);
        assert_eq!(PatternSet::from(vec!["a", "b", "c"]).len(), 3);
        assert_eq!(PatternSet::from(vec![1u8, 2, 3]).len(), 1);
        assert_eq!(PatternSet::from(vec![vec![1u8], vec![2u8]]).len(), 2);
        assert_eq!(
            PatternSet::from("text").patterns()[0],
            Pattern::Text("text".into())
        );
    }
}
