use crate::tree::{NodeIdx, TopicTree};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SearchMatch {
    pub node: NodeIdx,
    pub title: String,
    /// Ancestor-to-node title chain.
    pub path: String,
}

/// How the search field and the results panel should look.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "kebab-case")]
pub(crate) enum SearchStatus {
    Idle,
    NoResults,
    Results,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct SearchState {
    pub query: String,
    pub matches: Vec<SearchMatch>,
    pub active_index: usize,
}

impl SearchState {
    pub(crate) fn is_active(&self) -> bool {
        !self.query.is_empty()
    }

    pub(crate) fn status(&self) -> SearchStatus {
        if self.query.is_empty() {
            SearchStatus::Idle
        } else if self.matches.is_empty() {
            SearchStatus::NoResults
        } else {
            SearchStatus::Results
        }
    }

    pub(crate) fn is_match(&self, idx: NodeIdx) -> bool {
        // `matches` is sorted by node index (document order).
        self.matches.binary_search_by_key(&idx, |m| m.node).is_ok()
    }

    pub(crate) fn active(&self) -> Option<&SearchMatch> {
        self.matches.get(self.active_index)
    }

    /// Advance to the next match, wrapping after the last one.
    pub(crate) fn next(&mut self) -> Option<NodeIdx> {
        if self.matches.is_empty() {
            return None;
        }
        self.active_index = (self.active_index + 1) % self.matches.len();
        self.active().map(|m| m.node)
    }

    pub(crate) fn select(&mut self, index: usize) -> Option<NodeIdx> {
        let node = self.matches.get(index)?.node;
        self.active_index = index;
        Some(node)
    }
}

/// Case-insensitive substring search over topic titles, in document order.
pub(crate) fn search(tree: &TopicTree, query: &str) -> SearchState {
    if query.is_empty() {
        return SearchState::default();
    }

    let needle = fold(query);
    let matches = tree
        .iter()
        .filter(|(_, n)| contains_folded(&n.title, &needle))
        .map(|(idx, n)| SearchMatch {
            node: idx,
            title: n.title.clone(),
            path: tree.path(idx),
        })
        .collect::<Vec<_>>();

    SearchState {
        query: query.to_string(),
        matches,
        active_index: 0,
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Segment {
    pub text: String,
    pub matched: bool,
}

/// Length in chars of a case-insensitive match of `needle` at the start of
/// `chars`, if any.
fn match_len(chars: &[(usize, char)], needle: &[char]) -> Option<usize> {
    let mut n = 0;
    let mut consumed = 0;
    for &(_, c) in chars {
        if n == needle.len() {
            break;
        }
        for lc in c.to_lowercase() {
            if n < needle.len() && needle[n] == lc {
                n += 1;
            } else {
                return None;
            }
        }
        consumed += 1;
    }
    (n == needle.len()).then_some(consumed)
}

/// Per-char lowercase. Search and highlighting both compare on this form so
/// they always agree on what matches.
fn fold(s: &str) -> Vec<char> {
    s.chars().flat_map(char::to_lowercase).collect()
}

fn contains_folded(text: &str, needle: &[char]) -> bool {
    let chars = text.char_indices().collect::<Vec<_>>();
    (0..chars.len()).any(|i| match_len(&chars[i..], needle).is_some())
}

/// Split `text` into plain and matched runs. The query is matched literally.
pub(crate) fn highlight_segments(text: &str, query: &str) -> Vec<Segment> {
    let plain = |s: &str| Segment {
        text: s.to_string(),
        matched: false,
    };

    let needle = fold(query);
    if needle.is_empty() {
        return vec![plain(text)];
    }

    let chars = text.char_indices().collect::<Vec<_>>();
    let mut out = vec![];
    let mut plain_start = 0;
    let mut i = 0;

    while i < chars.len() {
        let Some(len) = match_len(&chars[i..], &needle) else {
            i += 1;
            continue;
        };

        let start = chars[i].0;
        let end = chars.get(i + len).map(|(b, _)| *b).unwrap_or(text.len());
        if plain_start < start {
            out.push(plain(&text[plain_start..start]));
        }
        out.push(Segment {
            text: text[start..end].to_string(),
            matched: true,
        });
        plain_start = end;
        i += len;
    }

    if plain_start < text.len() {
        out.push(plain(&text[plain_start..]));
    }
    out
}
