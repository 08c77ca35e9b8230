use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::config::SearchConfig;
use crate::core::{Document, Editor, Point, ScrollAlign, Selection};
use crate::debounce::Debouncer;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub case_sensitive: bool,
    pub whole_word: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Match {
    pub from: usize,
    pub to: usize,
}

pub fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

pub fn fold_char(c: char) -> char {
    let mut lower = c.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

/// Every occurrence of `query` in document order. Each text leaf is scanned on its own,
/// so a match never spans two leaves.
pub fn compute_matches(doc: &Document, query: &str, options: SearchOptions) -> Vec<Match> {
    if query.is_empty() {
        return Vec::new();
    }

    let fold = |c: char| {
        if options.case_sensitive {
            c
        } else {
            fold_char(c)
        }
    };
    let needle: Vec<char> = query.chars().map(fold).collect();

    let mut matches = Vec::new();
    for leaf in doc.text_leaves() {
        let chars: Vec<(usize, char)> = leaf.text.char_indices().collect();
        let mut ix = 0;
        while ix + needle.len() <= chars.len() {
            let window = &chars[ix..ix + needle.len()];
            let hit = window
                .iter()
                .zip(&needle)
                .all(|((_, c), n)| fold(*c) == *n);
            if !hit {
                ix += 1;
                continue;
            }

            let end_ix = ix + needle.len();
            if options.whole_word {
                let before = ix.checked_sub(1).map(|i| chars[i].1);
                let after = chars.get(end_ix).map(|(_, c)| *c);
                if before.is_some_and(is_word_char) || after.is_some_and(is_word_char) {
                    ix += 1;
                    continue;
                }
            }

            let start = chars[ix].0;
            let end = chars.get(end_ix).map_or(leaf.text.len(), |(b, _)| *b);
            matches.push(Match {
                from: leaf.base + start,
                to: leaf.base + end,
            });
            ix = end_ix;
        }
    }
    matches
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecorationStyle {
    Match,
    CurrentMatch,
}

impl DecorationStyle {
    pub fn class_name(self) -> &'static str {
        match self {
            DecorationStyle::Match => "search-match",
            DecorationStyle::CurrentMatch => "search-match-current",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoration {
    pub from: usize,
    pub to: usize,
    pub style: DecorationStyle,
}

pub fn build_decorations(matches: &[Match], current_index: usize) -> Vec<Decoration> {
    matches
        .iter()
        .enumerate()
        .map(|(ix, m)| Decoration {
            from: m.from,
            to: m.to,
            style: if ix + 1 == current_index {
                DecorationStyle::CurrentMatch
            } else {
                DecorationStyle::Match
            },
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecorationSet {
    pub generation: Option<u64>,
    pub decorations: Vec<Decoration>,
}

impl DecorationSet {
    pub fn is_current(&self, editor: &Editor) -> bool {
        self.generation == Some(editor.generation())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStatus {
    pub current: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Replaced(Match),
    NoMatch,
    /// The target no longer held the matched text. Nothing was changed and the match
    /// list was re-derived.
    Stale,
}

pub struct SearchSession {
    query: String,
    replacement: String,
    options: SearchOptions,
    matches: Vec<Match>,
    current_index: usize,
    generation: Option<u64>,
    scan: Debouncer<String>,
}

impl SearchSession {
    pub fn new(config: &SearchConfig) -> Self {
        let config = config.clone().with_defaults();
        Self {
            query: String::new(),
            replacement: String::new(),
            options: SearchOptions::default(),
            matches: Vec::new(),
            current_index: 0,
            generation: None,
            scan: Debouncer::new(config.debounce()),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn options(&self) -> SearchOptions {
        self.options
    }

    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_match(&self) -> Option<Match> {
        self.current_index
            .checked_sub(1)
            .and_then(|ix| self.matches.get(ix).copied())
    }

    pub fn generation(&self) -> Option<u64> {
        self.generation
    }

    pub fn is_scan_pending(&self) -> bool {
        self.scan.is_pending()
    }

    pub fn status(&self) -> SearchStatus {
        SearchStatus {
            current: self.current_index,
            total: self.matches.len(),
        }
    }

    pub fn decorations(&self) -> DecorationSet {
        DecorationSet {
            generation: self.generation,
            decorations: build_decorations(&self.matches, self.current_index),
        }
    }

    pub fn set_query(&mut self, query: impl Into<String>, now: Instant) {
        self.query = query.into();
        if self.query.is_empty() {
            self.clear();
            return;
        }
        if let Some(cancelled) = self.scan.schedule(self.query.clone(), now) {
            tracing::trace!(cancelled = %cancelled, "search scan rescheduled");
        }
    }

    pub fn set_replacement(&mut self, replacement: impl Into<String>) {
        self.replacement = replacement.into();
    }

    pub fn set_case_sensitive(&mut self, editor: &Editor, case_sensitive: bool) {
        self.set_options(
            editor,
            SearchOptions {
                case_sensitive,
                ..self.options
            },
        );
    }

    pub fn set_whole_word(&mut self, editor: &Editor, whole_word: bool) {
        self.set_options(
            editor,
            SearchOptions {
                whole_word,
                ..self.options
            },
        );
    }

    pub fn set_options(&mut self, editor: &Editor, options: SearchOptions) {
        self.options = options;
        if self.query.is_empty() {
            return;
        }
        self.scan.cancel();
        self.rescan(editor);
    }

    pub fn poll(&mut self, editor: &Editor, now: Instant) -> bool {
        if self.scan.poll(now).is_some() {
            self.rescan(editor);
            return true;
        }
        if self.scan.is_pending() || self.query.is_empty() {
            return false;
        }
        if self.generation != Some(editor.generation()) {
            self.rescan(editor);
            return true;
        }
        false
    }

    pub fn refresh(&mut self, editor: &Editor) {
        if self.query.is_empty() {
            return;
        }
        if self.scan.flush().is_some() || self.generation != Some(editor.generation()) {
            self.rescan(editor);
        }
    }

    pub fn next(&mut self, editor: &mut Editor) -> Option<Match> {
        self.refresh(editor);
        if self.matches.is_empty() {
            return None;
        }
        self.current_index = if self.current_index >= self.matches.len() {
            1
        } else {
            self.current_index + 1
        };
        self.reveal_current(editor)
    }

    pub fn previous(&mut self, editor: &mut Editor) -> Option<Match> {
        self.refresh(editor);
        if self.matches.is_empty() {
            return None;
        }
        self.current_index = if self.current_index <= 1 {
            self.matches.len()
        } else {
            self.current_index - 1
        };
        self.reveal_current(editor)
    }

    pub fn select_match(&mut self, editor: &mut Editor, index: usize) -> Option<Match> {
        self.refresh(editor);
        if index == 0 || index > self.matches.len() {
            return None;
        }
        self.current_index = index;
        self.reveal_current(editor)
    }

    pub fn replace(&mut self, editor: &mut Editor) -> ReplaceOutcome {
        self.refresh(editor);
        let Some(target) = self.current_match() else {
            return ReplaceOutcome::NoMatch;
        };
        let previous_index = self.current_index;

        if !self.still_matches(editor.doc(), target) {
            tracing::debug!(from = target.from, to = target.to, "replace target went stale");
            self.rescan(editor);
            return ReplaceOutcome::Stale;
        }

        match editor.replace_range(target.from, target.to, &self.replacement) {
            Ok(true) => {}
            Ok(false) => {
                self.rescan(editor);
                return ReplaceOutcome::Stale;
            }
            Err(err) => {
                tracing::warn!(%err, from = target.from, to = target.to, "replace failed");
                self.rescan(editor);
                return ReplaceOutcome::Stale;
            }
        }
        tracing::debug!(
            from = target.from,
            to = target.to,
            generation = editor.generation(),
            "replaced match"
        );

        self.derive(editor);
        self.current_index = if self.matches.is_empty() {
            0
        } else {
            previous_index.min(self.matches.len())
        };
        ReplaceOutcome::Replaced(target)
    }

    /// Replaces every match, last one first, each as its own transaction. Clears the
    /// session afterwards and returns how many replacements were applied.
    pub fn replace_all(&mut self, editor: &mut Editor) -> usize {
        self.refresh(editor);
        if self.matches.is_empty() {
            return 0;
        }

        let targets = std::mem::take(&mut self.matches);
        let mut replaced = 0;
        for target in targets.iter().rev() {
            match editor.replace_range(target.from, target.to, &self.replacement) {
                Ok(true) => replaced += 1,
                Ok(false) => {
                    tracing::debug!(from = target.from, to = target.to, "skipping unresolved match")
                }
                Err(err) => {
                    tracing::warn!(%err, from = target.from, to = target.to, "replace failed")
                }
            }
        }
        tracing::debug!(
            replaced,
            total = targets.len(),
            generation = editor.generation(),
            "replaced all matches"
        );

        self.query.clear();
        self.clear();
        self.generation = Some(editor.generation());
        replaced
    }

    pub fn clear(&mut self) {
        self.scan.cancel();
        self.matches.clear();
        self.current_index = 0;
        self.generation = None;
    }

    fn still_matches(&self, doc: &Document, target: Match) -> bool {
        let Some(text) = doc.text_between(target.from, target.to) else {
            return false;
        };
        if self.options.case_sensitive {
            text == self.query
        } else {
            text.chars().map(fold_char).eq(self.query.chars().map(fold_char))
        }
    }

    fn derive(&mut self, editor: &Editor) {
        self.matches = compute_matches(editor.doc(), &self.query, self.options);
        self.generation = Some(editor.generation());
        tracing::trace!(
            matches = self.matches.len(),
            generation = editor.generation(),
            "search scan"
        );
    }

    fn rescan(&mut self, editor: &Editor) {
        self.derive(editor);
        if self.matches.is_empty() {
            self.current_index = 0;
        } else if self.current_index == 0 || self.current_index > self.matches.len() {
            self.current_index = 1;
        }
    }

    fn reveal_current(&self, editor: &mut Editor) -> Option<Match> {
        let target = self.current_match()?;
        let (path, range) = editor.doc().resolve_text_range(target.from, target.to)?;
        let selection = Selection {
            anchor: Point::new(path.clone(), range.start),
            focus: Point::new(path, range.end),
        };
        editor.set_selection(selection.clone());
        editor.request_scroll_into_view(selection, ScrollAlign::Center);
        Some(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Node;

    fn doc(text: &str) -> Document {
        Document {
            children: vec![Node::paragraph(text)],
        }
    }

    #[test]
    fn case_folding_is_per_character() {
        let matches = compute_matches(&doc("Fox fOX fox"), "FOX", SearchOptions::default());
        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0], Match { from: 1, to: 4 });

        let strict = SearchOptions {
            case_sensitive: true,
            ..SearchOptions::default()
        };
        assert_eq!(compute_matches(&doc("Fox fOX fox"), "fox", strict).len(), 1);
    }

    #[test]
    fn scanning_does_not_overlap() {
        let matches = compute_matches(&doc("aaaa"), "aa", SearchOptions::default());
        assert_eq!(
            matches,
            vec![Match { from: 1, to: 3 }, Match { from: 3, to: 5 }]
        );
    }

    #[test]
    fn underscores_are_word_characters() {
        let opts = SearchOptions {
            whole_word: true,
            ..SearchOptions::default()
        };
        assert!(compute_matches(&doc("snake_case"), "case", opts).is_empty());
        assert_eq!(compute_matches(&doc("case-by-case"), "case", opts).len(), 2);
    }

    #[test]
    fn multibyte_text_uses_byte_positions() {
        let matches = compute_matches(&doc("héllo wörld"), "wör", SearchOptions::default());
        // "héllo " is 7 bytes, plus the paragraph's opening token.
        assert_eq!(matches, vec![Match { from: 8, to: 12 }]);
    }

    #[test]
    fn decorations_mark_the_current_match() {
        let matches = [Match { from: 1, to: 2 }, Match { from: 5, to: 6 }];
        let decorations = build_decorations(&matches, 2);
        assert_eq!(decorations[0].style, DecorationStyle::Match);
        assert_eq!(decorations[1].style, DecorationStyle::CurrentMatch);
        assert_eq!(decorations[1].style.class_name(), "search-match-current");
        assert!(build_decorations(&matches, 0)
            .iter()
            .all(|d| d.style == DecorationStyle::Match));
    }
}
