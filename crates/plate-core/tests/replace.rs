use std::time::{Duration, Instant};

use inkpress_plate_core::{
    Document, Editor, Match, Node, PluginRegistry, Point, ReplaceOutcome, SearchConfig,
    SearchSession, Selection,
};
use pretty_assertions::assert_eq;

fn editor_with_paragraphs(texts: &[&str]) -> Editor {
    let doc = Document {
        children: texts.iter().map(|t| Node::paragraph(*t)).collect(),
    };
    let selection = Selection::collapsed(Point::new(vec![0, 0], 0));
    Editor::new(doc, selection, PluginRegistry::richtext())
}

fn scanned(editor: &Editor, query: &str, replacement: &str) -> SearchSession {
    let mut session = SearchSession::new(&SearchConfig::default());
    let now = Instant::now();
    session.set_query(query, now);
    session.poll(editor, now + Duration::from_millis(150));
    session.set_replacement(replacement);
    session
}

#[test]
fn replace_all_works_back_to_front() {
    let mut editor = editor_with_paragraphs(&["aXaXa"]);
    let mut session = scanned(&editor, "X", "YY");
    assert_eq!(session.matches().len(), 2);

    assert_eq!(session.replace_all(&mut editor), 2);
    assert_eq!(editor.doc().plain_text(), "aYYaYYa");

    assert!(session.matches().is_empty());
    assert_eq!(session.query(), "");
    assert_eq!(session.current_index(), 0);
}

#[test]
fn each_replacement_is_its_own_undo_step() {
    let mut editor = editor_with_paragraphs(&["aXaXa"]);
    let mut session = scanned(&editor, "X", "YY");
    session.replace_all(&mut editor);

    assert!(editor.undo());
    assert_eq!(editor.doc().plain_text(), "aXaYYa");
    assert!(editor.undo());
    assert_eq!(editor.doc().plain_text(), "aXaXa");
    assert!(!editor.can_undo());
}

#[test]
fn empty_replacement_deletes_matches() {
    let mut editor = editor_with_paragraphs(&["a-b-c", "d-e"]);
    let mut session = scanned(&editor, "-", "");

    assert_eq!(session.replace_all(&mut editor), 3);
    assert_eq!(editor.doc().plain_text(), "abc\nde");
}

#[test]
fn replacement_containing_the_query_is_not_rescanned() {
    let mut editor = editor_with_paragraphs(&["ab ab"]);
    let mut session = scanned(&editor, "ab", "abab");

    assert_eq!(session.replace_all(&mut editor), 2);
    assert_eq!(editor.doc().plain_text(), "abab abab");
}

#[test]
fn single_replace_keeps_the_cursor_in_range() {
    let mut editor = editor_with_paragraphs(&["x x x"]);
    let mut session = scanned(&editor, "x", "y");
    session.select_match(&mut editor, 3).unwrap();

    assert_eq!(
        session.replace(&mut editor),
        ReplaceOutcome::Replaced(Match { from: 5, to: 6 })
    );
    assert_eq!(editor.doc().plain_text(), "x x y");
    assert_eq!(session.matches().len(), 2);
    assert_eq!(session.current_index(), 2);

    session.replace(&mut editor);
    session.replace(&mut editor);
    assert_eq!(editor.doc().plain_text(), "y y y");
    assert_eq!(session.current_index(), 0);
    assert_eq!(session.replace(&mut editor), ReplaceOutcome::NoMatch);
}

#[test]
fn stale_matches_are_rederived_before_replacing() -> anyhow::Result<()> {
    let mut editor = editor_with_paragraphs(&["cat dog cat"]);
    let mut session = scanned(&editor, "cat", "cow");
    assert_eq!(session.current_match(), Some(Match { from: 1, to: 4 }));

    // An edit the session has not seen shifts every stored position.
    anyhow::ensure!(editor.replace_range(1, 1, "big ")?, "insert did not resolve");

    assert_eq!(
        session.replace(&mut editor),
        ReplaceOutcome::Replaced(Match { from: 5, to: 8 })
    );
    assert_eq!(editor.doc().plain_text(), "big cow dog cat");
    Ok(())
}

#[test]
fn replace_all_ignores_positions_from_before_an_edit() {
    let mut editor = editor_with_paragraphs(&["one two", "two"]);
    let mut session = scanned(&editor, "two", "2");

    editor.replace_range(1, 4, "").unwrap();

    assert_eq!(session.replace_all(&mut editor), 2);
    assert_eq!(editor.doc().plain_text(), " 2\n2");
}
