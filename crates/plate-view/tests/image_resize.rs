use inkpress_plate_core::{Editor, Node, Op, Transaction};
use inkpress_plate_view::{
    CommitOutcome, ImageView, ImageViewConfig, NodeLocation, Position, ResizeHandle, Size,
};
use pretty_assertions::assert_eq;

fn editor_with_image(width: u32, height: u32) -> Editor {
    let mut editor = Editor::with_richtext_plugins();
    editor
        .run_command(
            "image.insert",
            Some(serde_json::json!({
                "src": "https://example.com/photo.png",
                "width": width,
                "height": height
            })),
        )
        .unwrap();
    editor
}

fn view_at(editor: &Editor, path: Vec<usize>) -> ImageView {
    let attrs = editor.doc().image_at(&path).unwrap();
    ImageView::new(
        attrs,
        NodeLocation::new(path, editor.generation()),
        ImageViewConfig::default(),
    )
}

fn size_of(editor: &Editor, path: &[usize]) -> (Option<u32>, Option<u32>) {
    let image = editor.doc().image_at(path).unwrap();
    (image.width, image.height)
}

#[test]
fn corner_drag_commits_once_and_undoes_in_one_step() {
    let mut editor = editor_with_image(200, 150);
    let mut view = view_at(&editor, vec![1]);
    let generation = editor.generation();

    assert!(view.pointer_down(ResizeHandle::Se, Position::new(0.0, 0.0)));
    assert_eq!(
        view.pointer_move(Position::new(20.0, 10.0)),
        Some(Size::new(220.0, 160.0))
    );
    assert_eq!(
        view.pointer_move(Position::new(50.0, 30.0)),
        Some(Size::new(250.0, 180.0))
    );
    // Moves only touch the element.
    assert_eq!(editor.generation(), generation);
    assert_eq!(size_of(&editor, &[1]), (Some(200), Some(150)));
    assert_eq!(view.element().width, Some(250.0));

    assert_eq!(
        view.pointer_up(&mut editor),
        CommitOutcome::Committed {
            width: 250,
            height: 180
        }
    );
    assert_eq!(editor.generation(), generation + 1);
    assert_eq!(size_of(&editor, &[1]), (Some(250), Some(180)));
    assert_eq!(view.attrs().width, Some(250));
    assert!(!view.is_dragging());

    assert!(editor.undo());
    assert_eq!(size_of(&editor, &[1]), (Some(200), Some(150)));
}

#[test]
fn dragging_past_the_floor_stops_at_the_minimum() {
    let mut editor = editor_with_image(200, 150);
    let mut view = view_at(&editor, vec![1]);

    view.pointer_down(ResizeHandle::Nw, Position::new(0.0, 0.0));
    assert_eq!(
        view.pointer_move(Position::new(500.0, 500.0)),
        Some(Size::new(100.0, 100.0))
    );
    assert_eq!(
        view.pointer_up(&mut editor),
        CommitOutcome::Committed {
            width: 100,
            height: 100
        }
    );
    assert_eq!(size_of(&editor, &[1]), (Some(100), Some(100)));
}

#[test]
fn edge_handles_keep_the_other_dimension() {
    let mut editor = editor_with_image(200, 150);
    let mut view = view_at(&editor, vec![1]);

    view.pointer_down(ResizeHandle::E, Position::new(10.0, 10.0));
    view.pointer_move(Position::new(40.0, 90.0));
    assert_eq!(
        view.pointer_up(&mut editor),
        CommitOutcome::Committed {
            width: 230,
            height: 150
        }
    );
}

#[test]
fn images_without_size_start_from_the_natural_size() {
    let mut editor = Editor::with_richtext_plugins();
    editor
        .run_command("image.insert", Some(serde_json::json!({ "src": "a.png" })))
        .unwrap();
    let mut view = view_at(&editor, vec![1]);
    view.set_natural_size(Size::new(640.0, 480.0));

    view.pointer_down(ResizeHandle::Sw, Position::new(0.0, 0.0));
    view.pointer_move(Position::new(40.0, -80.0));
    assert_eq!(
        view.pointer_up(&mut editor),
        CommitOutcome::Committed {
            width: 600,
            height: 400
        }
    );
}

#[test]
fn removing_the_image_mid_drag_discards_the_resize() {
    let mut editor = editor_with_image(200, 150);
    let mut view = view_at(&editor, vec![1]);

    view.pointer_down(ResizeHandle::Se, Position::new(0.0, 0.0));
    view.pointer_move(Position::new(50.0, 30.0));

    editor
        .run_command("image.remove", Some(serde_json::json!({ "path": [1] })))
        .unwrap();
    let generation = editor.generation();
    let children = editor.doc().children.clone();

    assert_eq!(view.pointer_up(&mut editor), CommitOutcome::Discarded);
    assert_eq!(editor.generation(), generation);
    assert_eq!(editor.doc().children, children);
    assert_eq!(view.element().width, Some(200.0));
    assert_eq!(view.element().height, Some(150.0));
}

#[test]
fn commit_follows_the_image_when_blocks_are_inserted_above() {
    let mut editor = editor_with_image(200, 150);
    let mut view = view_at(&editor, vec![1]);

    view.pointer_down(ResizeHandle::Se, Position::new(0.0, 0.0));
    view.pointer_move(Position::new(10.0, 10.0));

    editor
        .apply(
            Transaction::new(vec![Op::InsertNode {
                path: vec![0],
                node: Node::paragraph("above"),
            }])
            .source("test:insert_above"),
        )
        .unwrap();

    assert_eq!(
        view.pointer_up(&mut editor),
        CommitOutcome::Committed {
            width: 210,
            height: 160
        }
    );
    assert_eq!(size_of(&editor, &[2]), (Some(210), Some(160)));
    assert_eq!(view.location().path, vec![2]);
    assert_eq!(view.location().generation, editor.generation());
}

#[test]
fn lost_pointer_capture_commits_the_live_size() {
    let mut editor = editor_with_image(200, 150);
    let mut view = view_at(&editor, vec![1]);

    view.pointer_down(ResizeHandle::S, Position::new(0.0, 0.0));
    view.pointer_move(Position::new(0.0, 25.0));

    assert_eq!(
        view.pointer_cancel(&mut editor),
        CommitOutcome::Committed {
            width: 200,
            height: 175
        }
    );
    assert!(!view.is_dragging());
}

#[test]
fn release_without_movement_dispatches_nothing() {
    let mut editor = editor_with_image(200, 150);
    let mut view = view_at(&editor, vec![1]);
    let generation = editor.generation();

    view.pointer_down(ResizeHandle::Se, Position::new(5.0, 5.0));
    view.pointer_move(Position::new(30.0, 30.0));
    view.pointer_move(Position::new(5.0, 5.0));

    assert_eq!(view.pointer_up(&mut editor), CommitOutcome::Unchanged);
    assert_eq!(editor.generation(), generation);
    assert!(!editor.can_redo());
}

#[test]
fn pointer_up_without_a_drag_is_ignored() {
    let mut editor = editor_with_image(200, 150);
    let mut view = view_at(&editor, vec![1]);

    assert_eq!(view.pointer_move(Position::new(10.0, 10.0)), None);
    assert_eq!(view.pointer_up(&mut editor), CommitOutcome::NotDragging);
}

#[test]
fn second_pointer_down_does_not_restart_the_drag() {
    let mut editor = editor_with_image(200, 150);
    let mut view = view_at(&editor, vec![1]);

    assert!(view.pointer_down(ResizeHandle::Se, Position::new(0.0, 0.0)));
    view.pointer_move(Position::new(20.0, 20.0));
    assert!(!view.pointer_down(ResizeHandle::Nw, Position::new(20.0, 20.0)));

    view.pointer_move(Position::new(40.0, 40.0));
    assert_eq!(
        view.pointer_up(&mut editor),
        CommitOutcome::Committed {
            width: 240,
            height: 190
        }
    );
}

#[test]
fn handles_show_while_hovered_or_dragging() {
    let mut editor = editor_with_image(200, 150);
    let mut view = view_at(&editor, vec![1]);
    assert!(!view.element().handles_visible);

    view.hover_enter();
    assert!(view.element().handles_visible);

    view.pointer_down(ResizeHandle::E, Position::new(0.0, 0.0));
    view.hover_leave();
    assert!(view.element().handles_visible);

    view.pointer_move(Position::new(12.0, 0.0));
    view.pointer_up(&mut editor);
    assert!(!view.element().handles_visible);
}
