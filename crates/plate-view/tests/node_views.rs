use anyhow::Context as _;
use inkpress_plate_core::{
    Document, Editor, ImageAttrs, Node, Op, PluginRegistry, Point, Selection, Transaction,
};
use inkpress_plate_view::{
    ImageViewConfig, NodeViews, Position, ResizeHandle, Size, SyncReport,
};
use pretty_assertions::assert_eq;

fn editor_with_image() -> Editor {
    let mut editor = Editor::with_richtext_plugins();
    editor
        .run_command(
            "image.insert",
            Some(serde_json::json!({ "src": "a.png", "width": 200, "height": 150 })),
        )
        .unwrap();
    editor
}

#[test]
fn sync_mounts_one_view_per_image() {
    let mut editor = editor_with_image();
    editor
        .run_command("image.insert", Some(serde_json::json!({ "src": "b.png" })))
        .unwrap();

    let mut views = NodeViews::new(ImageViewConfig::default());
    let report = views.sync(&editor);

    assert_eq!(
        report,
        SyncReport {
            mounted: 2,
            ..SyncReport::default()
        }
    );
    assert_eq!(views.len(), 2);
    assert_eq!(views.generation(), Some(editor.generation()));

    let paths: Vec<_> = views
        .iter()
        .map(|view| view.location().path.clone())
        .collect();
    assert_eq!(paths, vec![vec![1], vec![3]]);
}

#[test]
fn undoing_a_resize_updates_the_existing_view() {
    let mut editor = editor_with_image();
    let mut views = NodeViews::new(ImageViewConfig::default());
    views.sync(&editor);

    let view = views.image_at_mut(&[1]).unwrap();
    view.pointer_down(ResizeHandle::Se, Position::new(0.0, 0.0));
    view.pointer_move(Position::new(40.0, 20.0));
    view.pointer_up(&mut editor);

    let report = views.sync(&editor);
    assert_eq!(report.mounted, 0);
    assert_eq!(report.updated, 1);
    assert_eq!(views.image_at(&[1]).unwrap().element().width, Some(240.0));

    assert!(editor.undo());
    let report = views.sync(&editor);
    assert_eq!(
        report,
        SyncReport {
            updated: 1,
            ..SyncReport::default()
        }
    );
    let view = views.image_at(&[1]).unwrap();
    assert_eq!(view.element().width, Some(200.0));
    assert_eq!(view.element().height, Some(150.0));
    assert_eq!(view.location().generation, editor.generation());
}

#[test]
fn removing_an_image_unmounts_its_view() -> anyhow::Result<()> {
    let mut editor = editor_with_image();
    let mut views = NodeViews::new(ImageViewConfig::default());
    views.sync(&editor);

    editor.run_command("image.remove", Some(serde_json::json!({ "path": [1] })))?;
    let report = views.sync(&editor);

    assert_eq!(report.unmounted, 1);
    assert!(views.is_empty());

    // Undo brings the node back and a fresh view with it.
    assert!(editor.undo());
    assert_eq!(views.sync(&editor).mounted, 1);
    let view = views
        .image_at(&[1])
        .context("restored image has no view")?;
    assert_eq!(view.attrs().src, "a.png");
    Ok(())
}

#[test]
fn views_follow_their_node_when_blocks_are_inserted_above() {
    let mut editor = editor_with_image();
    let mut views = NodeViews::new(ImageViewConfig::default());
    views.sync(&editor);
    views.image_at_mut(&[1]).unwrap().hover_enter();

    editor
        .apply(
            Transaction::new(vec![
                Op::InsertNode {
                    path: vec![0],
                    node: Node::paragraph("one"),
                },
                Op::InsertNode {
                    path: vec![0],
                    node: Node::paragraph("two"),
                },
            ])
            .source("test:insert_above"),
        )
        .unwrap();
    let report = views.sync(&editor);

    assert_eq!(report.updated, 1);
    assert_eq!(report.mounted, 0);
    assert!(views.image_at(&[1]).is_none());
    // Same view instance: the hover state survived the move.
    assert!(views.image_at(&[3]).unwrap().element().handles_visible);
}

#[test]
fn clear_drops_every_view() {
    let editor = editor_with_image();
    let mut views = NodeViews::new(ImageViewConfig::default());
    views.sync(&editor);
    assert!(!views.is_empty());

    views.clear();
    assert!(views.is_empty());
    assert_eq!(views.generation(), None);
}

#[test]
fn a_new_source_recreates_the_view() {
    let mut editor = editor_with_image();
    let mut views = NodeViews::new(ImageViewConfig::default());
    views.sync(&editor);
    let view = views.image_at_mut(&[1]).unwrap();
    view.hover_enter();
    view.set_natural_size(Size::new(800.0, 600.0));

    editor
        .run_command(
            "image.update_attributes",
            Some(serde_json::json!({ "path": [1], "src": "c.png" })),
        )
        .unwrap();
    let report = views.sync(&editor);

    assert_eq!(
        report,
        SyncReport {
            recreated: 1,
            ..SyncReport::default()
        }
    );
    let view = views.image_at(&[1]).unwrap();
    assert_eq!(view.attrs().src, "c.png");
    assert!(!view.element().handles_visible);
    assert_eq!(view.rendered_size(), Size::new(200.0, 150.0));
}

#[test]
fn a_path_that_no_longer_holds_an_image_drops_its_view() {
    let doc = |middle: Node| Document {
        children: vec![Node::paragraph("a"), middle, Node::paragraph("b")],
    };
    let selection = Selection::collapsed(Point::new(vec![0, 0], 0));
    let before = Editor::new(
        doc(Node::image(ImageAttrs::new("a.png"))),
        selection.clone(),
        PluginRegistry::richtext(),
    );
    let mut views = NodeViews::new(ImageViewConfig::default());
    assert_eq!(views.sync(&before).mounted, 1);

    // A reloaded document at the same generation, with a paragraph where the image was.
    let after = Editor::new(doc(Node::paragraph("x")), selection, PluginRegistry::richtext());
    let report = views.sync(&after);

    assert_eq!(
        report,
        SyncReport {
            unmounted: 1,
            ..SyncReport::default()
        }
    );
    assert!(views.is_empty());
}
