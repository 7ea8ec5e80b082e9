use inkpad_engine::editing::offsets::{compute_offsets, selected_text};
use inkpad_engine::{
    Affinity, BoundaryPoint, EditError, EditableDocument, Editor, EditorEvent, Key, KeyInput,
    KeyPolicy, Rect, SelectionEvents, SelectionRange, SurfaceGeometry, TextOffsets, ToolbarState,
    WrapOutcome, WrapTag, editing::wrap::wrap,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

const MIXED: &str = "<h2>Notes</h2><p>The <strong>quick</strong> brown <em>fox 😀</em></p>\
                     <blockquote><p>jumps<br>over</p></blockquote>";

struct PageGeometry;

impl SurfaceGeometry for PageGeometry {
    fn surface_bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, 640.0, 480.0)
    }

    fn selection_rects(&self, _doc: &EditableDocument, offsets: &TextOffsets) -> Vec<Rect> {
        vec![Rect::new(offsets.start as f32 * 7.0, 40.0, offsets.len() as f32 * 7.0, 14.0)]
    }
}

/// Every ordered pair of flattened offsets in `doc`, both directions.
fn all_ranges(doc: &EditableDocument) -> Vec<SelectionRange> {
    let len = doc.text_len();
    let mut ranges = Vec::new();
    for a in 0..=len {
        for b in 0..=len {
            let start = doc.point_at_offset(a, Affinity::Forward);
            let end = doc.point_at_offset(b, Affinity::Backward);
            ranges.push(SelectionRange::new(start, end));
        }
    }
    ranges
}

fn mounted(markup: &str) -> (SelectionEvents, Editor) {
    let events = SelectionEvents::new();
    let editor = Editor::mount(&events, markup, PageGeometry, KeyPolicy::HideOnAnyKey);
    (events, editor)
}

fn select(events: &SelectionEvents, editor: &Editor, start: usize, end: usize) {
    let range = editor.with_document(|doc| SelectionRange::from_offsets(doc, start, end));
    events.emit(&EditorEvent::SelectionChange(Some(range)));
}

#[test]
fn selections_outside_the_document_never_map_or_show_the_toolbar() {
    // Given an editor and some other text on the same page
    let (events, editor) = mounted(MIXED);
    let page = EditableDocument::from_markup("<p>Sidebar entry</p><p>Footer</p>");

    for range in all_ranges(&page) {
        // When the selection lies entirely in the other text
        let offsets = editor.with_document(|doc| compute_offsets(doc, &range));
        events.emit(&EditorEvent::SelectionChange(Some(range)));

        // Then nothing maps and the toolbar stays hidden
        assert_eq!(offsets, None);
        assert_eq!(editor.toolbar_state(), ToolbarState::Hidden);
    }
}

#[test]
fn offsets_stay_within_the_flattened_text() {
    let doc = EditableDocument::from_markup(MIXED);
    let len = doc.text_len();

    for range in all_ranges(&doc) {
        let offsets = compute_offsets(&doc, &range).unwrap();
        assert!(offsets.start <= offsets.end);
        assert!(offsets.end <= len);
    }
}

#[rstest]
#[case(WrapTag::Strong)]
#[case(WrapTag::Em)]
#[case(WrapTag::U)]
#[case(WrapTag::Code)]
#[case(WrapTag::H1)]
#[case(WrapTag::Blockquote)]
fn wrap_then_unwrap_restores_plain_text(#[case] tag: WrapTag) {
    let original = EditableDocument::from_markup(MIXED);
    let expected = original.plain_text().to_string();
    let len = original.text_len();

    for start in 0..len {
        for end in start + 1..=len {
            // Given a fresh copy of the document with a span selected
            let mut doc = EditableDocument::from_markup(MIXED);
            let range = SelectionRange::from_offsets(&doc, start, end);

            // When the tag is applied and then toggled off again
            let wrapped = wrap(&mut doc, &range, tag.tag_name()).unwrap();
            assert_eq!(doc.plain_text(), expected, "after wrapping {start}..{end}");
            let Some(selection) = wrapped.selection().copied() else {
                continue;
            };
            wrap(&mut doc, &selection, tag.tag_name()).unwrap();

            // Then the visible text is exactly what it was
            assert_eq!(doc.plain_text(), expected, "after unwrapping {start}..{end}");
        }
    }
}

#[test]
fn strong_toggles_on_and_off_over_hello() {
    let mut doc = EditableDocument::from_markup("hello");
    let range = SelectionRange::from_offsets(&doc, 0, 5);

    let wrapped = wrap(&mut doc, &range, "strong").unwrap();
    insta::assert_snapshot!(doc.outline(), @r#"
    <strong>
      "hello"
    "#);

    // Selecting the new element's contents toggles it off again
    let inside = *wrapped.selection().unwrap();
    let unwrapped = wrap(&mut doc, &inside, "strong").unwrap();
    assert!(matches!(unwrapped, WrapOutcome::Unwrapped(_)));
    insta::assert_snapshot!(doc.outline(), @r#""hello""#);
    assert_eq!(doc.plain_text(), "hello");
}

#[test]
fn collapsed_selection_is_a_noop_not_an_error() {
    let mut doc = EditableDocument::from_markup(MIXED);
    let before = doc.to_markup();
    let caret = SelectionRange::collapsed(doc.point_at_offset(6, Affinity::Forward));

    let outcome = wrap(&mut doc, &caret, "em");

    assert_eq!(outcome, Ok(WrapOutcome::NoOp));
    assert_eq!(doc.to_markup(), before);
    assert_eq!(doc.version(), 0);
}

#[test]
fn emphasis_over_quick() {
    // Given "The quick fox" with characters 4..9 selected
    let (events, editor) = mounted("The quick fox");
    select(&events, &editor, 4, 9);
    assert_eq!(
        editor.with_document(|doc| selected_text(doc, &editor.selection().unwrap())),
        Some("quick".to_string())
    );

    // When em is applied from the toolbar
    editor.activate(WrapTag::Em).unwrap();

    // Then the text is unchanged and em sits between the flanking text nodes
    editor.with_document(|doc| {
        assert_eq!(doc.plain_text(), "The quick fox");
        insta::assert_snapshot!(doc.outline(), @r#"
        "The "
        <em>
          "quick"
        " fox"
        "#);
    });
}

#[test]
fn selection_across_sibling_inline_nodes() {
    // "The quick brown" with "ick br" selected: half in strong, half plain
    let mut doc = EditableDocument::from_markup("<p>The <strong>quick</strong> brown</p>");
    let texts = doc.text_nodes();
    let range = SelectionRange::new(
        BoundaryPoint::new(doc.id(), texts[2], 3),
        BoundaryPoint::new(doc.id(), texts[1], 2),
    );

    assert_eq!(compute_offsets(&doc, &range), Some(TextOffsets::new(6, 12)));
    assert_eq!(selected_text(&doc, &range).as_deref(), Some("ick br"));

    wrap(&mut doc, &range, "u").unwrap();

    assert_eq!(doc.plain_text(), "The quick brown");
    assert_eq!(
        doc.to_markup(),
        "<p>The <strong>qu</strong><u><strong>ick</strong> br</u>own</p>"
    );
}

#[test]
fn collapsed_selection_change_hides_the_toolbar() {
    let (events, editor) = mounted(MIXED);
    select(&events, &editor, 6, 11);
    assert!(editor.toolbar_state().is_visible());

    select(&events, &editor, 8, 8);

    assert_eq!(editor.toolbar_state(), ToolbarState::Hidden);
}

#[rstest]
#[case(Key::Char('a'))]
#[case(Key::Left)]
#[case(Key::Enter)]
#[case(Key::Shift)]
fn key_down_hides_the_toolbar_whatever_the_key(#[case] key: Key) {
    let (events, editor) = mounted(MIXED);
    select(&events, &editor, 6, 11);

    events.emit(&EditorEvent::KeyDown(KeyInput::new(key, false, true)));

    assert_eq!(editor.toolbar_state(), ToolbarState::Hidden);
}

#[test]
fn stale_selection_after_content_replacement() {
    let (events, editor) = mounted("one two");
    select(&events, &editor, 0, 3);
    let old = editor.selection().unwrap();

    editor.set_content("<p>three</p>");
    let mut doc = EditableDocument::from_markup("one two");

    assert_eq!(
        editor.with_document(|current| compute_offsets(current, &old)),
        None
    );
    assert_eq!(wrap(&mut doc, &old, "em"), Err(EditError::StaleSelection));
}

#[test]
fn toolbar_is_anchored_at_the_selection_and_kept_on_the_surface() {
    let (events, editor) = mounted(MIXED);
    select(&events, &editor, 6, 11);

    let layout = editor.toolbar_layout().unwrap();

    assert_eq!(layout.caption, "Selection: 6 ~ 11");
    assert_eq!(layout.buttons.len(), 7);
    let surface = PageGeometry.surface_bounds();
    assert!(layout.bounds.left() >= surface.left());
    assert!(layout.bounds.top() >= surface.top());
    assert!(layout.bounds.right() <= surface.right());
}
