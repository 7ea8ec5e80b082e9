//! Placing document text on the terminal grid.
//!
//! Every character takes one cell. A new row starts whenever the text moves
//! into a different block element, and rows wrap at the panel width. The
//! same layout answers both directions: offset to cell for drawing and
//! selection rectangles, cell to offset for mouse input.

use inkpad_engine::{
    EditableDocument, NodeId, Rect, Size, SurfaceGeometry, Tag, TextOffsets, ToolbarMetrics,
};

/// One character on the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub ch: char,
    /// Flattened offset of the character's first code unit.
    pub offset: usize,
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub cells: Vec<Cell>,
    /// Offset just past the last character on the row.
    pub end: usize,
    /// Block element that owns the row's text.
    pub block: Option<Tag>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLayout {
    pub rows: Vec<Row>,
    pub text_len: usize,
}

impl TextLayout {
    pub fn build(doc: &EditableDocument, width: u16) -> Self {
        let width = usize::from(width.max(1));
        let mut rows: Vec<Row> = Vec::new();
        let mut current_block: Option<NodeId> = None;

        for run in doc.text_runs() {
            let block = block_of(doc, run.node);
            if rows.is_empty() || block != current_block {
                rows.push(Row {
                    cells: Vec::new(),
                    end: run.range.start,
                    block: block.and_then(|id| doc.node(id)?.tag().cloned()),
                });
                current_block = block;
            }

            let mut offset = run.range.start;
            for ch in run.text.chars() {
                let needs_wrap = rows.last().is_some_and(|row| row.cells.len() >= width);
                if needs_wrap {
                    let block = rows.last().and_then(|row| row.block.clone());
                    rows.push(Row {
                        cells: Vec::new(),
                        end: offset,
                        block,
                    });
                }
                if let Some(row) = rows.last_mut() {
                    row.cells.push(Cell {
                        ch,
                        offset,
                        tags: run.tags.clone(),
                    });
                    offset += ch.len_utf16();
                    row.end = offset;
                }
            }
        }

        Self {
            rows,
            text_len: doc.text_len(),
        }
    }

    /// Grid position (column, row) of the caret at `offset`.
    pub fn position_of(&self, offset: usize) -> (u16, u16) {
        for (y, row) in self.rows.iter().enumerate() {
            if let Some(x) = row.cells.iter().position(|cell| cell.offset >= offset) {
                return (to_u16(x), to_u16(y));
            }
            let is_last = y + 1 == self.rows.len();
            if offset <= row.end && (is_last || self.rows[y + 1].cells.is_empty()) {
                return (to_u16(row.cells.len()), to_u16(y));
            }
        }
        match self.rows.last() {
            Some(row) => (to_u16(row.cells.len()), to_u16(self.rows.len() - 1)),
            None => (0, 0),
        }
    }

    /// Offset of the caret a click at (column, row) places.
    pub fn offset_at(&self, x: u16, y: u16) -> usize {
        let Some(row) = self.rows.get(usize::from(y)) else {
            return self.text_len;
        };
        row.cells
            .get(usize::from(x))
            .map_or(row.end, |cell| cell.offset)
    }

    /// Offset one character before `offset`.
    pub fn previous_offset(&self, offset: usize) -> usize {
        self.cells()
            .map(|cell| cell.offset)
            .take_while(|start| *start < offset)
            .last()
            .unwrap_or(0)
    }

    /// Offset one character after `offset`.
    pub fn next_offset(&self, offset: usize) -> usize {
        self.cells()
            .find(|cell| cell.offset >= offset)
            .map_or(self.text_len, |cell| cell.offset + cell.ch.len_utf16())
    }

    /// Offset on the row above or below, keeping the column where possible.
    pub fn vertical_offset(&self, offset: usize, down: bool) -> usize {
        let (x, y) = self.position_of(offset);
        if down {
            if usize::from(y) + 1 >= self.rows.len() {
                return self.text_len;
            }
            self.offset_at(x, y + 1)
        } else if y == 0 {
            0
        } else {
            self.offset_at(x, y - 1)
        }
    }

    /// Row-wise rectangles covering `offsets`, relative to the layout origin.
    pub fn selection_cells(&self, offsets: &TextOffsets) -> Vec<(u16, u16, u16)> {
        let mut spans = Vec::new();
        for (y, row) in self.rows.iter().enumerate() {
            let selected: Vec<usize> = row
                .cells
                .iter()
                .enumerate()
                .filter(|(_, cell)| cell.offset >= offsets.start && cell.offset < offsets.end)
                .map(|(x, _)| x)
                .collect();
            if let (Some(first), Some(last)) = (selected.first(), selected.last()) {
                spans.push((to_u16(*first), to_u16(y), to_u16(last - first + 1)));
            }
        }
        spans
    }

    fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.rows.iter().flat_map(|row| row.cells.iter())
    }
}

fn block_of(doc: &EditableDocument, node: NodeId) -> Option<NodeId> {
    doc.ancestors(node)
        .into_iter()
        .skip(1)
        .find(|id| doc.node(*id).and_then(|n| n.tag()).is_some_and(Tag::is_block))
}

fn to_u16(value: usize) -> u16 {
    u16::try_from(value).unwrap_or(u16::MAX)
}

/// Converts a ratatui area into the editor's geometry units (cells).
pub fn to_geometry(area: ratatui::layout::Rect) -> Rect {
    Rect::new(
        f32::from(area.x),
        f32::from(area.y),
        f32::from(area.width),
        f32::from(area.height),
    )
}

/// Converts editor geometry back into a ratatui area.
pub fn to_area(rect: Rect) -> ratatui::layout::Rect {
    ratatui::layout::Rect::new(
        rect.left().max(0.0) as u16,
        rect.top().max(0.0) as u16,
        rect.size.width.max(0.0) as u16,
        rect.size.height.max(0.0) as u16,
    )
}

/// Toolbar sizes in terminal cells: a bordered panel with a one-line
/// caption above a row of labelled buttons.
pub fn toolbar_metrics() -> ToolbarMetrics {
    ToolbarMetrics {
        button: Size::new(5.0, 1.0),
        spacing: 1.0,
        padding: 1.0,
        caption_height: 1.0,
    }
}

/// The editor panel as seen by the selection observer.
#[derive(Debug, Clone, Copy)]
pub struct TerminalGeometry {
    area: ratatui::layout::Rect,
}

impl TerminalGeometry {
    pub fn new(area: ratatui::layout::Rect) -> Self {
        Self { area }
    }
}

impl SurfaceGeometry for TerminalGeometry {
    fn surface_bounds(&self) -> Rect {
        to_geometry(self.area)
    }

    fn selection_rects(&self, doc: &EditableDocument, offsets: &TextOffsets) -> Vec<Rect> {
        TextLayout::build(doc, self.area.width)
            .selection_cells(offsets)
            .into_iter()
            .map(|(x, y, width)| {
                Rect::new(
                    f32::from(self.area.x + x),
                    f32::from(self.area.y + y),
                    f32::from(width),
                    1.0,
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row_text(layout: &TextLayout, y: usize) -> String {
        layout.rows[y].cells.iter().map(|cell| cell.ch).collect()
    }

    #[test]
    fn test_blocks_start_new_rows() {
        let doc = EditableDocument::from_markup("<h1>Title</h1><p>Body <em>text</em></p>");

        let layout = TextLayout::build(&doc, 40);

        assert_eq!(layout.rows.len(), 2);
        assert_eq!(row_text(&layout, 0), "Title");
        assert_eq!(row_text(&layout, 1), "Body text");
        assert_eq!(layout.rows[0].block, Some(Tag::H1));
        assert_eq!(layout.rows[1].cells[5].tags, vec![Tag::P, Tag::Em]);
    }

    #[test]
    fn test_rows_wrap_at_width() {
        let doc = EditableDocument::from_markup("abcdefg");

        let layout = TextLayout::build(&doc, 3);

        assert_eq!(layout.rows.len(), 3);
        assert_eq!(row_text(&layout, 2), "g");
        assert_eq!(layout.position_of(4), (1, 1));
        assert_eq!(layout.position_of(7), (1, 2));
    }

    #[test]
    fn test_click_maps_back_to_offsets() {
        let doc = EditableDocument::from_markup("<p>one</p><p>two</p>");
        let layout = TextLayout::build(&doc, 20);

        assert_eq!(layout.offset_at(1, 1), 4);
        assert_eq!(layout.offset_at(10, 0), 3);
        assert_eq!(layout.offset_at(0, 9), 6);
    }

    #[test]
    fn test_caret_steps_over_surrogate_pairs() {
        let doc = EditableDocument::from_markup("a😀b");
        let layout = TextLayout::build(&doc, 20);

        assert_eq!(layout.next_offset(1), 3);
        assert_eq!(layout.previous_offset(3), 1);
        assert_eq!(layout.next_offset(4), 4);
        assert_eq!(layout.previous_offset(0), 0);
    }

    #[test]
    fn test_selection_rects_in_terminal_cells() {
        // Given a panel at (2, 3) with two paragraphs
        let doc = EditableDocument::from_markup("<p>one</p><p>two</p>");
        let geometry = TerminalGeometry::new(ratatui::layout::Rect::new(2, 3, 20, 10));

        // When "ne tw" is selected
        let rects = geometry.selection_rects(&doc, &TextOffsets::new(1, 5));

        // Then each row contributes one rectangle
        assert_eq!(
            rects,
            vec![Rect::new(3.0, 3.0, 2.0, 1.0), Rect::new(2.0, 4.0, 2.0, 1.0)]
        );
    }

    #[test]
    fn test_toolbar_fits_above_selection() {
        let view = inkpad_engine::ToolbarView::new(toolbar_metrics());

        let size = view.panel_size();

        assert_eq!(size, Size::new(43.0, 4.0));
    }
}
