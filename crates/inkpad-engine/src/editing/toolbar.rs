use crate::editing::actions::{WRAP_ACTIONS, WrapAction};
use crate::editing::observer::ToolbarState;
use crate::geometry::{Point, Rect, Size};

/// Sizes used to lay out the toolbar panel, in the renderer's units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolbarMetrics {
    pub button: Size,
    pub spacing: f32,
    pub padding: f32,
    pub caption_height: f32,
}

impl Default for ToolbarMetrics {
    fn default() -> Self {
        Self {
            button: Size::new(32.0, 32.0),
            spacing: 4.0,
            padding: 4.0,
            caption_height: 16.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolbarButton {
    pub action: &'static WrapAction,
    pub rect: Rect,
}

/// Placement of every part of a visible toolbar.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolbarLayout {
    pub bounds: Rect,
    pub caption: String,
    pub caption_origin: Point,
    pub buttons: Vec<ToolbarButton>,
}

impl ToolbarLayout {
    /// The action whose button contains `point`.
    pub fn hit_test(&self, point: Point) -> Option<&'static WrapAction> {
        self.buttons
            .iter()
            .find(|button| button.rect.contains(point))
            .map(|button| button.action)
    }

    pub fn contains(&self, point: Point) -> bool {
        self.bounds.contains(point)
    }
}

/// Lays out the toolbar as a pure function of the observer state.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ToolbarView {
    metrics: ToolbarMetrics,
}

impl ToolbarView {
    pub fn new(metrics: ToolbarMetrics) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> &ToolbarMetrics {
        &self.metrics
    }

    /// Size of the panel holding the caption and one row of buttons.
    pub fn panel_size(&self) -> Size {
        let m = &self.metrics;
        let count = WRAP_ACTIONS.len() as f32;
        Size::new(
            m.padding * 2.0 + count * m.button.width + (count - 1.0) * m.spacing,
            m.padding * 2.0 + m.caption_height + m.button.height,
        )
    }

    /// `None` while hidden. The panel sits just above the anchor with its
    /// left edge on it, then is moved as needed to stay inside `surface`.
    pub fn layout(&self, state: &ToolbarState, surface: Rect) -> Option<ToolbarLayout> {
        let selection = state.selection()?;
        let m = &self.metrics;
        let size = self.panel_size();

        let wanted = Point::new(selection.anchor.x, selection.anchor.y - size.height);
        let origin = surface.clamp_origin(wanted, size);
        let bounds = Rect { origin, size };

        let buttons_top = origin.y + m.padding + m.caption_height;
        let buttons = WRAP_ACTIONS
            .iter()
            .enumerate()
            .map(|(i, action)| ToolbarButton {
                action,
                rect: Rect::new(
                    origin.x + m.padding + i as f32 * (m.button.width + m.spacing),
                    buttons_top,
                    m.button.width,
                    m.button.height,
                ),
            })
            .collect();

        Some(ToolbarLayout {
            bounds,
            caption: format!(
                "Selection: {} ~ {}",
                selection.offsets.start, selection.offsets.end
            ),
            caption_origin: Point::new(origin.x + m.padding, origin.y + m.padding),
            buttons,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editing::actions::WrapTag;
    use crate::editing::selection::{SelectionState, TextOffsets};
    use pretty_assertions::assert_eq;

    fn visible_at(x: f32, y: f32) -> ToolbarState {
        ToolbarState::Visible(SelectionState {
            offsets: TextOffsets::new(4, 9),
            anchor: Point::new(x, y),
        })
    }

    #[test]
    fn test_hidden_state_has_no_layout() {
        let view = ToolbarView::default();
        assert_eq!(view.layout(&ToolbarState::Hidden, Rect::new(0.0, 0.0, 800.0, 600.0)), None);
    }

    #[test]
    fn test_panel_sits_above_anchor() {
        // Given
        let view = ToolbarView::default();
        let surface = Rect::new(0.0, 0.0, 800.0, 600.0);

        // When
        let layout = view.layout(&visible_at(100.0, 300.0), surface).unwrap();

        // Then
        // 7 buttons of 32 with 6 gaps of 4, plus padding on both sides
        assert_eq!(layout.bounds, Rect::new(100.0, 244.0, 256.0, 56.0));
        assert_eq!(layout.caption, "Selection: 4 ~ 9");
        assert_eq!(layout.buttons.len(), 7);
        assert_eq!(layout.buttons[0].rect, Rect::new(104.0, 264.0, 32.0, 32.0));
        assert_eq!(layout.buttons[1].rect.left(), 140.0);
    }

    #[test]
    fn test_panel_is_clamped_inside_surface() {
        let view = ToolbarView::default();
        let surface = Rect::new(10.0, 10.0, 400.0, 300.0);

        let layout = view.layout(&visible_at(390.0, 20.0), surface).unwrap();

        assert_eq!(layout.bounds.origin, Point::new(154.0, 10.0));
        assert!(layout.bounds.right() <= surface.right());
    }

    #[test]
    fn test_oversized_panel_pins_to_surface_origin() {
        let view = ToolbarView::default();
        let surface = Rect::new(5.0, 5.0, 100.0, 20.0);

        let layout = view.layout(&visible_at(50.0, 15.0), surface).unwrap();

        assert_eq!(layout.bounds.origin, Point::new(5.0, 5.0));
    }

    #[test]
    fn test_hit_test_finds_buttons() {
        let view = ToolbarView::default();
        let layout = view
            .layout(&visible_at(100.0, 300.0), Rect::new(0.0, 0.0, 800.0, 600.0))
            .unwrap();

        let bold = layout.hit_test(Point::new(110.0, 270.0)).unwrap();
        assert_eq!(bold.tag, WrapTag::Strong);
        let quote = layout.hit_test(Point::new(340.0, 270.0)).unwrap();
        assert_eq!(quote.tag, WrapTag::Blockquote);

        // Caption row and the gap between buttons
        assert_eq!(layout.hit_test(Point::new(110.0, 245.0)), None);
        assert_eq!(layout.hit_test(Point::new(137.0, 270.0)), None);
        assert!(layout.contains(Point::new(137.0, 270.0)));
    }
}
