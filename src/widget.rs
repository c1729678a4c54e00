//! Widgets: drawable panels with a weight and a visibility flag

use std::sync::Arc;

use parking_lot::Mutex;
use ratatui::{buffer::Buffer, layout::Rect};
use tracing::debug;

use crate::error::Error;

/// Lower bound for widget weights (inclusive).
pub const MIN_WEIGHT: u16 = 1;
/// Upper bound for widget weights (inclusive).
pub const MAX_WEIGHT: u16 = 10;

/// Anything that can report a preferred size and paint itself into an
/// assigned region. Concrete drawables live in the embedding application;
/// the framework only ever holds them behind this trait.
pub trait Drawable: Send {
    /// Preferred (width, height) in terminal cells. The weighted layout may
    /// assign more or less space than this.
    fn preferred_size(&self) -> (u16, u16);

    /// Paint into `area`. The area has already been clipped to the buffer.
    fn draw(&self, area: Rect, buf: &mut Buffer);
}

/// A drawable shared between a command (which updates it) and the renderer
/// (which paints it).
pub type SharedDrawable = Arc<Mutex<dyn Drawable>>;

/// Stable handle to a widget, returned at creation time. Show/hide calls
/// identify the widget by this handle; callers must retain it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId(usize);

/// A panel in the vertical stack: one drawable, a title, a weight in
/// [`MIN_WEIGHT`]..=[`MAX_WEIGHT`], and a visibility flag. Widgets start
/// hidden and are never destroyed once created.
pub struct Widget {
    drawable: SharedDrawable,
    title: String,
    weight: u16,
    visible: bool,
}

impl Widget {
    pub fn new(drawable: SharedDrawable, title: impl Into<String>, weight: u16) -> Result<Self, Error> {
        if !(MIN_WEIGHT..=MAX_WEIGHT).contains(&weight) {
            return Err(Error::InvalidWeight(weight));
        }
        Ok(Self {
            drawable,
            title: title.into(),
            weight,
            visible: false,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn weight(&self) -> u16 {
        self.weight
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn drawable(&self) -> &SharedDrawable {
        &self.drawable
    }
}

/// Insertion-ordered widget collection. Creation order is stacking order in
/// the layout, and ids are stable indices into it.
#[derive(Default)]
pub struct WidgetSet {
    widgets: Vec<Widget>,
}

impl WidgetSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, widget: Widget) -> WidgetId {
        self.widgets.push(widget);
        WidgetId(self.widgets.len() - 1)
    }

    pub fn get(&self, id: WidgetId) -> Option<&Widget> {
        self.widgets.get(id.0)
    }

    /// Flip a widget's visibility. Returns `true` when the flag actually
    /// changed; asking for the current state is a no-op returning `false`.
    pub fn set_visible(&mut self, id: WidgetId, visible: bool) -> Result<bool, Error> {
        let widget = self.widgets.get_mut(id.0).ok_or(Error::UnknownWidget)?;
        if widget.visible == visible {
            return Ok(false);
        }
        widget.visible = visible;
        debug!(title = widget.title.as_str(), visible, "widget visibility changed");
        Ok(true)
    }

    /// Visible widgets in creation order.
    pub fn visible(&self) -> impl Iterator<Item = (WidgetId, &Widget)> {
        self.widgets
            .iter()
            .enumerate()
            .filter(|(_, w)| w.visible)
            .map(|(i, w)| (WidgetId(i), w))
    }

    pub fn iter(&self) -> impl Iterator<Item = (WidgetId, &Widget)> {
        self.widgets
            .iter()
            .enumerate()
            .map(|(i, w)| (WidgetId(i), w))
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Blank;

    impl Drawable for Blank {
        fn preferred_size(&self) -> (u16, u16) {
            (10, 3)
        }

        fn draw(&self, _area: Rect, _buf: &mut Buffer) {}
    }

    fn blank() -> SharedDrawable {
        Arc::new(Mutex::new(Blank))
    }

    #[test]
    fn rejects_out_of_range_weights() {
        assert!(matches!(
            Widget::new(blank(), "w", 0),
            Err(Error::InvalidWeight(0))
        ));
        assert!(matches!(
            Widget::new(blank(), "w", 11),
            Err(Error::InvalidWeight(11))
        ));
        assert!(Widget::new(blank(), "w", 1).is_ok());
        assert!(Widget::new(blank(), "w", 10).is_ok());
    }

    #[test]
    fn widgets_start_hidden() {
        let widget = Widget::new(blank(), "w", 4).unwrap();
        assert!(!widget.is_visible());
    }

    #[test]
    fn set_visible_reports_actual_changes() {
        let mut set = WidgetSet::new();
        let id = set.insert(Widget::new(blank(), "w", 4).unwrap());

        assert_eq!(set.set_visible(id, true).unwrap(), true);
        assert_eq!(set.set_visible(id, true).unwrap(), false);
        assert_eq!(set.set_visible(id, false).unwrap(), true);
        assert_eq!(set.set_visible(id, false).unwrap(), false);
    }

    #[test]
    fn unknown_handle_is_an_error() {
        let mut empty = WidgetSet::new();
        let mut other = WidgetSet::new();
        let foreign = other.insert(Widget::new(blank(), "w", 4).unwrap());

        assert!(matches!(
            empty.set_visible(foreign, true),
            Err(Error::UnknownWidget)
        ));
    }

    #[test]
    fn visible_iterates_in_creation_order() {
        let mut set = WidgetSet::new();
        let a = set.insert(Widget::new(blank(), "a", 2).unwrap());
        let b = set.insert(Widget::new(blank(), "b", 3).unwrap());
        let c = set.insert(Widget::new(blank(), "c", 4).unwrap());

        set.set_visible(c, true).unwrap();
        set.set_visible(a, true).unwrap();

        let order: Vec<_> = set.visible().map(|(id, _)| id).collect();
        assert_eq!(order, vec![a, c]);
        assert_eq!(set.get(b).map(|w| w.is_visible()), Some(false));
    }
}
