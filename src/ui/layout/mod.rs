//! Weighted vertical layout engine

use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::widget::{WidgetId, WidgetSet};

/// Fixed nominal weight of the primary panel, balanced against the weights
/// of whichever widgets are visible.
pub const MAIN_PANEL_WEIGHT: u16 = 6;

/// Rows reserved at the bottom of the screen for the command bar.
pub const COMMAND_BAR_HEIGHT: u16 = 3;

/// Computed rects for one frame: the primary panel, visible widgets in
/// creation order, and the command bar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComputedLayout {
    pub main: Rect,
    pub panels: Vec<(WidgetId, Rect)>,
    pub command_bar: Rect,
}

pub struct LayoutEngine;

impl LayoutEngine {
    /// Partition `area` among the primary panel and the visible widgets.
    ///
    /// Each row's share is the exact rational `weight / total_weight`, with
    /// the primary panel's fixed weight first and then each visible widget
    /// in creation order. Hidden widgets contribute no weight and no rows.
    /// The computation is deterministic: the same visible set, weights, and
    /// area always produce the same rects.
    pub fn compute(area: Rect, widgets: &WidgetSet) -> ComputedLayout {
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(COMMAND_BAR_HEIGHT),
            ])
            .split(area);
        let body = outer[0];
        let command_bar = outer[1];

        let visible: Vec<(WidgetId, u16)> = widgets
            .visible()
            .map(|(id, widget)| (id, widget.weight()))
            .collect();
        let total = total_weight(visible.iter().map(|(_, weight)| *weight));

        let mut constraints = Vec::with_capacity(visible.len() + 1);
        constraints.push(Constraint::Ratio(u32::from(MAIN_PANEL_WEIGHT), total));
        for (_, weight) in &visible {
            constraints.push(Constraint::Ratio(u32::from(*weight), total));
        }

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(body);

        ComputedLayout {
            main: rows[0],
            panels: visible
                .iter()
                .enumerate()
                .map(|(i, (id, _))| (*id, rows[i + 1]))
                .collect(),
            command_bar,
        }
    }
}

/// Exact vertical fractions as `(numerator, denominator)` pairs: the primary
/// panel first, then each visible widget in creation order. All pairs share
/// the same denominator, so the fractions sum to exactly one.
pub fn weight_fractions(widgets: &WidgetSet) -> Vec<(u32, u32)> {
    let weights: Vec<u16> = widgets.visible().map(|(_, w)| w.weight()).collect();
    let total = total_weight(weights.iter().copied());

    let mut fractions = Vec::with_capacity(weights.len() + 1);
    fractions.push((u32::from(MAIN_PANEL_WEIGHT), total));
    fractions.extend(weights.iter().map(|w| (u32::from(*w), total)));
    fractions
}

fn total_weight(visible: impl Iterator<Item = u16>) -> u32 {
    u32::from(MAIN_PANEL_WEIGHT) + visible.map(u32::from).sum::<u32>()
}
