//! Styles for the framed panels

use ratatui::style::{Color, Modifier, Style};

/// Styling for everything the framework itself draws. Widget interiors are
/// painted by their drawables and style themselves.
#[derive(Debug, Clone)]
pub struct Theme {
    pub panel_title: Style,
    pub panel_border: Style,
    pub main_text: Style,
    pub command_text: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            panel_title: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            panel_border: Style::default().fg(Color::DarkGray),
            main_text: Style::default().fg(Color::Reset),
            command_text: Style::default().fg(Color::Yellow),
        }
    }
}
