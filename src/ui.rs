use ratatui::{
    layout::{Constraint, Direction, Layout},
    widgets::{Block, Borders},
    Frame,
};

use crate::app::App;
use crate::components::dialog::DialogWidget;
use crate::components::status_bar::StatusBarWidget;
use crate::components::tree::TreeWidget;

/// Render the application UI.
pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    // Keep the cursor row visible; the border takes two rows.
    let visible_height = chunks[0].height.saturating_sub(2) as usize;
    app.panel.update_scroll(visible_height);

    let root = app.tree.root_path();
    let title = format!(" {} ", app.tree.root().name());
    let block = Block::default().title(title).borders(Borders::ALL);
    let tree_widget = TreeWidget::new(&app.panel, &app.tree.settings().dir_suffix).block(block);
    frame.render_widget(tree_widget, chunks[0]);

    let path_str = root.to_string_lossy();
    let position = format!("{}/{}", app.panel.cursor + 1, app.panel.lines.len());
    let selected = app.tree.selected().len();
    let selection_info = format!("{selected} selected");
    let registry_info = format!("{} in registry", app.tree.registry().len());

    let mut status = StatusBarWidget::new(&path_str, &position);
    if let Some((msg, _)) = &app.status_message {
        status = status.status_message(msg);
    }
    if selected > 0 {
        status = status.selection_info(&selection_info);
    }
    if !app.tree.registry().is_empty() {
        status = status.registry_info(&registry_info);
    }
    frame.render_widget(status, chunks[1]);

    frame.render_widget(DialogWidget::new(&app.mode, &app.dialog_state), area);
}
