use std::path::{Path, PathBuf};

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Widget},
};

use crate::app::{AppMode, DialogKind, DialogState};

/// Dialog widget that renders a centered modal overlay.
pub struct DialogWidget<'a> {
    mode: &'a AppMode,
    dialog_state: &'a DialogState,
}

impl<'a> DialogWidget<'a> {
    pub fn new(mode: &'a AppMode, dialog_state: &'a DialogState) -> Self {
        Self { mode, dialog_state }
    }

    /// Calculate a centered rectangle within the given area.
    fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
        let x = area.x + area.width.saturating_sub(width) / 2;
        let y = area.y + area.height.saturating_sub(height) / 2;
        let w = width.min(area.width);
        let h = height.min(area.height);
        Rect::new(x, y, w, h)
    }
}

impl<'a> Widget for DialogWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let AppMode::Dialog(kind) = self.mode else {
            return;
        };

        match kind {
            DialogKind::Input { title, targets, .. } => {
                render_input_dialog(title, targets, self.dialog_state, area, buf);
            }
            DialogKind::Confirm { title, targets, .. } => {
                render_confirm_dialog(title, targets, area, buf);
            }
            DialogKind::Error { message } => {
                render_error_dialog(message, area, buf);
            }
        }
    }
}

fn hint_line(hint: &str) -> Line<'_> {
    let style = Style::default()
        .fg(Color::DarkGray)
        .add_modifier(Modifier::DIM);
    Line::from(Span::styled(hint, style))
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Split `input` around the char at byte offset `cursor`.
fn split_at_cursor(input: &str, cursor: usize) -> (&str, &str, &str) {
    let before = &input[..cursor];
    match input[cursor..].chars().next() {
        Some(c) => {
            let end = cursor + c.len_utf8();
            (before, &input[cursor..end], &input[end..])
        }
        None => (before, " ", ""),
    }
}

fn render_input_dialog(
    title: &str,
    targets: &[PathBuf],
    state: &DialogState,
    area: Rect,
    buf: &mut Buffer,
) {
    let dialog_width = 60.min(area.width.saturating_sub(4));
    let dialog_height = 6;
    let rect = DialogWidget::centered_rect(dialog_width, dialog_height, area);

    Clear.render(rect, buf);

    let block = Block::default()
        .title(format!(" {} ", title))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .padding(Padding::horizontal(1));

    let inner = block.inner(rect);
    block.render(rect, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    // Context: what the answer applies to.
    let context = match targets {
        [] => String::new(),
        [only] => display_path(only),
        [first, rest @ ..] => format!("{} (+{} more)", display_path(first), rest.len()),
    };
    let context_line = Line::from(Span::styled(context, Style::default().fg(Color::Gray)));
    buf.set_line(inner.x, inner.y, &context_line, inner.width);

    let (before, cursor_char, after) = split_at_cursor(&state.input, state.cursor_position);

    // Keep the cursor in view by dropping chars from the left.
    let max_width = inner.width as usize;
    let overflow = (before.chars().count() + 1).saturating_sub(max_width);
    let before_display: String = before.chars().skip(overflow).collect();

    let input_style = Style::default().fg(Color::White);
    let cursor_style = Style::default()
        .bg(Color::White)
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD);

    let line = Line::from(vec![
        Span::styled(before_display, input_style),
        Span::styled(cursor_char, cursor_style),
        Span::styled(after, input_style),
    ]);
    if inner.height > 1 {
        buf.set_line(inner.x, inner.y + 1, &line, inner.width);
    }

    if inner.height > 2 {
        buf.set_line(
            inner.x,
            inner.y + inner.height - 1,
            &hint_line("[Enter] Confirm  [Esc] Cancel"),
            inner.width,
        );
    }
}

/// `len + pad` clamped to the `u16` range of terminal cells.
fn padded(len: usize, pad: u16) -> u16 {
    u16::try_from(len).unwrap_or(u16::MAX).saturating_add(pad)
}

fn render_confirm_dialog(title: &str, targets: &[PathBuf], area: Rect, buf: &mut Buffer) {
    let max_name_len = targets
        .iter()
        .map(|p| p.to_string_lossy().chars().count())
        .max()
        .unwrap_or(10);

    let dialog_width = padded(max_name_len, 10)
        .max(40)
        .min(area.width.saturating_sub(4));
    let dialog_height = padded(targets.len(), 6).min(area.height.saturating_sub(2));
    let rect = DialogWidget::centered_rect(dialog_width, dialog_height, area);

    Clear.render(rect, buf);

    let block = Block::default()
        .title(" Confirm ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .padding(Padding::horizontal(1));

    let inner = block.inner(rect);
    block.render(rect, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let header = Line::from(Span::styled(
        title,
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ));
    buf.set_line(inner.x, inner.y, &header, inner.width);

    let max_items = (inner.height.saturating_sub(3)) as usize;
    for (i, target) in targets.iter().take(max_items).enumerate() {
        let line = Line::from(Span::styled(
            format!("  • {}", display_path(target)),
            Style::default().fg(Color::White),
        ));
        buf.set_line(inner.x, inner.y + 2 + i as u16, &line, inner.width);
    }

    buf.set_line(
        inner.x,
        inner.y + inner.height - 1,
        &hint_line("[y] Yes  [n/Esc] Cancel"),
        inner.width,
    );
}

fn render_error_dialog(message: &str, area: Rect, buf: &mut Buffer) {
    let dialog_width = padded(message.chars().count(), 6)
        .max(30)
        .min(area.width.saturating_sub(4));
    let dialog_height = 5;
    let rect = DialogWidget::centered_rect(dialog_width, dialog_height, area);

    Clear.render(rect, buf);

    let block = Block::default()
        .title(" Error ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .padding(Padding::horizontal(1));

    let inner = block.inner(rect);
    block.render(rect, buf);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    let msg_line = Line::from(Span::styled(message, Style::default().fg(Color::Red)));
    buf.set_line(inner.x, inner.y + inner.height / 2, &msg_line, inner.width);

    if inner.height > 1 {
        buf.set_line(
            inner.x,
            inner.y + inner.height - 1,
            &hint_line("[Enter/Esc] Dismiss"),
            inner.width,
        );
    }
}
