use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use textbook_core::Sender;

use crate::app::{App, BackendStatus, InputMode};

const CHAT_WIDTH: u16 = 56;
const CHAT_HEIGHT: u16 = 24;

/// Parse a line of text and convert **bold** markdown to styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("**") {
        let after = &rest[start + 2..];
        match after.find("**") {
            Some(end) if end > 0 => {
                if start > 0 {
                    spans.push(Span::raw(rest[..start].to_string()));
                }
                spans.push(Span::styled(
                    after[..end].to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                ));
                rest = &after[end + 2..];
            }
            // No closing **, treat as literal
            _ => break,
        }
    }

    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }

    if spans.is_empty() {
        Line::default()
    } else {
        Line::from(spans)
    }
}

/// Page line with headings picked out
fn page_line(text: &str) -> Line<'static> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('#') {
        let heading = trimmed.trim_start_matches('#').trim();
        Line::from(Span::styled(
            heading.to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ))
    } else {
        parse_markdown_line(text)
    }
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_page(app, frame, body_area);

    if app.chat.is_open() {
        render_chat(app, frame, body_area);
    } else {
        render_launcher(frame, body_area);
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let (status_text, status_color) = match app.backend_status {
        BackendStatus::Online => ("● assistant online", Color::Green),
        BackendStatus::Offline => ("○ assistant offline", Color::Red),
        BackendStatus::Unknown => ("◌ checking assistant", Color::Gray),
    };

    let title = Line::from(vec![
        Span::styled(" Physical AI & Humanoid Robotics ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(format!("v{}", env!("CARGO_PKG_VERSION")), Style::default().fg(Color::Gray)),
        Span::raw("  "),
        Span::styled(status_text, Style::default().fg(status_color)),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_page(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if app.chat.is_open() { Color::DarkGray } else { Color::Cyan }))
        .title(format!(" {} ", app.page.title));

    app.page.height = area.height.saturating_sub(2);

    let lines: Vec<Line> = app.page.lines.iter().map(|l| page_line(l)).collect();
    let page = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.page.scroll, 0));

    frame.render_widget(page, area);
}

/// Floating button shown while the chat is closed
fn render_launcher(frame: &mut Frame, area: Rect) {
    let label = " ? Ask the assistant [c] ";
    let width = (label.chars().count() as u16).min(area.width.saturating_sub(2));
    if width == 0 || area.height < 3 {
        return;
    }

    let launcher_area = Rect::new(
        area.x + area.width.saturating_sub(width + 2),
        area.y + area.height.saturating_sub(2),
        width,
        1,
    );

    let launcher = Paragraph::new(label).style(Style::default().bg(Color::Blue).fg(Color::White).bold());
    frame.render_widget(launcher, launcher_area);
}

/// Chat panel anchored to the bottom-right corner of the page
fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let width = CHAT_WIDTH.min(area.width.saturating_sub(2));
    let height = CHAT_HEIGHT.min(area.height.saturating_sub(1));
    if width < 10 || height < 6 {
        return;
    }

    let popup_area = Rect::new(
        area.x + area.width.saturating_sub(width + 1),
        area.y + area.height.saturating_sub(height + 1),
        width,
        height,
    );

    // Clear the page behind the panel
    frame.render_widget(Clear, popup_area);

    let [chat_area, input_area] = Layout::vertical([Constraint::Min(0), Constraint::Length(3)]).areas(popup_area);

    // Store chat area dimensions for scroll calculations (inner size minus borders)
    app.chat_height = chat_area.height.saturating_sub(2);
    app.chat_width = chat_area.width.saturating_sub(2);

    let chat_border_color = if app.input_mode == InputMode::Normal {
        Color::Cyan
    } else {
        Color::DarkGray
    };

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(chat_border_color))
        .title(" Textbook Assistant ")
        .title_bottom(Line::from(" Esc then x to close ").right_aligned());

    let mut lines: Vec<Line> = Vec::new();

    for msg in app.chat.messages() {
        match msg.sender {
            Sender::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                for line in msg.text.lines() {
                    lines.push(Line::from(line.to_string()));
                }
            }
            Sender::Assistant => {
                lines.push(Line::from(Span::styled(
                    "Assistant:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                for line in msg.text.lines() {
                    lines.push(parse_markdown_line(line));
                }
                if !msg.sources.is_empty() {
                    let labels: Vec<String> = msg.sources.iter().map(|s| s.label()).collect();
                    lines.push(Line::from(Span::styled(
                        format!("Sources: {}", labels.join(", ")),
                        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
                    )));
                }
            }
        }
        lines.push(Line::default());
    }

    if app.chat.is_pending() {
        lines.push(Line::from(Span::styled(
            "Assistant:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Typing{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, chat_area);

    render_input(app, frame, input_area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let pending = app.chat.is_pending();

    let border_color = if pending {
        Color::DarkGray
    } else if editing {
        Color::Yellow
    } else {
        Color::Gray
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(if pending { " Waiting for reply... " } else { " Ask a question " });

    // Horizontal scrolling keeps the cursor inside the box
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.draft_cursor;
    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let input = if app.chat.draft().is_empty() && !editing {
        Paragraph::new(Span::styled(
            "Ask about Physical AI or Humanoid Robotics...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        let visible_text: String = app
            .chat
            .draft()
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .collect();
        Paragraph::new(visible_text).style(Style::default().fg(if pending { Color::DarkGray } else { Color::Cyan }))
    };

    frame.render_widget(input.block(input_block), area);

    if editing && !pending {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match (app.chat.is_open(), app.input_mode) {
        (false, _) => (" PAGE ", Style::default().bg(Color::Blue).fg(Color::White)),
        (true, InputMode::Normal) => (" CHAT ", Style::default().bg(Color::Magenta).fg(Color::White)),
        (true, InputMode::Editing) => (" TYPE ", Style::default().bg(Color::Yellow).fg(Color::Black)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = match (app.chat.is_open(), app.input_mode) {
        (false, _) => vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" g/G ", key_style),
            Span::styled(" top/bottom ", label_style),
            Span::styled(" c ", key_style),
            Span::styled(" assistant ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
        (true, InputMode::Normal) => vec![
            Span::styled(" j/k ", key_style),
            Span::styled(" scroll ", label_style),
            Span::styled(" i ", key_style),
            Span::styled(" type ", label_style),
            Span::styled(" x ", key_style),
            Span::styled(" close ", label_style),
            Span::styled(" q ", key_style),
            Span::styled(" quit ", label_style),
        ],
        (true, InputMode::Editing) => vec![
            Span::styled(" Enter ", key_style),
            Span::styled(" send ", label_style),
            Span::styled(" Esc ", key_style),
            Span::styled(" stop typing ", label_style),
        ],
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}
