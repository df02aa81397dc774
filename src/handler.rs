use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, InputMode};
use crate::tui::{AppEvent, Scroll};

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Scroll(direction) => handle_scroll(app, direction),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if !app.chat.is_open() {
        handle_page_keys(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_chat_normal(app, key),
        InputMode::Editing => handle_chat_editing(app, key),
    }
}

fn handle_page_keys(app: &mut App, key: KeyEvent) {
    let half_page = (app.page.height / 2).max(1);

    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('c') | KeyCode::Char('?') => app.open_chat(),

        KeyCode::Char('j') | KeyCode::Down => app.page.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.page.scroll_up(1),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.page.scroll_down(half_page)
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.page.scroll_up(half_page)
        }
        KeyCode::PageDown => app.page.scroll_down(half_page),
        KeyCode::PageUp => app.page.scroll_up(half_page),
        KeyCode::Char('g') | KeyCode::Home => app.page.scroll_to_top(),
        KeyCode::Char('G') | KeyCode::End => app.page.scroll_to_bottom(),
        _ => {}
    }
}

fn handle_chat_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Esc | KeyCode::Char('x') | KeyCode::Char('c') => app.close_chat(),
        KeyCode::Char('i') | KeyCode::Enter => app.input_mode = InputMode::Editing,
        KeyCode::Char('j') | KeyCode::Down => app.scroll_chat_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_chat_up(),
        KeyCode::Char('G') | KeyCode::End => app.scroll_chat_to_bottom(),
        _ => {}
    }
}

fn handle_chat_editing(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Esc {
        app.input_mode = InputMode::Normal;
        return;
    }

    // Input is disabled while a reply is on its way
    if app.chat.is_pending() {
        return;
    }

    match key.code {
        KeyCode::Enter => app.submit_draft(),
        KeyCode::Backspace => {
            if app.draft_cursor > 0 {
                app.draft_cursor -= 1;
                let byte_pos = char_to_byte_index(app.chat.draft(), app.draft_cursor);
                app.chat.draft_mut().remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.chat.draft().chars().count();
            if app.draft_cursor < char_count {
                let byte_pos = char_to_byte_index(app.chat.draft(), app.draft_cursor);
                app.chat.draft_mut().remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.draft_cursor = app.draft_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.chat.draft().chars().count();
            app.draft_cursor = (app.draft_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.draft_cursor = 0;
        }
        KeyCode::End => {
            app.draft_cursor = app.chat.draft().chars().count();
        }
        KeyCode::Char(c) => {
            let byte_pos = char_to_byte_index(app.chat.draft(), app.draft_cursor);
            app.chat.draft_mut().insert(byte_pos, c);
            app.draft_cursor += 1;
        }
        _ => {}
    }
}

fn handle_scroll(app: &mut App, direction: Scroll) {
    match (app.chat.is_open(), direction) {
        (true, Scroll::Up) => app.scroll_chat_up(),
        (true, Scroll::Down) => app.scroll_chat_down(),
        (false, Scroll::Up) => app.page.scroll_up(3),
        (false, Scroll::Down) => app.page.scroll_down(3),
    }
}
