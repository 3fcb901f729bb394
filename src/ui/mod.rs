use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use regex::Regex;

use crate::app::dashboard::{count_badge, DELETE_PROMPT};
use crate::app::{
    AppState, DraftField, LoginField, NoticeKind, PostForm, PostMode, Route, SignupField,
    TextBuffer,
};
use crate::highlight::{build_highlight_regex, split_matches};
use crate::posts::preview::{footer_label, html_to_text, truncate_preview, DateStyle};
use crate::posts::Post;

/// Selection widgets that must survive between frames.
#[derive(Debug, Default)]
pub struct ListStates {
    pub home: ListState,
    pub dashboard: ListState,
}

pub fn draw_app(frame: &mut Frame, state: &AppState, lists: &mut ListStates) {
    let notice_rows = state.notices.iter().count() as u16;
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(notice_rows),
            Constraint::Min(3),
            Constraint::Length(2),
        ])
        .split(frame.size());

    render_nav(frame, state, vertical[0]);
    render_notices(frame, state, vertical[1]);

    match state.route() {
        Route::Home => render_home(frame, state, &mut lists.home, vertical[2]),
        Route::PostDetail(_) => render_detail(frame, state, vertical[2]),
        Route::Login => render_login(frame, state, vertical[2]),
        Route::Signup => render_signup(frame, state, vertical[2]),
        Route::NewPost => render_new_post(frame, state, vertical[2]),
        Route::Dashboard => render_dashboard(frame, state, &mut lists.dashboard, vertical[2]),
    }

    let status = Paragraph::new(build_status_line(state)).style(Style::default().fg(Color::Gray));
    frame.render_widget(status, vertical[3]);

    render_overlay(frame, state);
}

fn render_nav(frame: &mut Frame, state: &AppState, area: Rect) {
    let mut spans = Vec::new();
    for (index, action) in state.nav().actions().into_iter().enumerate() {
        let active = action.route().as_ref() == Some(state.route());
        let style = if active {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        spans.push(Span::styled(format!("[{}] ", index + 1), Style::default().fg(Color::Gray)));
        spans.push(Span::styled(action.to_string(), style));
        spans.push(Span::raw("   "));
    }
    if let Some(username) = state.username() {
        spans.push(Span::styled(
            format!("Signed in as {username}"),
            Style::default().fg(Color::Green),
        ));
    }
    let nav = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .title("Blog")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(nav, area);
}

fn render_notices(frame: &mut Frame, state: &AppState, area: Rect) {
    if area.height == 0 {
        return;
    }
    let lines: Vec<Line> = state
        .notices
        .iter()
        .map(|notice| {
            let style = match notice.kind {
                NoticeKind::Error => Style::default().fg(Color::White).bg(Color::Red),
                NoticeKind::Success => Style::default().fg(Color::Black).bg(Color::Green),
            };
            Line::from(Span::styled(format!(" {} ", notice.text), style))
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_home(frame: &mut Frame, state: &AppState, list_state: &mut ListState, area: Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3)])
        .split(area);

    let home = &state.home;
    let query = home.feed.query();
    let mut search_text = query.to_string();
    if home.searching {
        search_text.push('▌');
    } else if query.is_empty() {
        search_text = "Press / to search by title, content or author".into();
    }
    let search_style = if home.searching {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let search = Paragraph::new(search_text).block(
        Block::default()
            .title("Search")
            .borders(Borders::ALL)
            .border_style(search_style),
    );
    frame.render_widget(search, rows[0]);

    let block = Block::default().title("Latest Posts").borders(Borders::ALL);
    if home.loading && home.feed.posts().is_empty() {
        frame.render_widget(Paragraph::new("Loading posts...").block(block), rows[1]);
        return;
    }
    if home.feed.visible_len() == 0 {
        let empty = if query.is_empty() {
            vec![Line::from("There are no posts available")]
        } else {
            vec![
                Line::from(Span::styled(
                    "No posts found",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    "Try a different search term",
                    Style::default().fg(Color::Gray),
                )),
            ]
        };
        frame.render_widget(Paragraph::new(empty).block(block), rows[1]);
        return;
    }

    let regex = build_highlight_regex(query);
    let width = rows[1].width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = home
        .feed
        .visible()
        .map(|post| feed_card(post, regex.as_ref(), state.preview_chars(), width))
        .collect();
    list_state.select(Some(home.selected.min(items.len() - 1)));
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("▸ ");
    frame.render_stateful_widget(list, rows[1], list_state);
}

fn feed_card(post: &Post, regex: Option<&Regex>, preview_chars: usize, width: usize) -> ListItem<'static> {
    let title = Line::from(highlight_line(
        &post.title,
        regex,
        highlight_style(),
        Style::default().add_modifier(Modifier::BOLD),
    ));
    let meta = Line::from(Span::styled(
        format!(
            "by {} • {}",
            post.author_label(),
            post.created_label(DateStyle::Day)
        ),
        Style::default().fg(Color::Gray),
    ));
    let mut lines = vec![title, meta];
    let preview = truncate_preview(&post.content, preview_chars).replace('\n', " ");
    lines.extend(wrap_plain(&preview, width).into_iter().map(Line::from));
    lines.push(Line::from(""));
    ListItem::new(Text::from(lines))
}

fn render_detail(frame: &mut Frame, state: &AppState, area: Rect) {
    let block = Block::default().title("Post").borders(Borders::ALL);
    let Some(post) = state.detail_post() else {
        frame.render_widget(Paragraph::new("Post not found.").block(block), area);
        return;
    };
    let mut lines = vec![
        Line::from(Span::styled(
            post.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(
                "by {} • {}",
                post.author_label(),
                post.created_label(DateStyle::Day)
            ),
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
    ];
    lines.extend(html_to_text(&post.content).lines().map(|line| Line::from(line.to_string())));
    let detail = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(detail, area);
}

fn render_login(frame: &mut Frame, state: &AppState, area: Rect) {
    let form = &state.login;
    let area = centered_rect(60, 80, area);
    let fields = [
        ("Email", form.email.clone(), form.focus == LoginField::Email),
        ("Password", masked(&form.password), form.focus == LoginField::Password),
    ];
    let button = if form.submitting { "Logging in..." } else { "Enter to log in" };
    render_form(frame, area, "Login", &fields, button);
}

fn render_signup(frame: &mut Frame, state: &AppState, area: Rect) {
    let form = &state.signup;
    let area = centered_rect(60, 80, area);
    let fields = [
        ("Username", form.username.clone(), form.focus == SignupField::Username),
        ("Email", form.email.clone(), form.focus == SignupField::Email),
        ("Password", masked(&form.password), form.focus == SignupField::Password),
    ];
    let button = if form.submitting { "Signing up..." } else { "Enter to sign up" };
    render_form(frame, area, "Sign Up", &fields, button);
}

/// Single-line credential fields stacked in a bordered box, with the cursor
/// parked at the end of the focused one.
fn render_form(frame: &mut Frame, area: Rect, title: &str, fields: &[(&str, String, bool)], hint: &str) {
    let mut constraints: Vec<Constraint> = fields.iter().map(|_| Constraint::Length(3)).collect();
    constraints.push(Constraint::Length(1));
    constraints.push(Constraint::Min(0));
    let outer = Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = outer.inner(area);
    frame.render_widget(outer, area);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (index, (label, value, focused)) in fields.iter().enumerate() {
        let style = if *focused {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        let input = Paragraph::new(value.clone()).block(
            Block::default()
                .title(label.to_string())
                .borders(Borders::ALL)
                .border_style(style),
        );
        frame.render_widget(input, rows[index]);
        if *focused {
            let col = UnicodeWidthStr::width(value.as_str()) as u16;
            let max = rows[index].width.saturating_sub(2);
            frame.set_cursor(rows[index].x + 1 + col.min(max), rows[index].y + 1);
        }
    }
    frame.render_widget(
        Paragraph::new(Span::styled(hint.to_string(), Style::default().fg(Color::Gray))),
        rows[fields.len()],
    );
}

fn render_new_post(frame: &mut Frame, state: &AppState, area: Rect) {
    let form = &state.new_post;
    let status = if form.submitting {
        "Publishing..."
    } else if form.can_publish() {
        "Ctrl-s to publish"
    } else {
        "Title and content are required"
    };
    render_post_form(frame, form, area, "Create New Post", status);
}

fn render_post_form(frame: &mut Frame, form: &PostForm, area: Rect, title: &str, status: &str) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3), Constraint::Length(1)])
        .split(area);

    let focus_style = |field: DraftField| {
        if form.focus == field {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        }
    };

    let title_input = Paragraph::new(form.title.clone()).block(
        Block::default()
            .title(format!("{title} · Title"))
            .borders(Borders::ALL)
            .border_style(focus_style(DraftField::Title)),
    );
    frame.render_widget(title_input, rows[0]);

    let content = Paragraph::new(form.content.text().to_string())
        .block(
            Block::default()
                .title(if form.content.is_dirty() {
                    "Content (modified)"
                } else {
                    "Content"
                })
                .borders(Borders::ALL)
                .border_style(focus_style(DraftField::Content)),
        )
        .wrap(Wrap { trim: false });
    frame.render_widget(content, rows[1]);

    frame.render_widget(
        Paragraph::new(Span::styled(status.to_string(), Style::default().fg(Color::Gray))),
        rows[2],
    );

    match form.focus {
        DraftField::Title => {
            let col = UnicodeWidthStr::width(form.title.as_str()) as u16;
            let max = rows[0].width.saturating_sub(3);
            frame.set_cursor(rows[0].x + 1 + col.min(max), rows[0].y + 1);
        }
        DraftField::Content => {
            if let Some((x, y)) = editor_cursor_screen_position(&form.content, rows[1]) {
                frame.set_cursor(x, y);
            }
        }
    }
}

fn render_dashboard(frame: &mut Frame, state: &AppState, list_state: &mut ListState, area: Rect) {
    let dashboard = &state.dashboard;
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let title = format!("My Posts ({})", count_badge(dashboard.posts().len()));
    let block = Block::default().title(title).borders(Borders::ALL);
    if dashboard.loading && dashboard.posts().is_empty() {
        frame.render_widget(Paragraph::new("Loading your posts...").block(block), columns[0]);
    } else if dashboard.posts().is_empty() {
        let empty = vec![
            Line::from(Span::styled(
                "You don't have any posts yet",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Create your first post to get started",
                Style::default().fg(Color::Gray),
            )),
        ];
        frame.render_widget(Paragraph::new(empty).block(block), columns[0]);
    } else {
        let items: Vec<ListItem> = dashboard
            .posts()
            .iter()
            .map(|post| {
                let mut title = vec![Span::styled(
                    post.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )];
                if dashboard.mode_of(&post.id) == PostMode::Editing {
                    title.insert(
                        0,
                        Span::styled(
                            "[EDIT] ",
                            Style::default()
                                .fg(Color::Magenta)
                                .add_modifier(Modifier::BOLD),
                        ),
                    );
                }
                if dashboard.is_deleting(&post.id) {
                    title.push(Span::styled(" (deleting...)", Style::default().fg(Color::Red)));
                }
                ListItem::new(Text::from(vec![
                    Line::from(title),
                    Line::from(Span::styled(
                        footer_label(post),
                        Style::default().fg(Color::Gray),
                    )),
                    Line::from(""),
                ]))
            })
            .collect();
        list_state.select(Some(dashboard.selected.min(items.len() - 1)));
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol("▸ ");
        frame.render_stateful_widget(list, columns[0], list_state);
    }

    if let Some(edit) = dashboard.edit_session() {
        let status = if edit.form.submitting {
            "Saving..."
        } else {
            "Ctrl-s to save • Esc to cancel"
        };
        render_post_form(frame, &edit.form, columns[1], "Edit Post", status);
        return;
    }

    let preview = match dashboard.selected_post() {
        Some(post) => {
            let mut lines = vec![
                Line::from(Span::styled(
                    post.title.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
            ];
            lines.extend(html_to_text(&post.content).lines().map(|line| Line::from(line.to_string())));
            Text::from(lines)
        }
        None => Text::from(""),
    };
    let preview = Paragraph::new(preview)
        .block(Block::default().title("Preview").borders(Borders::ALL))
        .wrap(Wrap { trim: false });
    frame.render_widget(preview, columns[1]);
}

fn build_status_line(state: &AppState) -> Text<'static> {
    let hints = match state.route() {
        _ if state.dashboard.pending_delete().is_some() => "y/Enter delete • n/Esc keep",
        Route::Home if state.home.searching => "type to filter • Enter done • Esc clear",
        Route::Home => "j/k move • Enter open • / search • r reload • q quit",
        Route::PostDetail(_) => "Esc back • q quit",
        Route::Login | Route::Signup => "Tab next field • Enter submit • Esc back",
        Route::NewPost => "Tab switch field • Ctrl-s publish • Ctrl-z undo • Esc back",
        Route::Dashboard if state.dashboard.is_editing() => {
            "Tab switch field • Ctrl-s save • Esc cancel"
        }
        Route::Dashboard => "j/k move • e edit • d delete • r reload • q quit",
    };

    let mut spans = vec![Span::styled(
        state.route().title().to_string(),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if let Route::Home = state.route() {
        let feed = &state.home.feed;
        spans.push(Span::raw(format!(
            " | {}/{}",
            feed.visible_len(),
            feed.posts().len()
        )));
    }
    if state.has_pending_redirect() {
        spans.push(Span::styled(" | redirecting...", Style::default().fg(Color::Yellow)));
    }
    if state.notices.error().is_some() {
        spans.push(Span::raw(" | Ctrl-x dismiss"));
    }
    Text::from(vec![Line::from(spans), Line::from(hints)])
}

fn render_overlay(frame: &mut Frame, state: &AppState) {
    let Some(pending) = state.dashboard.pending_delete() else {
        return;
    };
    let area = centered_rect(60, 30, frame.size());
    frame.render_widget(Clear, area);
    let paragraph = Paragraph::new(vec![
        Line::from(Span::styled(
            DELETE_PROMPT,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("\"{}\"", pending.title),
            Style::default().fg(Color::Gray),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "y to delete • n to keep",
            Style::default().fg(Color::Gray),
        )),
    ])
    .block(
        Block::default()
            .title("Delete Post")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red)),
    )
    .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn highlight_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

fn highlight_line(
    text: &str,
    regex: Option<&Regex>,
    highlight_style: Style,
    base_style: Style,
) -> Vec<Span<'static>> {
    split_matches(text, regex)
        .into_iter()
        .map(|(piece, hit)| {
            let style = if hit { highlight_style } else { base_style };
            Span::styled(piece.to_string(), style)
        })
        .collect()
}

fn masked(secret: &str) -> String {
    "•".repeat(secret.chars().count())
}

/// Greedy word wrap for card previews, which live inside list items and so
/// cannot use paragraph wrapping.
fn wrap_plain(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.width()
        } else {
            current.width() + 1 + word.width()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn editor_cursor_screen_position(buffer: &TextBuffer, area: Rect) -> Option<(u16, u16)> {
    let inner_width = area.width.saturating_sub(2);
    let inner_height = area.height.saturating_sub(2);
    if inner_width == 0 || inner_height == 0 {
        return None;
    }

    let mut row = 0u16;
    let mut col = 0usize;
    let width_limit = inner_width as usize;
    let text = buffer.text();
    let cursor = buffer.cursor().min(text.len());

    for grapheme in text[..cursor].graphemes(true) {
        if grapheme == "\n" {
            row += 1;
            col = 0;
            continue;
        }
        let glyph_width = UnicodeWidthStr::width(grapheme);
        if glyph_width > 0 && col + glyph_width > width_limit {
            row += 1;
            col = 0;
        }
        col += glyph_width;
    }

    let row = row.min(inner_height - 1);
    let col = col.min(width_limit - 1) as u16;
    Some((area.x + 1 + col, area.y + 1 + row))
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedOptions;
    use crate::posts::PostId;
    use crate::session::SessionHandle;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use time::macros::datetime;

    fn span_texts(spans: &[Span<'static>]) -> Vec<String> {
        spans
            .iter()
            .map(|span| span.content.clone().into_owned())
            .collect()
    }

    fn post(id: &str, title: &str, content: &str) -> Post {
        Post {
            id: PostId::new(id),
            title: title.into(),
            content: content.into(),
            author_name: None,
            created_at: datetime!(2024-01-05 15:07 UTC),
            updated_at: datetime!(2024-01-05 15:07 UTC),
            created_at_raw: None,
        }
    }

    fn render(state: &AppState) -> anyhow::Result<String> {
        let mut terminal = Terminal::new(TestBackend::new(100, 30))?;
        let mut lists = ListStates::default();
        terminal.draw(|frame| draw_app(frame, state, &mut lists))?;
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer.get(x, y).symbol());
            }
            out.push('\n');
        }
        Ok(out)
    }

    #[test]
    fn highlight_splits_title_around_matches() {
        let regex = build_highlight_regex("rust").expect("regex");
        let spans = highlight_line("Rust and rustc", Some(&regex), Style::default(), Style::default());
        assert_eq!(span_texts(&spans), ["Rust", " and ", "rust", "c"]);
    }

    #[test]
    fn passwords_are_masked_per_character() {
        assert_eq!(masked("pässwd"), "••••••");
        assert_eq!(masked(""), "");
    }

    #[test]
    fn preview_wraps_on_word_boundaries() {
        assert_eq!(
            wrap_plain("one two three four", 9),
            ["one two", "three", "four"]
        );
    }

    #[test]
    fn cursor_follows_newlines_and_wraps() {
        let mut buffer = TextBuffer::new("");
        for ch in "ab".chars() {
            buffer.insert_char(ch);
        }
        buffer.insert_newline();
        buffer.insert_char('c');
        let area = Rect::new(0, 0, 10, 6);
        assert_eq!(editor_cursor_screen_position(&buffer, area), Some((2, 2)));

        let mut long = TextBuffer::new("");
        for ch in "abcdefghij".chars() {
            long.insert_char(ch);
        }
        assert_eq!(editor_cursor_screen_position(&long, area), Some((3, 2)));
    }

    #[test]
    fn home_renders_cards_and_guest_nav() -> anyhow::Result<()> {
        let mut state = AppState::new(SessionHandle::in_memory(), FeedOptions::default());
        state
            .home
            .feed
            .replace_posts(vec![post("1", "Hello terminal", "<p>First <b>post</b></p>")]);
        let screen = render(&state)?;
        assert!(screen.contains("Hello terminal"));
        assert!(screen.contains("by Anonymous • Jan 5, 2024"));
        assert!(screen.contains("First post"));
        assert!(screen.contains("[3] Sign Up"));
        assert!(!screen.contains("Logout"));
        Ok(())
    }

    #[test]
    fn empty_search_result_says_so() -> anyhow::Result<()> {
        let mut state = AppState::new(SessionHandle::in_memory(), FeedOptions::default());
        state.home.feed.replace_posts(vec![post("1", "Hello", "")]);
        state.home.push_search_char('z');
        let screen = render(&state)?;
        assert!(screen.contains("No posts found"));
        assert!(screen.contains("Try a different search term"));
        Ok(())
    }

    #[test]
    fn search_over_an_empty_feed_still_says_no_posts_found() -> anyhow::Result<()> {
        let mut state = AppState::new(SessionHandle::in_memory(), FeedOptions::default());
        state.home.push_search_char('z');
        let screen = render(&state)?;
        assert!(screen.contains("No posts found"));
        assert!(!screen.contains("There are no posts available"));
        Ok(())
    }

    #[test]
    fn unreadable_creation_date_shows_the_sentinel_on_the_card() -> anyhow::Result<()> {
        let mut state = AppState::new(SessionHandle::in_memory(), FeedOptions::default());
        let record = crate::api::testing::record(serde_json::json!({
            "id": 9, "title": "Odd date", "content": "x", "createdAt": "garbage"
        }));
        let now = time::OffsetDateTime::now_utc();
        state
            .home
            .feed
            .replace_posts(vec![crate::posts::normalize(record, now)]);
        let screen = render(&state)?;
        assert!(screen.contains("by Anonymous • Date not available"));
        Ok(())
    }

    #[test]
    fn signed_in_nav_shows_username_and_logout() -> anyhow::Result<()> {
        let session = SessionHandle::in_memory();
        session.login("tok", "ada")?;
        let state = AppState::new(session, FeedOptions::default());
        let screen = render(&state)?;
        assert!(screen.contains("Signed in as ada"));
        assert!(screen.contains("[4] Logout"));
        Ok(())
    }
}
