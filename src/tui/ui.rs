use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
    Frame,
};

use super::app::{App, AppMode};
use crate::core::SessionStatus;

struct Palette {
    accent: Color,
    text: Color,
    muted: Color,
}

impl Palette {
    fn for_theme(theme: &str) -> Self {
        match theme {
            "light" => Self {
                accent: Color::Magenta,
                text: Color::Black,
                muted: Color::DarkGray,
            },
            _ => Self {
                accent: Color::LightMagenta,
                text: Color::White,
                muted: Color::Gray,
            },
        }
    }
}

/// Main draw function
pub fn draw(frame: &mut Frame, app: &App) {
    let palette = Palette::for_theme(&app.theme);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            // Title/input
            Constraint::Length(3),
            // Source + result
            Constraint::Min(7),
            Constraint::Length(samples_height(app.samples.len())),
            // Status bar
            Constraint::Length(3),
            // Help line
            Constraint::Length(1),
        ])
        .split(frame.area());

    if app.mode == AppMode::Input {
        draw_input(frame, app, chunks[0]);
    } else {
        draw_title(frame, &palette, chunks[0]);
    }

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    draw_source(frame, app, &palette, panels[0]);
    draw_result(frame, app, &palette, panels[1]);

    draw_samples(frame, app, &palette, chunks[2]);
    draw_status(frame, app, &palette, chunks[3]);
    draw_help(frame, app, &palette, chunks[4]);
}

fn draw_title(frame: &mut Frame, palette: &Palette, area: Rect) {
    let title = Paragraph::new(vec![Line::from(vec![
        Span::styled(
            "Cartoon Avatar Generator",
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(" - powered by Gemini", Style::default().fg(palette.muted)),
    ])])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.accent)),
    );
    frame.render_widget(title, area);
}

fn draw_input(frame: &mut Frame, app: &App, area: Rect) {
    let input = Paragraph::new(app.input.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title("Photo path (Enter to open, Esc to cancel)"),
    );
    frame.render_widget(input, area);

    // Show cursor
    let column = u16::try_from(app.cursor_pos).unwrap_or(u16::MAX);
    frame.set_cursor_position((area.x.saturating_add(column).saturating_add(1), area.y + 1));
}

fn draw_source(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let label = |text: &'static str| Span::styled(text, Style::default().fg(palette.muted));

    let lines = match (app.session.source_image(), app.session.preview()) {
        (Some(source), _) => vec![
            Line::from(vec![label("Name: "), Span::raw(source.name.clone())]),
            Line::from(vec![label("Type: "), Span::raw(source.mime_type.clone())]),
            Line::from(vec![label("Size: "), Span::raw(format_size(source.size()))]),
            Line::from(vec![label("From: "), Span::raw(source.preview.clone())]),
        ],
        (None, Some(preview)) => vec![
            Line::from(Span::styled("Loading sample...", Style::default().fg(Color::Yellow))),
            Line::from(Span::raw(preview.to_string())),
        ],
        (None, None) => vec![
            Line::from(Span::styled("No photo selected", Style::default().fg(palette.muted))),
            Line::from(""),
            Line::from("Press o to open a photo, or pick a sample below"),
            Line::from(Span::styled("PNG, JPG, WEBP, etc.", Style::default().fg(palette.muted))),
        ],
    };

    let panel = Paragraph::new(lines)
        .style(Style::default().fg(palette.text))
        .block(Block::default().borders(Borders::ALL).title("Photo"))
        .wrap(Wrap { trim: true });
    frame.render_widget(panel, area);
}

fn draw_result(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let lines = match (app.session.status(), app.session.result()) {
        (SessionStatus::Loading, _) => vec![Line::from(Span::styled(
            "Generating your avatar...",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::SLOW_BLINK),
        ))],
        (_, Some(result)) => {
            let mut lines = vec![
                Line::from(Span::styled(
                    "Your avatar is ready",
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    format!("{} encoded", format_size(result.payload().len())),
                    Style::default().fg(palette.muted),
                )),
                Line::from(Span::styled(
                    format!("Generated at {}", result.generated_at.format("%H:%M:%S")),
                    Style::default().fg(palette.muted),
                )),
            ];
            match &app.saved_path {
                Some(path) => lines.push(Line::from(format!("Saved: {}", path.display()))),
                None => lines.push(Line::from("Press d to download")),
            }
            lines
        }
        _ => vec![Line::from(Span::styled(
            "Your generated avatar will appear here",
            Style::default().fg(palette.muted),
        ))],
    };

    let panel = Paragraph::new(lines)
        .style(Style::default().fg(palette.text))
        .block(Block::default().borders(Borders::ALL).title("Avatar"))
        .wrap(Wrap { trim: true });
    frame.render_widget(panel, area);
}

fn draw_samples(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let items: Vec<ListItem> = app
        .samples
        .iter()
        .enumerate()
        .map(|(i, url)| {
            let style = if i == app.selected_sample {
                Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(palette.text)
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!("{:>2}. ", i + 1), Style::default().fg(palette.muted)),
                Span::styled(url.clone(), style),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Or try one of our samples"),
    );
    frame.render_widget(list, area);
}

fn draw_status(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let (message, style) = if let Some(err) = app.session.error() {
        (format!("Error: {}", err), Style::default().fg(Color::Red))
    } else if let Some(err) = &app.error_message {
        (format!("Error: {}", err), Style::default().fg(Color::Red))
    } else if let Some(status) = &app.status_message {
        (status.clone(), Style::default().fg(Color::Green))
    } else if app.session.is_loading() {
        ("Working...".to_string(), Style::default().fg(Color::Yellow))
    } else {
        ("Ready".to_string(), Style::default().fg(palette.muted))
    };

    let status = Paragraph::new(message)
        .style(style)
        .block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(status, area);
}

fn draw_help(frame: &mut Frame, app: &App, palette: &Palette, area: Rect) {
    let help_text = match app.mode {
        AppMode::Input => "Enter: Open | Esc: Cancel".to_string(),
        AppMode::Main => {
            let generate = if app.session.can_generate() { "g: Generate | " } else { "" };
            let download = if app.session.can_download() { "d: Download | " } else { "" };
            format!(
                "o: Open photo | 1-9/Enter: Sample | {}{}x: Clear | q: Quit",
                generate, download
            )
        }
    };

    let help = Paragraph::new(help_text).style(Style::default().fg(palette.muted));
    frame.render_widget(help, area);
}

/// Sample list rows plus its border
fn samples_height(count: usize) -> u16 {
    u16::try_from(count).unwrap_or(u16::MAX).saturating_add(2)
}

fn format_size(bytes: usize) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}
