use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color as TermColor, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
};
use swatch::{Color, Feedback, Phase, SessionView};

use crate::App;

const HORIZONTAL_MARGIN: u16 = 2;
pub const OPTION_COLUMNS: usize = 3;
const OPTION_ROW_HEIGHT: u16 = 3;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let view = &self.view;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(1), // title + feedback
                Constraint::Length(1), // padding
                Constraint::Length(2), // stats
                Constraint::Min(0),    // round or game over
                Constraint::Length(1), // legend
            ])
            .split(area);

        render_header(view, chunks[0], buf);
        render_stats(view, chunks[2], buf);

        match view.phase {
            Phase::Playing => render_round(self, chunks[3], buf),
            Phase::Finished => render_game_over(self, chunks[3], buf),
        }

        let legend = match view.phase {
            Phase::Playing => "1-9 pick · arrows + enter pick · r restart · esc quit",
            Phase::Finished => "enter / r play again · esc quit",
        };
        Paragraph::new(Span::styled(
            legend,
            Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
        ))
        .alignment(Alignment::Center)
        .render(chunks[4], buf);
    }
}

fn feedback_span(feedback: Option<Feedback>) -> Span<'static> {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    match feedback {
        Some(Feedback::Correct) => Span::styled("✓ Correct", bold.fg(TermColor::Green)),
        Some(Feedback::Wrong) => Span::styled("✗ Wrong", bold.fg(TermColor::Red)),
        Some(Feedback::Timeout) => Span::styled("⏱ Timeout", bold.fg(TermColor::Yellow)),
        None => Span::raw(""),
    }
}

fn render_header(view: &SessionView, area: Rect, buf: &mut Buffer) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    Paragraph::new(Span::styled(
        "COLOR GAME",
        Style::default()
            .fg(TermColor::Cyan)
            .add_modifier(Modifier::BOLD),
    ))
    .render(halves[0], buf);

    Paragraph::new(feedback_span(view.feedback))
        .alignment(Alignment::Right)
        .render(halves[1], buf);
}

fn render_stats(view: &SessionView, area: Rect, buf: &mut Buffer) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    let stats = [
        ("TIME", format!("{:.1}", view.time_remaining)),
        ("ROUND", format!("{}/{}", view.round_index, view.max_rounds)),
        ("SCORE", view.score.to_string()),
        ("BEST", view.best_score.to_string()),
    ];

    for ((label, value), column) in stats.into_iter().zip(columns.iter()) {
        Paragraph::new(vec![
            Line::from(Span::styled(
                label,
                Style::default().add_modifier(Modifier::DIM),
            )),
            Line::from(Span::styled(
                value,
                Style::default().add_modifier(Modifier::BOLD),
            )),
        ])
        .alignment(Alignment::Center)
        .render(*column, buf);
    }
}

/// Readable text color over a swatch
fn contrast(color: Color) -> TermColor {
    if color.luminance() > 0.5 {
        TermColor::Black
    } else {
        TermColor::White
    }
}

fn render_round(app: &App, area: Rect, buf: &mut Buffer) {
    let view = &app.view;
    let rows = view.options.len().div_ceil(OPTION_COLUMNS) as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // padding
            Constraint::Length(1), // countdown
            Constraint::Length(1), // padding
            Constraint::Min(3),    // swatch
            Constraint::Length(1), // padding
            Constraint::Length(rows * OPTION_ROW_HEIGHT),
        ])
        .split(area);

    Gauge::default()
        .ratio(view.time_ratio.clamp(0.0, 1.0))
        .gauge_style(Style::default().fg(TermColor::Magenta))
        .label("")
        .render(chunks[1], buf);

    if let Some(target) = view.target {
        let swatch = chunks[3];
        // the target is only ever shown as a background, never spelled out
        let mut lines = vec![Line::from(""); (swatch.height.saturating_sub(1) / 2) as usize];
        lines.push(Line::from(Span::styled(
            "WHAT COLOR IS THIS?",
            Style::default()
                .fg(contrast(target))
                .add_modifier(Modifier::BOLD),
        )));
        Paragraph::new(lines)
            .style(Style::default().bg(target.into()))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(swatch, buf);
    }

    render_options(app, chunks[5], buf);
}

fn render_options(app: &App, area: Rect, buf: &mut Buffer) {
    let view = &app.view;
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            view.options
                .chunks(OPTION_COLUMNS)
                .map(|_| Constraint::Length(OPTION_ROW_HEIGHT)),
        )
        .split(area);

    for (row, (colors, row_area)) in view
        .options
        .chunks(OPTION_COLUMNS)
        .zip(row_areas.iter())
        .enumerate()
    {
        let cells = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, OPTION_COLUMNS as u32); OPTION_COLUMNS])
            .split(*row_area);

        for (col, (color, cell)) in colors.iter().zip(cells.iter()).enumerate() {
            let idx = row * OPTION_COLUMNS + col;
            let border_style = if idx == app.cursor {
                Style::default()
                    .fg(TermColor::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().add_modifier(Modifier::DIM)
            };

            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", idx + 1))
                .border_style(border_style)
                .style(Style::default().bg((*color).into()))
                .render(*cell, buf);
        }
    }
}

fn render_game_over(app: &App, area: Rect, buf: &mut Buffer) {
    let view = &app.view;
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("Game Over! Thanks for playing.", bold)),
        Line::from(vec![
            Span::raw("Your Total Score: "),
            Span::styled(view.score.to_string(), bold.fg(TermColor::Green)),
        ]),
        Line::from(Span::styled(
            format!(
                "correct {} · wrong {} · timeout {}",
                view.tally.correct, view.tally.wrong, view.tally.timeouts
            ),
            dim,
        )),
    ];

    if !app.history.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Recent games", bold)));
        for game in &app.history {
            lines.push(Line::from(Span::styled(
                format!(
                    "{}   {}/{}",
                    game.finished_at.format("%Y-%m-%d %H:%M"),
                    game.score,
                    game.rounds
                ),
                dim,
            )));
        }
    }

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(area, buf);
}
