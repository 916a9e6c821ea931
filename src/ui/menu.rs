use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph};

use crate::app::BoardView;
use crate::game::DeathReason;
use crate::input::ControlScheme;
use crate::leaderboard::ScoreRecord;
use crate::theme::Theme;

/// Everything the start screen shows.
#[derive(Debug, Clone, Copy)]
pub struct MenuInfo<'a> {
    pub player_name: &'a str,
    pub skin_name: &'a str,
    pub scheme: ControlScheme,
    pub board: &'a BoardView,
    pub theme: &'a Theme,
}

/// Name entry, skin choice and the top scores.
pub fn render_start_menu(frame: &mut Frame<'_>, area: Rect, info: &MenuInfo<'_>) {
    let theme = info.theme;
    let popup = centered_popup(area, 70, 80);
    frame.render_widget(Clear, popup);

    let [title_row, form_row, board_row, footer_row] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(6),
        Constraint::Min(4),
        Constraint::Length(2),
    ])
    .areas(popup);

    frame.render_widget(
        Paragraph::new(Line::from("SNAKE ARCADE"))
            .alignment(Alignment::Center)
            .style(Style::new().fg(theme.accent).add_modifier(Modifier::BOLD)),
        title_row,
    );

    let name_line = if info.player_name.is_empty() {
        Span::styled("type your name", Style::new().fg(theme.muted))
    } else {
        Span::styled(info.player_name, Style::new().fg(theme.hud_text))
    };
    let form = vec![
        Line::from(vec![Span::raw("Name: "), name_line, Span::raw("_")]),
        Line::from(vec![
            Span::raw("Skin: "),
            Span::styled(format!("◀ {} ▶", info.skin_name), Style::new().fg(theme.accent)),
        ]),
        Line::from(format!("Controls: {}", scheme_hint(info.scheme))),
        Line::from(""),
        Line::from("[Enter] Start   [Tab]/[←→] Skin   [Esc] Quit"),
    ];
    frame.render_widget(
        Paragraph::new(form)
            .alignment(Alignment::Center)
            .block(Block::bordered().title(" player ")),
        form_row,
    );

    frame.render_widget(
        Paragraph::new(board_lines(info.board, theme))
            .alignment(Alignment::Center)
            .block(Block::bordered().title(" top scores ")),
        board_row,
    );

    frame.render_widget(
        Paragraph::new(Line::from("[Space] Pause   [M] Mute   [T] Skin   [Q] Quit"))
            .alignment(Alignment::Center)
            .style(Style::new().fg(theme.muted)),
        footer_row,
    );
}

pub fn render_pause_menu(frame: &mut Frame<'_>, area: Rect, theme: &Theme) {
    let popup = centered_popup(area, 60, 30);
    frame.render_widget(Clear, popup);

    let lines = vec![
        Line::from("PAUSED"),
        Line::from(""),
        Line::from("[Space]/[P] Resume"),
        Line::from("[Q] Quit"),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .style(Style::new().fg(theme.hud_text))
            .block(Block::bordered().title(" pause ")),
        popup,
    );
}

/// Shown while the crash plays out, before the leaderboard.
pub fn render_game_over_menu(
    frame: &mut Frame<'_>,
    area: Rect,
    score: u32,
    death_reason: Option<DeathReason>,
    theme: &Theme,
) {
    let popup = centered_popup(area, 60, 30);
    frame.render_widget(Clear, popup);

    let title = if death_reason == Some(DeathReason::BoardFull) {
        "YOU WIN"
    } else {
        "GAME OVER"
    };
    let lines = vec![
        Line::from(Span::styled(
            title,
            Style::new().fg(theme.accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(format!("Score: {score}")),
        Line::from(death_reason.map_or("", reason_text)),
    ];

    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .style(Style::new().fg(theme.hud_text))
            .block(Block::bordered().title(" game over ")),
        popup,
    );
}

/// Final score, the top ten with stats, and the replay options.
pub fn render_leaderboard(
    frame: &mut Frame<'_>,
    area: Rect,
    board: &BoardView,
    score: u32,
    warning: Option<&str>,
    theme: &Theme,
) {
    let popup = centered_popup(area, 80, 90);
    frame.render_widget(Clear, popup);

    let [summary_row, board_row, footer_row] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(4),
        Constraint::Length(2),
    ])
    .areas(popup);

    let mut summary = vec![Line::from(Span::styled(
        format!("Final score: {score}"),
        Style::new().fg(theme.accent).add_modifier(Modifier::BOLD),
    ))];
    if let Some(warning) = warning {
        summary.push(Line::from(Span::styled(
            format!("{warning} ([S] retry)"),
            Style::new().fg(theme.food),
        )));
    }
    frame.render_widget(
        Paragraph::new(summary).alignment(Alignment::Center),
        summary_row,
    );

    let mut lines = board_lines(board, theme);
    if let BoardView::Loaded { stats, .. } = board {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(
                "{} games │ {} players │ best {} │ avg {}",
                stats.total_games, stats.total_players, stats.highest_score, stats.average_score
            ),
            Style::new().fg(theme.muted),
        )));
    }
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .style(Style::new().fg(theme.hud_text))
            .block(Block::bordered().title(" leaderboard ")),
        board_row,
    );

    frame.render_widget(
        Paragraph::new(Line::from("[Enter]/[R] Play again   [M] Menu   [Q] Quit"))
            .alignment(Alignment::Center)
            .style(Style::new().fg(theme.muted)),
        footer_row,
    );
}

fn board_lines(board: &BoardView, theme: &Theme) -> Vec<Line<'static>> {
    match board {
        BoardView::Empty => vec![Line::from("")],
        BoardView::Failed(message) => vec![Line::from(Span::styled(
            message.clone(),
            Style::new().fg(theme.food),
        ))],
        BoardView::Loaded { top, .. } if top.is_empty() => {
            vec![Line::from(Span::styled("No scores yet", Style::new().fg(theme.muted)))]
        }
        BoardView::Loaded { top, .. } => top
            .iter()
            .enumerate()
            .map(|(index, record)| record_line(index + 1, record))
            .collect(),
    }
}

fn record_line(rank: usize, record: &ScoreRecord) -> Line<'static> {
    Line::from(format!(
        "{rank:>2}. {:<20} {:>6}  {}",
        record.player_name,
        record.score,
        record.created_at.format("%Y-%m-%d")
    ))
}

fn reason_text(reason: DeathReason) -> &'static str {
    match reason {
        DeathReason::WallCollision => "Hit the wall",
        DeathReason::SelfCollision => "Bit yourself",
        DeathReason::BoardFull => "The board is full",
    }
}

fn scheme_hint(scheme: ControlScheme) -> &'static str {
    match scheme {
        ControlScheme::Swipe => "arrows/WASD or drag with the mouse",
        ControlScheme::FollowFour | ControlScheme::FollowEight => {
            "arrows/WASD or point with the mouse"
        }
    }
}

fn centered_popup(area: Rect, width_percent: u16, height_percent: u16) -> Rect {
    let [_, mid, _] = Layout::vertical([
        Constraint::Percentage((100 - height_percent) / 2),
        Constraint::Percentage(height_percent),
        Constraint::Percentage((100 - height_percent) / 2),
    ])
    .areas(area);

    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - width_percent) / 2),
        Constraint::Percentage(width_percent),
        Constraint::Percentage((100 - width_percent) / 2),
    ])
    .areas(mid);

    center
}
