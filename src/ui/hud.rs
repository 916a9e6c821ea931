use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::game::GameSnapshot;
use crate::theme::Theme;

/// Rows reserved above the play field.
pub const HUD_HEIGHT: u16 = 2;

const HUD_MARGIN_X: u16 = 1;
const SEPARATOR: &str = " │ ";

/// Values the HUD shows that are not part of the game snapshot.
#[derive(Debug, Clone, Copy)]
pub struct HudInfo<'a> {
    pub player_name: &'a str,
    pub sound_enabled: bool,
    pub theme: &'a Theme,
}

/// Stats on the first row, active effects on the second.
pub fn render_hud(frame: &mut Frame<'_>, area: Rect, snapshot: &GameSnapshot, info: &HudInfo<'_>) {
    let [stats_area, effects_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(area);
    let stats_area = inset_horizontal(stats_area, HUD_MARGIN_X);
    let effects_area = inset_horizontal(effects_area, HUD_MARGIN_X);

    let stats = stats_line(snapshot, usize::from(stats_area.width), info.theme);
    let name_width = usize::from(stats_area.width).saturating_sub(stats.width() + 1);
    let [name_area, stats_area] = Layout::horizontal([
        Constraint::Length(u16::try_from(name_width).unwrap_or(u16::MAX)),
        Constraint::Min(0),
    ])
    .areas(stats_area);

    frame.render_widget(
        Paragraph::new(Span::styled(
            truncate_to_width(info.player_name, name_width),
            Style::new().fg(info.theme.accent).add_modifier(Modifier::BOLD),
        )),
        name_area,
    );
    frame.render_widget(Paragraph::new(stats).alignment(Alignment::Right), stats_area);
    frame.render_widget(
        Paragraph::new(effects_line(snapshot, info)).alignment(Alignment::Right),
        effects_area,
    );
}

fn stats_line(snapshot: &GameSnapshot, available_width: usize, theme: &Theme) -> Line<'static> {
    let full = [
        ("Score", snapshot.score.to_string()),
        ("Combo", format!("x{}", snapshot.combo)),
        ("Length", snapshot.snake_length.to_string()),
    ];
    let compact_labels = ["S", "C", "L"];

    let full_width: usize = full
        .iter()
        .map(|(label, value)| label.width() + 2 + value.width())
        .sum::<usize>()
        + SEPARATOR.width() * (full.len() - 1);
    let use_compact = full_width > available_width / 2;

    let label_style = Style::new().fg(theme.muted);
    let value_style = Style::new().fg(theme.hud_text);
    let mut spans = Vec::new();
    for (index, (label, value)) in full.into_iter().enumerate() {
        if index > 0 {
            spans.push(Span::styled(SEPARATOR, label_style));
        }
        let label = if use_compact { compact_labels[index] } else { label };
        spans.push(Span::styled(format!("{label}: "), label_style));
        let style = if index == 1 && snapshot.combo > 1 {
            Style::new().fg(theme.accent).add_modifier(Modifier::BOLD)
        } else {
            value_style
        };
        spans.push(Span::styled(value, style));
    }

    Line::from(spans)
}

fn effects_line(snapshot: &GameSnapshot, info: &HudInfo<'_>) -> Line<'static> {
    let theme = info.theme;
    let mut spans = Vec::new();

    for (kind, remaining) in &snapshot.effects {
        spans.push(Span::styled(
            format!("{} {:.1}s", kind.label(), remaining.as_secs_f32()),
            Style::new().fg(theme.power_up).add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::styled(SEPARATOR, Style::new().fg(theme.muted)));
    }

    let sound = if info.sound_enabled { "♪ on" } else { "♪ off" };
    spans.push(Span::styled(sound, Style::new().fg(theme.muted)));
    Line::from(spans)
}

fn inset_horizontal(area: Rect, margin: u16) -> Rect {
    Rect {
        x: area.x.saturating_add(margin),
        y: area.y,
        width: area.width.saturating_sub(margin.saturating_mul(2)),
        height: area.height,
    }
}

/// Cuts `text` to at most `max_width` terminal columns, marking the cut with `…`.
fn truncate_to_width(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_owned();
    }
    if max_width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max_width {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}
