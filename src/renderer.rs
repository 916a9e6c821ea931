use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Paragraph};

use crate::app::{App, BURST_LIFETIME, BoardGeometry, Burst, BurstKind, Screen};
use crate::config::GridSize;
use crate::effects::EffectKind;
use crate::food::FoodKind;
use crate::game::GameSnapshot;
use crate::leaderboard::ScoreStore;
use crate::snake::Position;
use crate::theme::Theme;
use crate::ui::hud::{HUD_HEIGHT, HudInfo, render_hud};
use crate::ui::menu::{
    MenuInfo, render_game_over_menu, render_leaderboard, render_pause_menu, render_start_menu,
};

const GLYPH_SOLID: char = '█';
const GLYPH_FOOD: char = '●';
const GLYPH_SPECIAL_FOOD: char = '◆';

/// Draws the current screen and returns where the play field landed.
pub fn render<S: ScoreStore>(
    frame: &mut Frame<'_>,
    app: &App<S>,
    now: Instant,
) -> Option<BoardGeometry> {
    let area = frame.area();
    let theme = app.themes.current_theme();

    if app.screen == Screen::Menu {
        render_start_menu(
            frame,
            area,
            &MenuInfo {
                player_name: &app.player_name,
                skin_name: &theme.name,
                scheme: app.config.control_scheme,
                board: &app.menu_board,
                theme,
            },
        );
        return None;
    }

    let snapshot = app.game.snapshot(now);
    let [hud_area, field_area] =
        Layout::vertical([Constraint::Length(HUD_HEIGHT), Constraint::Min(0)]).areas(area);

    render_hud(
        frame,
        hud_area,
        &snapshot,
        &HudInfo {
            player_name: &app.player_name,
            sound_enabled: app.sound_enabled,
            theme,
        },
    );

    let cell_width = app.config.cell_width.max(1);
    let geometry = render_board(frame, field_area, &snapshot, &app.bursts, cell_width, theme, now);

    match app.screen {
        Screen::Playing if snapshot.is_paused => render_pause_menu(frame, field_area, theme),
        Screen::GameOver { .. } => render_game_over_menu(
            frame,
            field_area,
            snapshot.score,
            snapshot.death_reason,
            theme,
        ),
        Screen::Leaderboard => render_leaderboard(
            frame,
            field_area,
            &app.results,
            snapshot.score,
            app.submit_warning.as_deref(),
            theme,
        ),
        Screen::Menu | Screen::Playing => {}
    }

    geometry
}

fn render_board(
    frame: &mut Frame<'_>,
    area: Rect,
    snapshot: &GameSnapshot,
    bursts: &[Burst],
    cell_width: u16,
    theme: &Theme,
    now: Instant,
) -> Option<BoardGeometry> {
    let bounds = snapshot.bounds;
    let Some(outer) = board_rect(area, bounds, cell_width) else {
        frame.render_widget(
            Paragraph::new("Terminal too small for this grid")
                .alignment(Alignment::Center)
                .style(Style::new().fg(theme.muted)),
            area,
        );
        return None;
    };

    let block = Block::bordered().border_style(Style::new().fg(theme.border).bg(theme.play_bg));
    let inner = block.inner(outer);
    frame.render_widget(block, outer);
    frame.render_widget(Block::new().style(Style::new().bg(theme.play_bg)), inner);

    let geometry = BoardGeometry {
        x: inner.x,
        y: inner.y,
        cell_width,
    };

    for food in &snapshot.foods {
        let (glyph, color) = match food.kind {
            FoodKind::Normal => (GLYPH_FOOD, theme.food),
            FoodKind::Special => (GLYPH_SPECIAL_FOOD, theme.special_food),
        };
        draw_cell(
            frame,
            geometry,
            bounds,
            food.position,
            &pad_glyph(glyph, cell_width),
            Style::new().fg(color),
        );
    }

    for power_up in &snapshot.power_ups {
        draw_cell(
            frame,
            geometry,
            bounds,
            power_up.position,
            &pad_glyph(power_up_letter(power_up.kind), cell_width),
            Style::new()
                .fg(theme.power_up)
                .add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK),
        );
    }

    let solid = solid_cell(cell_width);
    let invincible = snapshot
        .effects
        .iter()
        .any(|(kind, _)| *kind == EffectKind::Invincible);
    for (index, segment) in snapshot.snake.iter().enumerate() {
        let mut style = if index == 0 {
            Style::new().fg(theme.snake_head).add_modifier(Modifier::BOLD)
        } else {
            Style::new().fg(theme.snake_body)
        };
        if invincible {
            style = style.add_modifier(Modifier::DIM);
        }
        draw_cell(frame, geometry, bounds, *segment, &solid, style);
    }

    for burst in bursts {
        let color = match burst.kind {
            BurstKind::Eat | BurstKind::PowerUp => theme.burst,
            BurstKind::Crash => theme.food,
        };
        // Neighbours light up only for the first half of the burst.
        let young = now.saturating_duration_since(burst.started_at) < BURST_LIFETIME / 2;
        let mut cells = vec![burst.position];
        if young {
            cells.extend([
                Position::new(burst.position.x - 1, burst.position.y),
                Position::new(burst.position.x + 1, burst.position.y),
                Position::new(burst.position.x, burst.position.y - 1),
                Position::new(burst.position.x, burst.position.y + 1),
            ]);
        }
        for cell in cells {
            tint_cell(frame, geometry, bounds, cell, color);
        }
    }

    Some(geometry)
}

/// Centered frame rect for the grid, or `None` if it does not fit.
fn board_rect(area: Rect, bounds: GridSize, cell_width: u16) -> Option<Rect> {
    let width = bounds.width.checked_mul(cell_width)?.checked_add(2)?;
    let height = bounds.height.checked_add(2)?;
    if width > area.width || height > area.height {
        return None;
    }

    Some(Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    })
}

fn cell_origin(geometry: BoardGeometry, bounds: GridSize, position: Position) -> Option<(u16, u16)> {
    if !position.is_within_bounds(bounds) {
        return None;
    }

    let column = u16::try_from(position.x).ok()?.checked_mul(geometry.cell_width)?;
    let row = u16::try_from(position.y).ok()?;
    Some((geometry.x.checked_add(column)?, geometry.y.checked_add(row)?))
}

fn draw_cell(
    frame: &mut Frame<'_>,
    geometry: BoardGeometry,
    bounds: GridSize,
    position: Position,
    text: &str,
    style: Style,
) {
    let Some((x, y)) = cell_origin(geometry, bounds, position) else {
        return;
    };
    frame.buffer_mut().set_string(x, y, text, style);
}

fn tint_cell(
    frame: &mut Frame<'_>,
    geometry: BoardGeometry,
    bounds: GridSize,
    position: Position,
    color: Color,
) {
    let Some((x, y)) = cell_origin(geometry, bounds, position) else {
        return;
    };

    let buffer = frame.buffer_mut();
    for offset in 0..geometry.cell_width {
        if let Some(cell) = buffer.cell_mut((x + offset, y)) {
            cell.set_bg(color);
        }
    }
}

fn solid_cell(cell_width: u16) -> String {
    std::iter::repeat_n(GLYPH_SOLID, usize::from(cell_width)).collect()
}

fn pad_glyph(glyph: char, cell_width: u16) -> String {
    let mut text = String::with_capacity(usize::from(cell_width) * 3);
    text.push(glyph);
    for _ in 1..cell_width {
        text.push(' ');
    }
    text
}

fn power_up_letter(kind: EffectKind) -> char {
    match kind {
        EffectKind::Invincible => 'I',
        EffectKind::DoublePoints => 'D',
        EffectKind::Freeze => 'F',
        EffectKind::Speed => 'S',
    }
}
