use bracket_api::{BracketLayout, Match, Side, Team};
use tui::buffer::Buffer;
use tui::layout::Rect;
use tui::style::{Color, Modifier, Style};
use tui::widgets::Widget;

use crate::components::theme::{ThemeColor, resolve};

// ---------------------------------------------------------------------------
// Layout constants
// ---------------------------------------------------------------------------

/// Rows per match cell: team1 line, status line, team2 line.
pub const GAME_HEIGHT: u16 = 3;

/// Rows between the centers of two adjacent leaf slots.
pub const SLOT_STRIDE: u16 = GAME_HEIGHT + 1;

/// Column label row plus a rule underneath.
pub const HEADER_HEIGHT: u16 = 2;

/// Width of the connector zone drawn between adjacent round columns.
pub const CONNECTOR_WIDTH: u16 = 3;

/// Maximum match cell width in wider terminals.
const CELL_W_FULL: u16 = 26;

/// Leaf slots the grid will lay out. Matches beyond it are not drawn.
const MAX_LEAVES: usize = 1024;

pub const TBD_LABEL: &str = "TBD";
pub const NOT_FORMED_LABEL: &str = "not yet formed";

/// Slot height at bracket depth `d` (0 = leftmost column).
/// SH[0] = GAME_HEIGHT; SH[d] = 2 * SH[d-1] + 1.
pub fn slot_height(depth: usize) -> u16 {
    let mut sh = GAME_HEIGHT;
    for _ in 0..depth {
        sh = 2 * sh + 1;
    }
    sh
}

// ---------------------------------------------------------------------------
// GameCell / BracketGrid
// ---------------------------------------------------------------------------

/// Pre-computed position of one slot. The slot may or may not hold a match.
#[derive(Debug, Clone, PartialEq)]
pub struct GameCell {
    /// Row of the status line, relative to the top of the bracket body.
    pub center_row: u16,
    /// Starting x-column, origin-relative.
    pub col: u16,
    pub cell_width: u16,
    /// Column index in the layout.
    pub depth: usize,
    /// Slot index within the column.
    pub slot: usize,
}

/// Slot grid for a layout of 1 to 4 columns.
///
/// Column `d` has `leaves >> d` slots, and each parent slot is centred
/// between its two children:
///
/// ```text
///   d=0: [1, 5, 9, 13, ...]   (spacing 4)
///   d=1: [3, 11, ...]         (spacing 8)
///   d=2: [7, 23, ...]         (spacing 16)
/// ```
#[derive(Debug, Clone, Default)]
pub struct BracketGrid {
    pub cells: Vec<GameCell>,
    /// Starting x of each column.
    pub round_cols: Vec<u16>,
    pub slots_per_column: Vec<usize>,
    /// Body height, header excluded.
    pub total_height: u16,
    pub cell_width: u16,
}

impl BracketGrid {
    pub fn compute(layout: &BracketLayout, terminal_width: u16) -> Self {
        let column_count = layout.columns.len();
        if column_count == 0 {
            return Self::default();
        }

        // Enough leaves that every column fits all of its matches and the
        // last column still has one slot.
        let leaves = layout
            .columns
            .iter()
            .enumerate()
            .map(|(d, c)| c.matches.len().max(1).next_power_of_two() << d)
            .max()
            .unwrap_or(1)
            .min(MAX_LEAVES);

        let connector_total = CONNECTOR_WIDTH * (column_count as u16 - 1);
        let per_col = terminal_width.saturating_sub(connector_total) / column_count as u16;
        let cell_width = per_col.clamp(1, CELL_W_FULL);
        let stride = cell_width + CONNECTOR_WIDTH;
        let round_cols: Vec<u16> = (0..column_count as u16).map(|d| d * stride).collect();

        let mut cells = Vec::new();
        let mut slots_per_column = Vec::with_capacity(column_count);
        for (d, col) in round_cols.iter().enumerate() {
            let sh = slot_height(d);
            let slots = (leaves >> d).max(1);
            slots_per_column.push(slots);
            for i in 0..slots {
                cells.push(GameCell {
                    center_row: (sh / 2).saturating_add((i as u16).saturating_mul(sh.saturating_add(1))),
                    col: *col,
                    cell_width,
                    depth: d,
                    slot: i,
                });
            }
        }

        Self {
            cells,
            total_height: (leaves as u16).saturating_mul(SLOT_STRIDE).saturating_sub(1),
            round_cols,
            slots_per_column,
            cell_width,
        }
    }

    pub fn cells_for_depth(&self, depth: usize) -> &[GameCell] {
        let start: usize = self.slots_per_column.iter().take(depth).sum();
        let len = self.slots_per_column.get(depth).copied().unwrap_or(0);
        &self.cells[start..start + len]
    }
}

// ---------------------------------------------------------------------------
// BracketView widget
// ---------------------------------------------------------------------------

/// Renders every column of a [`BracketLayout`] left to right, earliest round
/// first and the final last.
pub struct BracketView<'a> {
    pub layout: &'a BracketLayout,
    pub grid: &'a BracketGrid,
    /// Vertical scroll in leaf slots.
    pub scroll_offset: u16,
}

impl<'a> Widget for BracketView<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width < 10 || area.height < HEADER_HEIGHT + GAME_HEIGHT {
            return;
        }

        // Column headers stay put while the body scrolls.
        let accent = resolve(ThemeColor::Accent);
        let dim = resolve(ThemeColor::Dim);
        for (column, x) in self.layout.columns.iter().zip(&self.grid.round_cols) {
            let x = area.x + x;
            if x >= area.x + area.width {
                break;
            }
            let avail = (area.x + area.width - x).min(self.grid.cell_width) as usize;
            let label: String = column.round.label().chars().take(avail).collect();
            buf.set_string(x, area.y, &label, accent);
            buf.set_string(x, area.y + 1, "─".repeat(avail), dim);
        }

        let body = Rect::new(
            area.x,
            area.y + HEADER_HEIGHT,
            area.width,
            area.height - HEADER_HEIGHT,
        );
        let scroll = self
            .scroll_offset
            .saturating_mul(SLOT_STRIDE)
            .min(self.grid.total_height.saturating_sub(GAME_HEIGHT));

        // Pass 1: match cells
        for cell in &self.grid.cells {
            let game = self
                .layout
                .columns
                .get(cell.depth)
                .and_then(|c| c.matches.get(cell.slot));
            draw_game_cell(game, cell, body, scroll, buf);
        }

        // Pass 2: connectors, only where a child slot holds a match.
        for depth in 0..self.grid.round_cols.len().saturating_sub(1) {
            let children = self.grid.cells_for_depth(depth);
            let parents = self.grid.cells_for_depth(depth + 1);
            let conn_x_base = body.x + self.grid.round_cols[depth] + self.grid.cell_width;
            let filled = self.layout.columns[depth].matches.len();

            for (j, parent) in parents.iter().enumerate() {
                if 2 * j >= filled {
                    break;
                }
                let (Some(top), Some(bot)) = (children.get(2 * j), children.get(2 * j + 1)) else {
                    continue;
                };
                draw_connector(
                    top.center_row,
                    parent.center_row,
                    bot.center_row,
                    conn_x_base,
                    body,
                    scroll,
                    buf,
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Shared drawing helpers
// ---------------------------------------------------------------------------

/// Convert a body-relative row to an absolute screen y, applying scroll + area bounds.
fn screen_y(bracket_row: u16, scroll: u16, area: Rect) -> Option<u16> {
    if bracket_row < scroll {
        return None;
    }
    let rel = bracket_row - scroll;
    if rel >= area.height {
        return None;
    }
    Some(area.y + rel)
}

fn draw_game_cell(
    game: Option<&Match>,
    cell: &GameCell,
    area: Rect,
    scroll: u16,
    buf: &mut Buffer,
) {
    let winner_style = resolve(ThemeColor::Winner);
    let dim = resolve(ThemeColor::Dim);
    let primary = resolve(ThemeColor::Primary);
    let base_style = Style::default().fg(Color::Gray);

    let x = area.x + cell.col;
    if x >= area.x + area.width {
        return;
    }
    let avail_w = (area.x + area.width).saturating_sub(x) as usize;
    let width = cell.cell_width as usize;

    let rows = [
        (cell.center_row.saturating_sub(1), Some(Side::Team1)),
        (cell.center_row, None),
        (cell.center_row.saturating_add(1), Some(Side::Team2)),
    ];

    for (bracket_row, side) in rows {
        let Some(sy) = screen_y(bracket_row, scroll, area) else {
            continue;
        };

        let (content, style) = match (game, side) {
            (None, None) => (format!("{NOT_FORMED_LABEL:<width$}"), dim.add_modifier(Modifier::ITALIC)),
            (None, Some(_)) => continue,
            (Some(m), None) => (format_status_line(m, width), if m.is_finished() { dim } else { primary }),
            (Some(m), Some(side)) => {
                let style = if m.side_won(side) { winner_style } else { base_style };
                (format_team_line(m.team(side), m.display_score(side), width), style)
            }
        };
        let text: String = content.chars().take(avail_w.min(width)).collect();
        buf.set_string(x, sy, &text, style);
    }
}

/// `" name          score"`, exactly `width` chars. Score is `-` until the
/// match is finished.
pub fn format_team_line(team: Option<&Team>, score: Option<u32>, width: usize) -> String {
    let name = team.map(|t| t.name.as_str()).unwrap_or(TBD_LABEL);
    let score = score.map_or_else(|| "-".to_string(), |s| s.to_string());
    let name_w = width.saturating_sub(score.chars().count().max(3) + 2);
    let name: String = name.chars().take(name_w).collect();
    let line = format!(" {name:<name_w$} {score:>3}");
    line.chars().take(width).collect()
}

fn format_status_line(game: &Match, width: usize) -> String {
    let status = if game.is_finished() { "FINAL" } else { "scheduled" };
    let raw = format!(" #{} {status}", game.match_number);
    let padded = format!("{raw:<width$}");
    padded.chars().take(width).collect()
}

/// Connectors between one parent and its two children.
///
/// ```text
///  child_top  ──┐
///               │
///  parent     ──├──
///               │
///  child_bot  ──┘
/// ```
fn draw_connector(
    r_top: u16,
    r_mid: u16,
    r_bot: u16,
    conn_base_x: u16,
    area: Rect,
    scroll: u16,
    buf: &mut Buffer,
) {
    let style = resolve(ThemeColor::Dim);
    let col_a = conn_base_x;
    let col_b = conn_base_x + 1;
    let col_c = conn_base_x + 2;
    let limit_x = area.x + area.width;

    let mut put = |x: u16, row: u16, ch: char| {
        if x < limit_x
            && let Some(sy) = screen_y(row, scroll, area)
        {
            put_char(buf, x, sy, ch, style);
        }
    };

    put(col_a, r_top, '─');
    put(col_b, r_top, '┐');
    for row in (r_top + 1)..r_mid {
        put(col_b, row, '│');
    }
    put(col_b, r_mid, '├');
    put(col_c, r_mid, '─');
    for row in (r_mid + 1)..r_bot {
        put(col_b, row, '│');
    }
    put(col_a, r_bot, '─');
    put(col_b, r_bot, '┘');
}

fn put_char(buf: &mut Buffer, x: u16, y: u16, ch: char, style: Style) {
    if let Some(cell) = buf.cell_mut((x, y)) {
        cell.set_char(ch);
        cell.set_style(style);
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use bracket_api::{MatchStatus, Round};

    fn team(id: i64, name: &str) -> Team {
        Team { id, name: name.into(), logo_url: None }
    }

    fn game(id: i64, round: Round, number: u32) -> Match {
        Match {
            id,
            round,
            match_number: number,
            team1: Some(team(id * 10, "Red")),
            team2: Some(team(id * 10 + 1, "Blue")),
            team1_score: 0,
            team2_score: 0,
            winner_id: None,
            status: MatchStatus::Scheduled,
        }
    }

    fn quarterfinal_layout() -> BracketLayout {
        let mut matches: Vec<Match> = (1..=4).map(|n| game(n, Round::Quarterfinal, n as u32)).collect();
        matches.push(game(5, Round::Semifinal, 1));
        BracketLayout::from_matches(&matches)
    }

    fn render(layout: &BracketLayout, width: u16, height: u16) -> Buffer {
        let grid = BracketGrid::compute(layout, width);
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        BracketView { layout, grid: &grid, scroll_offset: 0 }.render(area, &mut buf);
        buf
    }

    fn buffer_text(buf: &Buffer) -> String {
        let area = buf.area;
        let mut out = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn slot_heights_double_plus_one() {
        let heights: Vec<u16> = (0..4).map(slot_height).collect();
        assert_eq!(heights, vec![3, 7, 15, 31]);
    }

    #[test]
    fn quarterfinal_grid_has_four_two_one_slots() {
        let grid = BracketGrid::compute(&quarterfinal_layout(), 90);
        assert_eq!(grid.slots_per_column, vec![4, 2, 1]);
        let centers = |d| grid.cells_for_depth(d).iter().map(|c| c.center_row).collect::<Vec<_>>();
        assert_eq!(centers(0), vec![1, 5, 9, 13]);
        assert_eq!(centers(1), vec![3, 11]);
        assert_eq!(centers(2), vec![7]);
        assert_eq!(grid.total_height, 15);
    }

    #[test]
    fn parent_center_is_midpoint_of_children() {
        let mut matches: Vec<Match> = (1..=8).map(|n| game(n, Round::RoundOf16, n as u32)).collect();
        matches.push(game(9, Round::Final, 1));
        let grid = BracketGrid::compute(&BracketLayout::from_matches(&matches), 120);
        for depth in 0..3usize {
            let children = grid.cells_for_depth(depth);
            for (j, parent) in grid.cells_for_depth(depth + 1).iter().enumerate() {
                let mid = (children[2 * j].center_row + children[2 * j + 1].center_row) / 2;
                assert_eq!(parent.center_row, mid, "depth={depth} parent={j}");
            }
        }
    }

    #[test]
    fn overfull_column_widens_the_grid() {
        // Three semifinals do not fit two slots.
        let matches: Vec<Match> = (1..=3).map(|n| game(n, Round::Semifinal, n as u32)).collect();
        let grid = BracketGrid::compute(&BracketLayout::from_matches(&matches), 80);
        assert_eq!(grid.slots_per_column, vec![4, 2]);
    }

    #[test]
    fn huge_round_is_capped_without_overflow() {
        let matches: Vec<Match> =
            (1..=5000).map(|n| game(n, Round::RoundOf16, n as u32)).collect();
        let layout = BracketLayout::from_matches(&matches);
        let grid = BracketGrid::compute(&layout, 120);
        assert_eq!(grid.slots_per_column[0], MAX_LEAVES);
        assert_eq!(grid.total_height, MAX_LEAVES as u16 * SLOT_STRIDE - 1);
        let buf = render(&layout, 120, 30);
        assert!(buffer_text(&buf).contains("Round of 16"));
    }

    #[test]
    fn final_only_layout_is_one_slot() {
        let layout = BracketLayout::from_matches(&[game(1, Round::Final, 1)]);
        let grid = BracketGrid::compute(&layout, 40);
        assert_eq!(grid.cells.len(), 1);
        assert_eq!(grid.cells[0].center_row, 1);
    }

    #[test]
    fn cell_width_is_capped() {
        let grid = BracketGrid::compute(&quarterfinal_layout(), 400);
        assert_eq!(grid.cell_width, CELL_W_FULL);
    }

    #[test]
    fn empty_layout_has_no_cells() {
        let grid = BracketGrid::compute(&BracketLayout::default(), 80);
        assert!(grid.cells.is_empty());
    }

    #[test]
    fn team_line_is_exactly_cell_width() {
        let t = team(1, "A very long team name that does not fit");
        assert_eq!(format_team_line(Some(&t), Some(12), 20).chars().count(), 20);
        assert_eq!(format_team_line(None, None, 20).chars().count(), 20);
    }

    #[test]
    fn missing_team_reads_tbd_and_unfinished_score_is_dash() {
        let line = format_team_line(None, None, 16);
        assert!(line.contains(TBD_LABEL));
        assert!(line.trim_end().ends_with('-'));
    }

    #[test]
    fn empty_final_slot_renders_placeholder() {
        let buf = render(&quarterfinal_layout(), 100, 20);
        let text = buffer_text(&buf);
        assert!(text.contains("Quarterfinal"));
        assert!(text.contains("Final"));
        assert!(text.contains(NOT_FORMED_LABEL));
        assert!(text.contains("Red"));
    }

    #[test]
    fn finished_match_shows_score_and_winner_style() {
        let mut m = game(1, Round::Final, 1);
        m.status = MatchStatus::Finished;
        m.team1_score = 3;
        m.team2_score = 1;
        m.winner_id = Some(10);
        let layout = BracketLayout::from_matches(&[m]);
        let buf = render(&layout, 30, 8);
        let text = buffer_text(&buf);
        assert!(text.contains("FINAL"));
        assert!(text.contains('3'));

        // team1 line sits one row above the center row.
        let team1_row = HEADER_HEIGHT;
        let winner = resolve(ThemeColor::Winner);
        assert_eq!(buf[(1, team1_row)].fg, winner.fg.unwrap_or_default());
        assert_ne!(buf[(1, team1_row + 2)].fg, winner.fg.unwrap_or_default());
    }
}
