use log::error;
use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs, Wrap};
use tui::{Frame, Terminal};
use tui_logger::{TuiLoggerLevelOutput, TuiLoggerWidget};

use crate::app::{App, MenuItem};
use crate::components::bracket::{BracketGrid, BracketView};
use crate::components::theme::{ThemeColor, resolve};
use crate::state::app_state::{AppState, Freshness, NotificationKind};
use crate::state::network::{ERROR_CHAR, LoadingState};
use crate::state::store::MatchSource;
use crate::ui::layout::LayoutAreas;
use bracket_api::challonge_embed_url;

static TABS: &[&str; 2] = &["Bracket", "Admin"];

const NOTIFICATION_WIDTH: u16 = 46;
const NOTIFICATION_HEIGHT: u16 = 4;

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let result = terminal.draw(|f| {
        layout.update(f.area(), app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
            draw_status_bar(f, layout.status_bar, &app.state);
        }

        match app.state.active_tab {
            MenuItem::Bracket if app.state.embed_mode => draw_embed_panel(f, layout.main, &app.state),
            MenuItem::Bracket => draw_bracket(f, layout.main, &app.state),
            MenuItem::Admin => draw_admin(f, layout.main, &app.state),
            MenuItem::Help => draw_help(f, layout.main),
        }

        if app.state.show_logs {
            draw_logs(f, layout.logs);
        }

        draw_notifications(f, layout.main, &app.state);
        let area = f.area();
        draw_loading_spinner(f, area, app, loading);
    });

    if let Err(e) = result {
        error!("draw failed: {e}");
    }
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab_index = match app.state.active_tab {
        MenuItem::Bracket => 0,
        MenuItem::Admin => 1,
        MenuItem::Help => 0,
    };

    let titles: Vec<Line> = TABS.iter().map(|t| Line::from(*t)).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new("Help: ? ")
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

fn source_label(state: &AppState) -> String {
    match &state.source {
        None => "not connected".to_string(),
        Some(MatchSource::Generated) => "generated bracket".to_string(),
        Some(MatchSource::Challonge { tournament_id }) => format!("challonge: {tournament_id}"),
    }
}

fn draw_bracket(f: &mut Frame, area: Rect, state: &AppState) {
    let title = match state.bracket.freshness {
        Freshness::Cached => " Bracket (cached) ".to_string(),
        _ => " Bracket ".to_string(),
    };
    let block = default_border(Color::White).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if state.bracket.layout.is_empty() {
        let mut lines = vec![if state.source.is_none() {
            "Not connected".to_string()
        } else {
            "Bracket not formed yet".to_string()
        }];
        lines.push(String::new());
        lines.push("Press i to sync a Challonge tournament or g to generate a bracket.".to_string());
        if let Some(err) = state.last_error.as_deref() {
            lines.push(String::new());
            lines.push(format!("Last error: {err}"));
        }
        f.render_widget(
            Paragraph::new(lines.join("\n"))
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true }),
            inner,
        );
        return;
    }

    let [header, content] =
        Layout::vertical([Constraint::Length(2), Constraint::Fill(1)]).areas(inner);

    let layout = &state.bracket.layout;
    let shape = layout.variant().map(|v| v.label()).unwrap_or_default();
    let mut header_spans = vec![
        Span::raw(source_label(state)),
        Span::styled(
            format!("  {shape}, {} matches", layout.match_count()),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    if let Some(champion) = layout.final_match().and_then(|m| m.winner()) {
        header_spans.push(Span::styled(
            format!("  champion: {}", champion.name),
            resolve(ThemeColor::Winner),
        ));
    }
    if state.bracket.freshness == Freshness::Cached {
        header_spans.push(Span::styled(
            "  showing last cached snapshot",
            Style::default().fg(Color::Yellow),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(header_spans)), header);

    let grid = BracketGrid::compute(layout, content.width);
    f.render_widget(
        BracketView {
            layout,
            grid: &grid,
            scroll_offset: state.bracket.scroll_offset,
        },
        content,
    );
}

fn draw_embed_panel(f: &mut Frame, area: Rect, state: &AppState) {
    let block = default_border(Color::White).title(" Bracket (embedded widget) ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines = match state.tournament_id() {
        Some(id) => vec![
            Line::from("Live bracket is served by Challonge's own widget:"),
            Line::from(""),
            Line::styled(challonge_embed_url(id), resolve(ThemeColor::Accent)),
            Line::from(""),
            Line::styled(
                "Polling is paused. Press e to switch back to the native bracket.",
                Style::default().fg(Color::DarkGray),
            ),
        ],
        None => vec![
            Line::from("Embedded-widget mode needs a Challonge tournament."),
            Line::styled(
                "Press i to enter one, or e to switch back.",
                Style::default().fg(Color::DarkGray),
            ),
        ],
    };
    f.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center).wrap(Wrap { trim: true }),
        inner,
    );
}

fn draw_admin(f: &mut Frame, area: Rect, state: &AppState) {
    let block = default_border(Color::White).title(" Admin ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.width == 0 || inner.height < 4 {
        return;
    }

    let [info_area, input_area] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(3)]).areas(inner);

    let label = Style::default().fg(Color::DarkGray);
    let updated = state
        .last_updated
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());
    let embed = if state.embed_mode { "on" } else { "off" };

    let mut lines = vec![
        Line::from(vec![Span::styled("Source       ", label), Span::raw(source_label(state))]),
        Line::from(vec![Span::styled("Last update  ", label), Span::raw(updated)]),
        Line::from(vec![
            Span::styled("Matches      ", label),
            Span::raw(state.bracket.matches.len().to_string()),
        ]),
        Line::from(vec![Span::styled("Embed mode   ", label), Span::raw(embed)]),
    ];
    if let Some(err) = state.last_error.as_deref() {
        lines.push(Line::from(vec![
            Span::styled("Last error   ", label),
            Span::styled(err.to_string(), resolve(ThemeColor::Error)),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::styled(
        "g generate bracket   i sync Challonge   e toggle embed   r refresh   d disconnect",
        label,
    ));
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), info_area);

    let composing = state.tournament_input.composing;
    let (title, text, style) = if composing {
        (
            " Challonge tournament id or URL ",
            format!("> {}_", state.tournament_input.input),
            Style::default().fg(Color::Yellow),
        )
    } else {
        (
            " sync ",
            "Press i to enter a tournament. Enter submits, Esc cancels.".to_string(),
            label,
        )
    };
    let input_block = default_border(Color::DarkGray).title(title);
    let input_inner = input_block.inner(input_area);
    f.render_widget(input_block, input_area);
    f.render_widget(Paragraph::new(text).style(style), input_inner);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let block = default_border(Color::DarkGray).title(" Help ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = [
        ("1 / 2", "bracket / admin tab"),
        ("j / k", "scroll the bracket"),
        ("g", "generate a bracket from the registered teams"),
        ("i, s", "sync a Challonge tournament (id or URL)"),
        ("e", "toggle the embedded Challonge widget"),
        ("r", "refresh now"),
        ("d", "disconnect from the current tournament"),
        ("f", "full screen"),
        ("\"", "show logs"),
        ("Esc", "dismiss notifications / close help"),
        ("q", "quit"),
    ];
    let lines: Vec<Line> = rows
        .iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(format!("{key:>6}  "), resolve(ThemeColor::Accent)),
                Span::raw(*what),
            ])
        })
        .collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_status_bar(f: &mut Frame, area: Rect, state: &AppState) {
    if area.height == 0 {
        return;
    }
    let updated = state
        .last_updated
        .map(|t| format!("updated {}", t.format("%H:%M:%S")))
        .unwrap_or_else(|| "no data yet".to_string());
    let text = format!(" {}  |  {}", source_label(state), updated);
    f.render_widget(Paragraph::new(text).style(Style::default().fg(Color::DarkGray)), area);
}

fn draw_logs(f: &mut Frame, area: Rect) {
    if area.height == 0 {
        return;
    }
    let logs = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Logs "))
        .output_separator(' ')
        .output_timestamp(Some("%H:%M:%S".to_string()))
        .output_level(Some(TuiLoggerLevelOutput::Abbreviated))
        .output_target(false)
        .output_file(false)
        .output_line(false)
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Gray))
        .style_debug(Style::default().fg(Color::DarkGray));
    f.render_widget(logs, area);
}

fn draw_notifications(f: &mut Frame, area: Rect, state: &AppState) {
    let width = NOTIFICATION_WIDTH.min(area.width.saturating_sub(2));
    if width < 10 {
        return;
    }
    let x = area.x + area.width.saturating_sub(width + 1);
    let mut y = area.y + 1;

    for note in state.notifications.iter().rev() {
        if y + NOTIFICATION_HEIGHT > area.y + area.height {
            break;
        }
        let color = match note.kind {
            NotificationKind::Info => Color::Green,
            NotificationKind::Error => Color::Red,
        };
        let popup = Rect::new(x, y, width, NOTIFICATION_HEIGHT);
        f.render_widget(Clear, popup);
        f.render_widget(
            Paragraph::new(note.message.as_str())
                .wrap(Wrap { trim: true })
                .block(default_border(color).title(format!(" {} ", note.title))),
            popup,
        );
        y += NOTIFICATION_HEIGHT;
    }
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(11), 1, 1, 1)
    };
    f.render_widget(spinner, area);
}
