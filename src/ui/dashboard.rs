use crate::export::report::thousands;
use crate::model::PriceSource;
use crate::ui::app::{App, FocusPanel};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, List, ListItem, Paragraph, Row, Scrollbar, ScrollbarOrientation,
        ScrollbarState, Table,
    },
    Frame,
};

const BRAND_DARK: Color = Color::Rgb(0x1F, 0x2F, 0x3C);
const BRAND_SELECT_BG: Color = Color::Rgb(0xC3, 0xD3, 0xE0);
const BRAND_GREEN: Color = Color::Rgb(0x82, 0x9A, 0x68);
const BRAND_ORANGE: Color = Color::Rgb(0x9E, 0x68, 0x3C);
const BRAND_MUTED: Color = Color::Rgb(0x71, 0x65, 0x65);

const HEADER_STYLE: Style = Style::new().fg(BRAND_DARK).add_modifier(Modifier::BOLD);
const SELECTED_STYLE: Style = Style::new()
    .bg(BRAND_SELECT_BG)
    .fg(BRAND_DARK)
    .add_modifier(Modifier::BOLD);
const MONEY_COLOR: Color = BRAND_GREEN;
const FALLBACK_COLOR: Color = BRAND_ORANGE;

pub fn draw_dashboard(frame: &mut Frame, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(3), // Header
        Constraint::Min(10),   // Main content
        Constraint::Length(3), // Footer
    ])
    .split(frame.area());

    draw_header(frame, chunks[0], app);
    draw_main_content(frame, chunks[1], app);
    draw_footer(
        frame,
        chunks[2],
        " ←→ Panel | ↑↓ Select | Enter Breakdown | q Quit ",
    );
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let title = format!(
        " BOQ Estimator | {} | {} types | Grand total {} {} ",
        app.project.name,
        app.total_types(),
        app.currency,
        thousands(app.total)
    );

    let header = Paragraph::new(title)
        .style(HEADER_STYLE)
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(header, area);
}

fn draw_main_content(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::horizontal([
        Constraint::Percentage(35), // Categories
        Constraint::Percentage(65), // Types
    ])
    .split(area);

    draw_categories(frame, chunks[0], app);
    draw_types(frame, chunks[1], app);
}

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(BRAND_ORANGE)
    } else {
        Style::default()
    }
}

fn draw_categories(frame: &mut Frame, area: Rect, app: &App) {
    let is_focused = app.focus_panel == FocusPanel::Categories;

    let items: Vec<ListItem> = app
        .categories
        .iter()
        .enumerate()
        .map(|(i, cat)| {
            let is_selected = i == app.selected_category;
            let style = if is_selected && is_focused {
                SELECTED_STYLE
            } else if is_selected {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let marker = if is_selected && is_focused {
                " ◄"
            } else {
                ""
            };

            ListItem::new(Line::from(vec![
                Span::styled(&cat.category, style),
                Span::raw(" "),
                Span::styled(thousands(cat.total), Style::default().fg(MONEY_COLOR)),
                Span::styled(
                    format!(" ({:.1}%)", app.share(cat.total)),
                    Style::default().fg(BRAND_MUTED),
                ),
                Span::styled(marker, Style::default().fg(BRAND_ORANGE)),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title(format!(" Categories ({}) ", app.categories.len()))
            .borders(Borders::ALL)
            .border_style(border_style(is_focused)),
    );

    frame.render_widget(list, area);
}

fn draw_types(frame: &mut Frame, area: Rect, app: &App) {
    let is_focused = app.focus_panel == FocusPanel::Types;
    let types = app.current_types();
    let category_name = app
        .current_category()
        .map(|c| c.category.clone())
        .unwrap_or_default();

    // Borders and header row
    let visible_rows = (area.height as usize).saturating_sub(3);
    let scroll_offset = if app.selected_type >= visible_rows {
        app.selected_type - visible_rows + 1
    } else {
        0
    };

    let header = Row::new(vec![
        "Type Name".to_string(),
        format!("Cost ({})", app.currency),
        "Share".to_string(),
    ])
    .style(HEADER_STYLE)
    .height(1);

    let rows: Vec<Row> = types
        .iter()
        .enumerate()
        .skip(scroll_offset)
        .take(visible_rows)
        .map(|(i, t)| {
            let is_selected = i == app.selected_type;
            let style = if is_selected && is_focused {
                SELECTED_STYLE
            } else if is_selected {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            Row::new(vec![
                t.name.clone(),
                thousands(t.cost),
                format!("{:.1}%", app.share(t.cost)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Percentage(60),
        Constraint::Percentage(25),
        Constraint::Percentage(15),
    ];

    let title = format!(" {} ({} types) ", category_name, types.len());
    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style(is_focused)),
    );

    frame.render_widget(table, area);

    if types.len() > visible_rows {
        draw_scrollbar(frame, area, types.len(), app.selected_type);
    }
}

fn draw_scrollbar(frame: &mut Frame, area: Rect, len: usize, position: usize) {
    let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
        .begin_symbol(Some("↑"))
        .end_symbol(Some("↓"));
    let mut scrollbar_state = ScrollbarState::new(len).position(position);

    let scrollbar_area = Rect {
        x: area.x + area.width - 1,
        y: area.y + 2,
        width: 1,
        height: area.height.saturating_sub(3),
    };
    frame.render_stateful_widget(scrollbar, scrollbar_area, &mut scrollbar_state);
}

fn draw_footer(frame: &mut Frame, area: Rect, help: &str) {
    let footer = Paragraph::new(help)
        .style(Style::default().fg(BRAND_MUTED))
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(footer, area);
}

pub fn draw_type_detail(frame: &mut Frame, app: &App) {
    let Some(type_cost) = app.selected_type_cost() else {
        return;
    };

    let chunks = Layout::vertical([
        Constraint::Length(3), // Type name
        Constraint::Min(6),    // Materials
        Constraint::Length(9), // Markups
        Constraint::Length(3), // Footer
    ])
    .split(frame.area());

    let header = Paragraph::new(format!(
        " Type: {} | {} {} ",
        type_cost.name,
        app.currency,
        thousands(type_cost.cost)
    ))
    .style(HEADER_STYLE)
    .block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, chunks[0]);

    let footer = " Esc Back | ↑↓ Scroll | q Quit ";

    let Some(breakdown) = app.selected_breakdown() else {
        let message = Paragraph::new(
            "No recipe breakdown for this type. Run `rate` with a recipe file to see one.",
        )
        .style(Style::default().fg(BRAND_MUTED))
        .block(Block::default().title(" Breakdown ").borders(Borders::ALL));
        frame.render_widget(message, chunks[1].union(chunks[2]));
        draw_footer(frame, chunks[3], footer);
        return;
    };

    let visible_rows = (chunks[1].height as usize).saturating_sub(3);
    let rows: Vec<Row> = breakdown
        .materials
        .iter()
        .skip(app.detail_scroll_offset)
        .take(visible_rows)
        .map(|m| {
            let (source, style) = match m.source {
                PriceSource::Regional => ("regional", Style::default()),
                PriceSource::NationalFallback => {
                    ("national", Style::default().fg(FALLBACK_COLOR))
                }
                PriceSource::Flat => ("flat", Style::default()),
            };
            Row::new(vec![
                m.component.clone(),
                format!("{:.3}", m.quantity),
                thousands(m.unit_price),
                thousands(m.cost),
                source.to_string(),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Percentage(34),
        Constraint::Percentage(14),
        Constraint::Percentage(18),
        Constraint::Percentage(18),
        Constraint::Percentage(16),
    ];
    let table = Table::new(rows, widths)
        .header(Row::new(vec!["Component", "Qty", "Unit Price", "Cost", "Source"]).style(HEADER_STYLE))
        .block(
            Block::default()
                .title(format!(
                    " Recipe: {} ({} materials) ",
                    breakdown.recipe,
                    breakdown.materials.len()
                ))
                .borders(Borders::ALL),
        );
    frame.render_widget(table, chunks[1]);

    if breakdown.materials.len() > visible_rows {
        draw_scrollbar(
            frame,
            chunks[1],
            breakdown.materials.len(),
            app.detail_scroll_offset,
        );
    }

    let line = |label: &str, value: f64| {
        Row::new(vec![label.to_string(), thousands(value)])
    };
    let markup_rows = vec![
        line("Materials", breakdown.material_total),
        line("Wastage", breakdown.wastage),
        line("Labour", breakdown.labour),
        line("Transport", breakdown.transport),
        line("Plant", breakdown.plant),
        line("Subtotal", breakdown.subtotal),
        line("Overhead & profit", breakdown.overhead),
        line("Unit cost", breakdown.total).style(HEADER_STYLE),
    ];
    let markups = Table::new(
        markup_rows,
        [Constraint::Percentage(50), Constraint::Percentage(50)],
    )
    .block(Block::default().title(" Markups ").borders(Borders::ALL));
    frame.render_widget(markups, chunks[2]);

    draw_footer(frame, chunks[3], footer);
}
