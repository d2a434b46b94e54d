use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use strum::IntoEnumIterator;
use time::OffsetDateTime;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::app::state::{delete_prompt, FormState, PageState, PageView, SubmitMode, ToastKind};
use crate::catalog::{FormField, Product};
use crate::config::Palette;
use crate::highlight::{build_highlight_regex, highlight_line};

pub mod format;

use format::{category_icon, format_brl, format_date, format_stock, is_new, truncate};

pub const APP_TITLE: &str = "GreenEats – Catálogo de Produtos";
const APP_SUBTITLE: &str = "Gerencie os produtos dos agricultores de forma simples e sustentável.";
const EMPTY_TITLE: &str = "Nenhum produto cadastrado ainda";

/// Per-frame rendering inputs that do not live in the page state.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub palette: Palette,
    pub description_chars: usize,
    pub now: OffsetDateTime,
}

pub fn draw_app(
    frame: &mut Frame,
    state: &PageState,
    list_state: &mut ListState,
    options: &RenderOptions,
) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(4),
        ])
        .split(frame.size());

    draw_header(frame, vertical[0], &options.palette);
    draw_filters(frame, vertical[1], state, &options.palette);

    match state.view() {
        PageView::Loading => draw_message(
            frame,
            vertical[2],
            vec![Line::from(Span::styled(
                "Carregando produtos...",
                Style::default().fg(options.palette.muted),
            ))],
        ),
        PageView::Error(message) => draw_message(
            frame,
            vertical[2],
            vec![
                Line::from(Span::styled(
                    format!("⚠️ {message}"),
                    Style::default()
                        .fg(options.palette.error)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Pressione r para tentar novamente.",
                    Style::default().fg(options.palette.muted),
                )),
            ],
        ),
        PageView::Empty => draw_message(
            frame,
            vertical[2],
            vec![
                Line::from(Span::styled(
                    format!("🌿 {EMPTY_TITLE}"),
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(Span::styled(
                    "Adicione novos itens pressionando a.",
                    Style::default().fg(options.palette.muted),
                )),
            ],
        ),
        PageView::Ready(products) => {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
                .split(vertical[2]);
            list_state.select(Some(state.selected.min(products.len() - 1)));
            draw_list(frame, columns[0], state, &products, list_state, options);
            draw_detail(frame, columns[1], state.selected_product(), options);
        }
    }

    draw_footer(frame, vertical[3], state, &options.palette);

    if let Some(form) = state.form() {
        draw_form(frame, form, &options.palette);
    } else if let Some(product) = state.pending_delete() {
        draw_confirm_delete(frame, product, &options.palette);
    }
}

fn draw_header(frame: &mut Frame, area: Rect, palette: &Palette) {
    let header = Paragraph::new(vec![
        Line::from(vec![
            Span::raw("🌱 "),
            Span::styled(
                APP_TITLE,
                Style::default()
                    .fg(palette.accent)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(Span::styled(APP_SUBTITLE, Style::default().fg(palette.muted))),
    ])
    .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, area);
}

fn draw_filters(frame: &mut Frame, area: Rect, state: &PageState, palette: &Palette) {
    let label = Style::default().fg(palette.muted);
    let search_style = if state.search_active {
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(palette.text)
    };
    let mut spans = vec![Span::styled("Buscar por título: ", label)];
    if state.filter.search.is_empty() && !state.search_active {
        spans.push(Span::styled("Ex.: Alface Crespa (/)", label));
    } else {
        spans.push(Span::styled(state.filter.search.clone(), search_style));
    }
    if state.search_active {
        spans.push(Span::styled("▌", search_style));
    }
    spans.push(Span::raw("  │  "));
    spans.push(Span::styled("Categoria: ", label));
    spans.push(Span::styled(
        format!("◀ {} ▶", state.filter.category),
        Style::default()
            .fg(palette.accent)
            .add_modifier(Modifier::BOLD),
    ));
    if !state.filter.is_default() {
        spans.push(Span::raw("  │  "));
        spans.push(Span::styled("x limpar filtros", label));
    }
    let filters = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .title("Filtros")
            .borders(Borders::ALL)
            .border_style(search_style),
    );
    frame.render_widget(filters, area);
}

fn draw_message(frame: &mut Frame, area: Rect, lines: Vec<Line<'static>>) {
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, centered_rect(80, 60, area));
}

fn draw_list(
    frame: &mut Frame,
    area: Rect,
    state: &PageState,
    products: &[&Product],
    list_state: &mut ListState,
    options: &RenderOptions,
) {
    let palette = &options.palette;
    let regex = build_highlight_regex(&state.filter.search);
    let highlight_style = Style::default()
        .fg(palette.highlight)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);

    let items: Vec<ListItem> = products
        .iter()
        .map(|product| {
            let mut title = vec![Span::raw(format!("{} ", category_icon(&product.categoria)))];
            title.extend(highlight_line(
                &product.titulo,
                regex.as_ref(),
                highlight_style,
                Style::default().add_modifier(Modifier::BOLD),
            ));
            if is_new(product, options.now) {
                title.push(Span::raw(" "));
                title.push(Span::styled(
                    "[Novo]",
                    Style::default()
                        .fg(palette.success)
                        .add_modifier(Modifier::BOLD),
                ));
            }
            let categoria = if product.categoria.is_empty() {
                format::MISSING
            } else {
                product.categoria.as_str()
            };
            let meta = Line::from(vec![
                Span::raw("   "),
                Span::styled(format_brl(product.preco), Style::default().fg(palette.text)),
                Span::styled(" • ", Style::default().fg(palette.muted)),
                Span::styled(
                    categoria.to_string(),
                    Style::default().fg(palette.category_color(&product.categoria)),
                ),
            ]);
            ListItem::new(vec![Line::from(title), meta])
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(format!("Produtos ({})", products.len()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.accent)),
        )
        .highlight_style(
            Style::default()
                .bg(palette.selection_bg)
                .fg(palette.selection_fg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");
    frame.render_stateful_widget(list, area, list_state);
}

fn draw_detail(frame: &mut Frame, area: Rect, product: Option<&Product>, options: &RenderOptions) {
    let palette = &options.palette;
    let label = Style::default().fg(palette.muted);
    let text: Text = match product {
        Some(product) => {
            let mut lines = vec![
                Line::from(vec![
                    Span::raw(format!("{} ", category_icon(&product.categoria))),
                    Span::styled(
                        product.titulo.clone(),
                        Style::default()
                            .fg(palette.text)
                            .add_modifier(Modifier::BOLD),
                    ),
                ]),
                Line::from(""),
            ];
            let categoria = if product.categoria.is_empty() {
                format::MISSING.to_string()
            } else {
                product.categoria.clone()
            };
            let rows = [
                ("Categoria", categoria),
                ("Preço", format_brl(product.preco)),
                ("Estoque", format_stock(product.estoque)),
                ("Criado em", format_date(product.created_at())),
                ("ID", product.id.to_string()),
            ];
            for (name, value) in rows {
                lines.push(Line::from(vec![
                    Span::styled(format!("{name:<10} "), label),
                    Span::styled(value, Style::default().fg(palette.text)),
                ]));
            }
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Descrição", label)));
            let descricao = product.descricao.as_deref().unwrap_or_default();
            lines.push(Line::from(truncate(descricao, options.description_chars)));
            Text::from(lines)
        }
        None => Text::from("Selecione um produto."),
    };
    let detail = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .block(Block::default().title("Detalhes").borders(Borders::ALL));
    frame.render_widget(detail, area);
}

fn draw_footer(frame: &mut Frame, area: Rect, state: &PageState, palette: &Palette) {
    let mut lines = Vec::with_capacity(2);
    match &state.toast {
        Some(toast) => {
            let (icon, color) = match toast.kind {
                ToastKind::Success => ("✔", palette.success),
                ToastKind::Error => ("✖", palette.error),
            };
            lines.push(Line::from(Span::styled(
                format!("{icon} {}", toast.message),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )));
        }
        None => lines.push(Line::from("")),
    }
    let hints = if state.search_active {
        "Enter manter busca • Esc limpar busca • Backspace apagar"
    } else {
        "j/k mover • / buscar • c/C categoria • x limpar • a adicionar • e editar • d excluir • Ctrl-r recarregar • q sair"
    };
    lines.push(Line::from(Span::styled(
        hints,
        Style::default().fg(palette.muted),
    )));
    let footer = Paragraph::new(lines).block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, area);
}

fn draw_form(frame: &mut Frame, form: &FormState, palette: &Palette) {
    let area = centered_rect(70, 80, frame.size());
    frame.render_widget(Clear, area);
    let title = match form.mode() {
        SubmitMode::Create => "Adicionar Produto",
        SubmitMode::Update => "Editar Produto",
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let error_style = Style::default().fg(palette.error);
    let field_width = inner.width.saturating_sub(3) as usize;
    let mut lines: Vec<Line> = Vec::new();
    for message in &form.server_errors {
        lines.push(Line::from(Span::styled(format!("⚠ {message}"), error_style)));
    }
    if !form.server_errors.is_empty() {
        lines.push(Line::from(""));
    }

    let mut cursor = None;
    for field in FormField::iter() {
        let focused = field == form.focus;
        let label_style = if focused {
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.muted)
        };
        lines.push(Line::from(Span::styled(field.label(), label_style)));

        let value = form.draft.field(field);
        let shown = if field == FormField::Categoria {
            format!("◀ {} {value} ▶", category_icon(value))
        } else {
            tail_to_width(value, field_width)
        };
        if focused && field != FormField::Categoria {
            cursor = Some((
                inner.x + 2 + shown.width() as u16,
                inner.y + lines.len() as u16,
            ));
        }
        let marker = if focused { "▸ " } else { "  " };
        lines.push(Line::from(vec![
            Span::styled(marker, label_style),
            Span::styled(shown, Style::default().fg(palette.text)),
        ]));
        if let Some(message) = form.field_errors.get(field) {
            lines.push(Line::from(Span::styled(format!("  {message}"), error_style)));
        }
    }

    lines.push(Line::from(""));
    let status = if form.submitting() {
        Span::styled(
            "Salvando...",
            Style::default()
                .fg(palette.highlight)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        Span::styled(
            "Enter salvar • Tab próximo campo • ←/→ categoria • Esc fechar",
            Style::default().fg(palette.muted),
        )
    };
    lines.push(Line::from(status));
    frame.render_widget(Paragraph::new(lines), inner);

    if let Some((x, y)) = cursor {
        if y < inner.bottom() && inner.width > 0 {
            frame.set_cursor(x.min(inner.right().saturating_sub(1)), y);
        }
    }
}

fn draw_confirm_delete(frame: &mut Frame, product: &Product, palette: &Palette) {
    let area = centered_rect(60, 25, frame.size());
    frame.render_widget(Clear, area);
    let paragraph = Paragraph::new(vec![
        Line::from(Span::styled(
            delete_prompt(&product.titulo),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "y/Enter excluir • n/Esc cancelar",
            Style::default().fg(palette.muted),
        )),
    ])
    .block(
        Block::default()
            .title("Excluir produto")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.error)),
    )
    .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// The trailing part of `text` that fits in `width` columns.
fn tail_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut used = 0;
    let mut start = text.len();
    for (idx, grapheme) in text.grapheme_indices(true).rev() {
        let w = grapheme.width();
        if used + w > width {
            break;
        }
        used += w;
        start = idx;
    }
    text[start..].to_string()
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::PageAction;
    use crate::catalog::ProductId;
    use crate::config::{themes::ThemeRegistry, ThemeName};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use time::macros::datetime;

    fn render(state: &PageState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).expect("terminal");
        let options = RenderOptions {
            palette: ThemeRegistry::default().palette(ThemeName::Dark),
            description_chars: 140,
            now: datetime!(2024-06-10 12:00 UTC),
        };
        let mut list_state = ListState::default();
        terminal
            .draw(|frame| draw_app(frame, state, &mut list_state, &options))
            .expect("draw");
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer.get(x, y).symbol());
            }
            out.push('\n');
        }
        out
    }

    fn loaded(products: Vec<Product>) -> PageState {
        let (state, _) = PageState::default().update(PageAction::ProductsLoaded(products));
        state
    }

    fn product(id: i64, titulo: &str) -> Product {
        Product {
            id: ProductId::Number(id),
            titulo: titulo.into(),
            descricao: Some("Colheita orgânica".into()),
            preco: 1234.5,
            categoria: "Fruta".into(),
            estoque: Some(40),
            data_criacao: Some("2024-06-08T09:00:00Z".into()),
        }
    }

    #[test]
    fn shows_loading_first() {
        let screen = render(&PageState::default());
        assert!(screen.contains("Carregando produtos..."));
        assert!(screen.contains("Catálogo de Produtos"));
    }

    #[test]
    fn shows_empty_state() {
        let screen = render(&loaded(Vec::new()));
        assert!(screen.contains(EMPTY_TITLE));
    }

    #[test]
    fn lists_products_with_details() {
        let screen = render(&loaded(vec![product(1, "Manga Palmer")]));
        assert!(screen.contains("Manga Palmer"));
        assert!(screen.contains("R$ 1.234,50"));
        assert!(screen.contains("[Novo]"));
        assert!(screen.contains("08/06/2024"));
    }

    #[test]
    fn shows_load_error_with_retry_hint() {
        let (state, _) = PageState::default().update(PageAction::ProductsFailed);
        let screen = render(&state);
        assert!(screen.contains("Pressione r para tentar novamente."));
    }

    #[test]
    fn confirm_overlay_names_product() {
        let (state, _) =
            loaded(vec![product(1, "Manga Palmer")]).update(PageAction::RequestDeleteSelected);
        let screen = render(&state);
        assert!(screen.contains("Tem certeza que deseja excluir Manga Palmer?"));
    }

    #[test]
    fn form_shows_field_errors() {
        let (state, _) = loaded(Vec::new()).update(PageAction::OpenCreate);
        let (state, _) = state.update(PageAction::Submit);
        let screen = render(&state);
        assert!(screen.contains("Adicionar Produto"));
        assert!(screen.contains(crate::catalog::validation::TITULO_MESSAGE));
    }

    #[test]
    fn tail_keeps_end_of_long_values() {
        assert_eq!(tail_to_width("abcdef", 3), "def");
        assert_eq!(tail_to_width("abc", 10), "abc");
    }
}
