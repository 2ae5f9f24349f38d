//! Paints a [`ReportLayout`] with genpdf.
//!
//! genpdf tables cannot fill cell backgrounds, so table rows are a custom [`Element`]. Text is
//! wrapped by word and the grid is drawn last. genpdf strokes every line 1 pt wide, so a
//! background is a stack of lines spaced closer than that.

use crate::error::ReportError;
use crate::services::reports::layout::{Block, ReportLayout, Table, TableKind};
use chrono::{DateTime, FixedOffset};
use genpdf::elements::{PageBreak, Paragraph};
use genpdf::error::Error;
use genpdf::render::Area;
use genpdf::style::{Color, Style};
use genpdf::{Context, Document, Element, Margins, Mm, PageDecorator, Position, RenderResult, Size};
use log::debug;
use std::cell;
use std::path::PathBuf;
use std::rc::Rc;

const MM_PER_PT: f64 = 25.4 / 72.0;

const PAPER: (f64, f64) = (297.0, 210.0);
const MARGIN_TOP: f64 = 120.0 * MM_PER_PT;
const MARGIN_SIDE: f64 = 30.0 * MM_PER_PT;
const MARGIN_BOTTOM: f64 = 50.0 * MM_PER_PT;
const FOOTER_INSET: f64 = 40.0 * MM_PER_PT;

/// Distance between the lines of a filled area. Below the 1 pt stroke width.
const FILL_STEP: f64 = 0.25;

const PRIMARY: Color = Color::Rgb(51, 77, 153);
const SECONDARY: Color = Color::Rgb(204, 204, 204);
const ACCENT: Color = Color::Rgb(26, 102, 179);
const LABEL_FILL: Color = Color::Rgb(230, 230, 230);
const MUTED: Color = Color::Rgb(102, 102, 102);
const WHITE: Color = Color::Rgb(255, 255, 255);
const BLACK: Color = Color::Rgb(0, 0, 0);
const RED: Color = Color::Rgb(255, 0, 0);

pub const CONFIDENTIALITY_BANNER: &str = "RESTRITO - USO INTERNO";

fn pt(value: f64) -> Mm {
    Mm::from(value * MM_PER_PT)
}

/// Height left for content once the decorator has taken its margins.
fn body_height() -> Mm {
    Mm::from(PAPER.1 - MARGIN_TOP - MARGIN_BOTTOM)
}

/// Paints the rectangle at (`x`, `y`) of the given size with `color`.
fn fill_rect(area: &Area<'_>, x: Mm, y: Mm, width: Mm, height: Mm, color: Color) {
    let style = Style::new().with_color(color);
    let half_stroke = f64::from(pt(0.5));
    let height = f64::from(height);
    let last = (height - half_stroke).max(height / 2.0);
    let mut offset = half_stroke.min(height / 2.0);
    loop {
        let line_y = y + Mm::from(offset);
        area.draw_line(
            vec![Position::new(x, line_y), Position::new(x + width, line_y)],
            style,
        );
        if offset >= last {
            break;
        }
        offset = (offset + FILL_STEP).min(last);
    }
}

/// Inputs of a paint that do not come from the layout.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub fonts_dir: PathBuf,
    pub font_family: String,
    pub generated_at: DateTime<FixedOffset>,
}

/// Splits `text` into lines no wider than `max`, as measured by `width_of`.
///
/// Explicit newlines are kept. A word wider than `max` is split between characters so that
/// nothing is cut off.
pub fn wrap_text<W, F>(text: &str, max: W, width_of: F) -> Vec<String>
where
    W: PartialOrd + Copy,
    F: Fn(&str) -> W,
{
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", current, word)
            };
            if width_of(&candidate) <= max {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if width_of(word) <= max {
                current = word.to_string();
                continue;
            }
            for ch in word.chars() {
                let mut piece = current.clone();
                piece.push(ch);
                if width_of(&piece) > max && !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                    current.push(ch);
                } else {
                    current = piece;
                }
            }
        }
        lines.push(current);
    }
    lines
}

struct Cell {
    text: String,
    style: Style,
    fill: Option<Color>,
    centered: bool,
}

impl Cell {
    fn new(text: &str, style: Style) -> Self {
        Cell {
            text: text.to_string(),
            style,
            fill: None,
            centered: false,
        }
    }

    fn filled(mut self, color: Color) -> Self {
        self.fill = Some(color);
        self
    }

    fn centered(mut self) -> Self {
        self.centered = true;
        self
    }
}

/// Wrapped lines of one row that fit in `available`, with `pad_y` above and below.
fn capacity(available: Mm, line_height: Mm, pad_y: Mm) -> usize {
    let room = f64::from(available - pad_y * 2.0);
    let line = f64::from(line_height);
    if room <= 0.0 || line <= 0.0 {
        return 0;
    }
    (room / line + 1e-6).floor() as usize
}

/// How many of the `remaining` lines of a row go on the current page.
///
/// `0` moves the row to the next page. That happens when no line fits, or when the row has not
/// started yet and would fit whole on a fresh page.
fn lines_to_print(
    remaining: usize,
    available: Mm,
    line_height: Mm,
    pad_y: Mm,
    started: bool,
) -> usize {
    let fit = capacity(available, line_height, pad_y);
    if fit >= remaining {
        return remaining;
    }
    if !started && capacity(body_height(), line_height, pad_y) >= remaining {
        return 0;
    }
    fit
}

/// A row of cells. A row taller than the space left continues on the next page.
struct TableRow {
    cells: Vec<Cell>,
    widths: Vec<f64>,
    padding: (Mm, Mm),
    grid: bool,
    lines: Option<Vec<Vec<String>>>,
    printed: usize,
}

impl TableRow {
    fn new(cells: Vec<Cell>, widths: Vec<f64>, padding: (Mm, Mm), grid: bool) -> Self {
        TableRow {
            cells,
            widths,
            padding,
            grid,
            lines: None,
            printed: 0,
        }
    }
}

impl Element for TableRow {
    fn render(
        &mut self,
        context: &Context,
        area: Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let (pad_x, pad_y) = self.padding;
        let total = area.size().width;

        let mut columns = Vec::with_capacity(self.cells.len());
        let mut x = Mm::from(0.0);
        let mut line_height = Mm::from(0.0);
        for (cell, percent) in self.cells.iter().zip(&self.widths) {
            let width = total * (percent / 100.0);
            let cell_style = style.and(cell.style);
            line_height = line_height.max(cell_style.line_height(&context.font_cache));
            columns.push((x, width, cell_style));
            x += width;
        }
        let row_width = x;

        if self.lines.is_none() {
            let wrapped = columns
                .iter()
                .zip(&self.cells)
                .map(|((_, width, cell_style), cell)| {
                    wrap_text(&cell.text, *width - pad_x * 2.0, |s| {
                        cell_style.str_width(&context.font_cache, s)
                    })
                })
                .collect();
            self.lines = Some(wrapped);
        }
        let lines = self.lines.as_deref().unwrap_or(&[]);
        let total_lines = lines.iter().map(Vec::len).max().unwrap_or(0);
        let remaining = total_lines.saturating_sub(self.printed);

        let count = lines_to_print(
            remaining,
            area.size().height,
            line_height,
            pad_y,
            self.printed > 0,
        );
        if count == 0 {
            return Ok(RenderResult {
                size: Size::new(0.0, 0.0),
                has_more: true,
            });
        }
        let height = line_height * (count as f64) + pad_y * 2.0;

        for ((x, width, _), cell) in columns.iter().zip(&self.cells) {
            if let Some(color) = cell.fill {
                fill_rect(&area, *x, Mm::from(0.0), *width, height, color);
            }
        }

        for (((x, width, cell_style), cell), cell_lines) in
            columns.iter().zip(&self.cells).zip(lines)
        {
            for (i, line) in cell_lines.iter().skip(self.printed).take(count).enumerate() {
                let offset = if cell.centered {
                    (*width - cell_style.str_width(&context.font_cache, line)) / 2.0
                } else {
                    pad_x
                };
                area.print_str(
                    &context.font_cache,
                    Position::new(*x + offset, pad_y + line_height * (i as f64)),
                    *cell_style,
                    line,
                )?;
            }
        }

        if self.grid {
            let rule = Style::new().with_color(BLACK);
            for y in [Mm::from(0.0), height] {
                area.draw_line(vec![Position::new(0.0, y), Position::new(row_width, y)], rule);
            }
            let mut edges: Vec<Mm> = columns.iter().map(|(x, ..)| *x).collect();
            edges.push(row_width);
            for edge in edges {
                area.draw_line(
                    vec![Position::new(edge, 0.0), Position::new(edge, height)],
                    rule,
                );
            }
        }

        self.printed += count;
        Ok(RenderResult {
            size: Size::new(row_width, height),
            has_more: self.printed < total_lines,
        })
    }
}

/// Fixed vertical gap. Shrinks to what is left at the bottom of a page.
struct Gap(Mm);

impl Element for Gap {
    fn render(
        &mut self,
        _context: &Context,
        area: Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, Error> {
        let available = area.size().height;
        let height = if self.0 > available { available } else { self.0 };
        Ok(RenderResult {
            size: Size::new(0.0, height),
            has_more: false,
        })
    }
}

fn title_style(base: Style) -> Style {
    base.bold().with_font_size(12).with_color(BLACK)
}

/// Left edge of the footer text and of a right-aligned label of `label_width`.
fn footer_columns(page_width: Mm, label_width: Mm) -> (Mm, Mm) {
    let inset = Mm::from(FOOTER_INSET);
    (inset, page_width - inset - label_width)
}

/// Draws the title, divider, footer, banner and page number on every page.
struct ReportDecorator {
    title: String,
    generated: String,
    pages: Rc<cell::Cell<usize>>,
}

impl PageDecorator for ReportDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &Context,
        mut area: Area<'a>,
        style: Style,
    ) -> Result<Area<'a>, Error> {
        let page_number = self.pages.get() + 1;
        self.pages.set(page_number);
        let page = area.size();
        let fonts = &context.font_cache;

        let title_style = title_style(style);
        let title_width = title_style.str_width(fonts, &self.title);
        area.print_str(
            fonts,
            Position::new((page.width - title_width) / 2.0, pt(62.0)),
            title_style,
            &self.title,
        )?;
        let left = Mm::from(MARGIN_SIDE);
        fill_rect(&area, left, pt(94.0), page.width - left * 2.0, pt(2.0), PRIMARY);

        let footer_style = style.with_font_size(8).with_color(MUTED);
        let footer_y = page.height - pt(33.0);
        let page_label = format!("Página {}", page_number);
        let (footer_x, label_x) =
            footer_columns(page.width, footer_style.str_width(fonts, &page_label));
        area.print_str(
            fonts,
            Position::new(footer_x, footer_y),
            footer_style,
            format!("Gerado em: {}", self.generated),
        )?;
        area.print_str(fonts, Position::new(label_x, footer_y), footer_style, &page_label)?;

        let banner_style = style.bold().with_font_size(10).with_color(RED);
        let banner_width = banner_style.str_width(fonts, CONFIDENTIALITY_BANNER);
        area.print_str(
            fonts,
            Position::new((page.width - banner_width) / 2.0, page.height - pt(22.0)),
            banner_style,
            CONFIDENTIALITY_BANNER,
        )?;

        area.add_margins(Margins::trbl(
            MARGIN_TOP,
            MARGIN_SIDE,
            MARGIN_BOTTOM,
            MARGIN_SIDE,
        ));
        Ok(area)
    }
}

/// Font size of data rows, header rows and the padding of a table kind.
struct Look {
    body_size: u8,
    header_size: u8,
    header_fill: Color,
    label_fill: Color,
    zebra_fill: Color,
    padding: (Mm, Mm),
}

fn look(kind: TableKind) -> Look {
    match kind {
        TableKind::RequestInfo => Look {
            body_size: 10,
            header_size: 10,
            header_fill: PRIMARY,
            label_fill: SECONDARY,
            zebra_fill: WHITE,
            padding: (pt(8.0), pt(6.0)),
        },
        TableKind::Counts => Look {
            body_size: 11,
            header_size: 11,
            header_fill: PRIMARY,
            label_fill: SECONDARY,
            zebra_fill: WHITE,
            padding: (pt(8.0), pt(6.0)),
        },
        TableKind::KeyAttributes => Look {
            body_size: 9,
            header_size: 9,
            header_fill: PRIMARY,
            label_fill: LABEL_FILL,
            zebra_fill: WHITE,
            padding: (pt(6.0), pt(4.0)),
        },
        TableKind::KeyList => Look {
            body_size: 8,
            header_size: 9,
            header_fill: PRIMARY,
            label_fill: WHITE,
            zebra_fill: Color::Rgb(245, 245, 245),
            padding: (pt(4.0), pt(6.0)),
        },
        TableKind::EventHistory => Look {
            body_size: 7,
            header_size: 8,
            header_fill: ACCENT,
            label_fill: WHITE,
            zebra_fill: Color::Rgb(242, 242, 242),
            padding: (pt(4.0), pt(6.0)),
        },
    }
}

fn table_rows(table: &Table) -> Vec<TableRow> {
    let look = look(table.kind);
    let mut rows = Vec::with_capacity(table.rows.len() + 1);

    if let Some(header) = &table.header {
        let style = Style::new()
            .bold()
            .with_font_size(look.header_size)
            .with_color(WHITE);
        rows.push(TableRow::new(
            header
                .iter()
                .map(|h| Cell::new(h, style).filled(look.header_fill).centered())
                .collect(),
            table.widths.clone(),
            look.padding,
            true,
        ));
    }

    for (i, values) in table.rows.iter().enumerate() {
        let body = Style::new().with_font_size(look.body_size);
        let fill = if table.zebra && i % 2 == 1 {
            look.zebra_fill
        } else {
            WHITE
        };
        let cells = values
            .iter()
            .enumerate()
            .map(|(column, value)| {
                if column == 0 && table.kind.is_label_value() {
                    Cell::new(value, body.bold()).filled(look.label_fill)
                } else {
                    Cell::new(value, body).filled(fill)
                }
            })
            .collect();
        rows.push(TableRow::new(cells, table.widths.clone(), look.padding, true));
    }
    rows
}

fn section(title: &str) -> TableRow {
    let style = Style::new().bold().with_font_size(12).with_color(PRIMARY);
    TableRow::new(
        vec![Cell::new(title, style).filled(SECONDARY)],
        vec![100.0],
        (pt(6.0), pt(4.0)),
        false,
    )
}

fn push_block(doc: &mut Document, block: &Block) {
    match block {
        Block::Section(title) => doc.push(section(title)),
        Block::KeyHeading(text) => doc.push(
            Paragraph::new(text.as_str())
                .styled(Style::new().bold().with_font_size(11).with_color(ACCENT)),
        ),
        Block::Label(text) => {
            doc.push(Paragraph::new(text.as_str()).styled(Style::new().bold().with_font_size(10)))
        }
        Block::Table(table) => {
            for row in table_rows(table) {
                doc.push(row);
            }
        }
        Block::Spacer(points) => doc.push(Gap(pt(*points))),
        Block::PageBreak => doc.push(PageBreak::new()),
        Block::Note(text) => doc.push(
            Paragraph::new(text.as_str()).styled(Style::new().with_font_size(8).with_color(MUTED)),
        ),
    }
}

/// A painted report.
#[derive(Debug, Clone)]
pub struct Painted {
    pub bytes: Vec<u8>,
    pub pages: usize,
}

/// Renders the report to PDF. Loads the configured font family on every call.
pub fn render(layout: &ReportLayout, settings: &RenderSettings) -> Result<Painted, ReportError> {
    let family = genpdf::fonts::from_files(&settings.fonts_dir, &settings.font_family, None)?;
    let mut doc = Document::new(family);
    doc.set_title(layout.title());
    doc.set_paper_size(Size::new(PAPER.0, PAPER.1));
    doc.set_font_size(9);
    doc.set_line_spacing(1.2f64);
    let pages = Rc::new(cell::Cell::new(0));
    doc.set_page_decorator(ReportDecorator {
        title: layout.title().to_string(),
        generated: settings
            .generated_at
            .format("%d/%m/%Y às %H:%M:%S")
            .to_string(),
        pages: Rc::clone(&pages),
    });

    for block in &layout.blocks {
        push_block(&mut doc, block);
    }

    let mut bytes = Vec::new();
    doc.render(&mut bytes)?;
    debug!("{} painted on {} page(s)", layout.title(), pages.get());
    Ok(Painted {
        bytes,
        pages: pages.get(),
    })
}
