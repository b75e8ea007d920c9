//! Places the header, client block, item table and totals onto pages.
//!
//! Everything sits at fixed offsets measured down from the top of the content
//! frame. Only the item table and the totals block can move to a later page.

use crate::assembler::DocumentAssembler;
use crate::canvas::{Canvas, TextStyle};
use crate::error::InvoiceError;
use crate::font::FontId;
use crate::format::InvoiceFormatter;
use crate::model::{InvoiceData, Issuer, LineItem};
use crate::totals::Totals;
use crate::types::{Color, Point, Pt, Rect};

pub const TITLE: &str = "INVOICE";
pub const TITLE_SIZE: f32 = 20.0;
pub const BODY_SIZE: f32 = 10.0;
pub const GRAND_TOTAL_SIZE: f32 = 12.0;

pub const ROW_HEIGHT: i32 = 20;
pub const BAND_HEIGHT: i32 = 20;
pub const CELL_PADDING: i32 = 5;
/// Distance from a row's top edge to its text baseline.
pub const ROW_BASELINE: i32 = 14;
pub const LINE_PITCH: i32 = 15;
pub const SEPARATOR_GAP: i32 = 10;
pub const TOTAL_ROWS: i32 = 3;

const TITLE_BASELINE: i32 = 18;
const HEADER_LINES_TOP: i32 = 38;
const HEADER_BOTTOM_PAD: i32 = 12;
const CLIENT_FIRST_BASELINE: i32 = 12;
const CLIENT_GAP: i32 = 20;

/// Right edges of the Description, Qty and Rate columns as thousandths of the
/// content width. Amount runs to the right margin.
const COLUMN_STOPS: [i64; 3] = [500, 640, 820];

pub const ELLIPSIS: &str = "...";

pub const META_ROW: &str = "invoice.row";
pub const META_TABLE_HEADER: &str = "invoice.table_header";
pub const META_TOTALS: &str = "invoice.totals";

fn band_color() -> Color {
    Color::gray(0.9)
}

fn rule_color() -> Color {
    Color::gray(0.8)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakReason {
    /// Header and client block left no room for the table band plus one row.
    TableStart,
    RowOverflow,
    TotalsOverflow,
}

impl BreakReason {
    pub fn as_str(self) -> &'static str {
        match self {
            BreakReason::TableStart => "table_start",
            BreakReason::RowOverflow => "row_overflow",
            BreakReason::TotalsOverflow => "totals_overflow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBreak {
    pub reason: BreakReason,
    /// 1-based number of the page that was started.
    pub page: usize,
    /// Index of the item that did not fit, when a row caused the break.
    pub row: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutReport {
    pub breaks: Vec<PageBreak>,
    pub rows: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub caption: &'static str,
    pub left: Pt,
    pub right: Pt,
    pub align: Align,
}

impl Column {
    /// Text anchor: start x for left-aligned columns, end x otherwise.
    pub fn anchor(&self) -> Pt {
        let padding = Pt::from_i32(CELL_PADDING);
        match self.align {
            Align::Left => self.left + padding,
            Align::Right => self.right - padding,
        }
    }

    pub fn text_width(&self) -> Pt {
        (self.right - self.left - Pt::from_i32(CELL_PADDING) * 2).max(Pt::ZERO)
    }
}

pub fn table_columns(content: Rect) -> [Column; 4] {
    let x = content.x;
    let stop = |thousandths: i64| x + content.width.mul_ratio(thousandths, 1000);
    let description = stop(COLUMN_STOPS[0]);
    let quantity = stop(COLUMN_STOPS[1]);
    let rate = stop(COLUMN_STOPS[2]);
    [
        Column {
            caption: "Description",
            left: x,
            right: description,
            align: Align::Left,
        },
        Column {
            caption: "Qty",
            left: description,
            right: quantity,
            align: Align::Right,
        },
        Column {
            caption: "Rate",
            left: quantity,
            right: rate,
            align: Align::Right,
        },
        Column {
            caption: "Amount",
            left: rate,
            right: content.right(),
            align: Align::Right,
        },
    ]
}

pub fn totals_block_height() -> Pt {
    Pt::from_i32(SEPARATOR_GAP + TOTAL_ROWS * ROW_HEIGHT)
}

/// Collapses control characters (newlines, tabs) to spaces so a value is
/// always drawn as one run.
pub fn single_line(text: &str) -> String {
    text.chars()
        .map(|ch| if ch.is_control() { ' ' } else { ch })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Shortens `text` with a trailing ellipsis until it fits `max_width`.
/// Returns an empty string when not even the ellipsis fits.
pub fn fit_text(
    canvas: &Canvas,
    text: &str,
    style: TextStyle,
    max_width: Pt,
) -> Result<String, InvoiceError> {
    if canvas.measure_text_width(text, style.font, style.size)? <= max_width {
        return Ok(text.to_string());
    }
    let mut fitted = String::new();
    for ch in text.chars() {
        let mut candidate = fitted.clone();
        candidate.push(ch);
        let trial = format!("{}{ELLIPSIS}", candidate.trim_end());
        if canvas.measure_text_width(&trial, style.font, style.size)? > max_width {
            break;
        }
        fitted = candidate;
    }
    let shortened = format!("{}{ELLIPSIS}", fitted.trim_end());
    if canvas.measure_text_width(&shortened, style.font, style.size)? > max_width {
        return Ok(String::new());
    }
    Ok(shortened)
}

/// Draws one invoice into an assembler.
pub struct InvoiceLayout<'a> {
    pub issuer: &'a Issuer,
    pub formatter: &'a dyn InvoiceFormatter,
}

impl<'a> InvoiceLayout<'a> {
    pub fn new(issuer: &'a Issuer, formatter: &'a dyn InvoiceFormatter) -> Self {
        Self { issuer, formatter }
    }

    pub fn lay_out(
        &self,
        invoice: &InvoiceData,
        totals: &Totals,
        assembler: &mut DocumentAssembler,
    ) -> Result<LayoutReport, InvoiceError> {
        let mut report = LayoutReport::default();
        let canvas = assembler.new_page()?;
        self.draw_header(canvas, invoice)?;
        self.draw_client(canvas, invoice)?;

        let band = Pt::from_i32(BAND_HEIGHT);
        let row = Pt::from_i32(ROW_HEIGHT);
        let first_block = if invoice.items.is_empty() {
            totals_block_height()
        } else {
            row
        };
        if !assembler.current()?.frame().fits(band + first_block) {
            start_page(assembler, &mut report, BreakReason::TableStart, None)?;
            ensure_fits(assembler, band + first_block, "item table")?;
        }
        let page = assembler.page_count();
        let mut columns = draw_table_header(assembler.current()?, page)?;

        for (index, item) in invoice.items.iter().enumerate() {
            if !assembler.current()?.frame().fits(row) {
                start_page(assembler, &mut report, BreakReason::RowOverflow, Some(index))?;
                ensure_fits(assembler, band + row, "item row")?;
                let page = assembler.page_count();
                columns = draw_table_header(assembler.current()?, page)?;
            }
            self.draw_row(assembler.current()?, &columns, index, item)?;
            report.rows += 1;
        }

        if !assembler.current()?.frame().fits(totals_block_height()) {
            start_page(assembler, &mut report, BreakReason::TotalsOverflow, None)?;
            ensure_fits(assembler, totals_block_height(), "totals block")?;
        }
        self.draw_totals(assembler.current()?, &columns, totals)?;
        Ok(report)
    }

    fn draw_header(&self, canvas: &mut Canvas, invoice: &InvoiceData) -> Result<(), InvoiceError> {
        let content = canvas.frame().rect();
        let top = canvas.frame().top_y();
        let body = TextStyle::new(FontId::Regular, BODY_SIZE);
        let bold = TextStyle::new(FontId::Bold, BODY_SIZE);

        let mut left_lines: Vec<String> = vec![single_line(&self.issuer.name)];
        left_lines.extend(self.issuer.address_lines.iter().map(|line| single_line(line)));
        if let Some(email) = &self.issuer.email {
            left_lines.push(single_line(email));
        }
        let mut right_lines: Vec<(String, TextStyle)> = vec![
            (
                format!("Invoice #: {}", single_line(invoice.display_number())),
                bold,
            ),
            (
                format!("Date: {}", self.formatter.date(invoice.issue_date)),
                body,
            ),
            (
                format!("Due Date: {}", self.formatter.date(invoice.due_date)),
                body,
            ),
        ];
        if let Some(status) = invoice.status {
            right_lines.push((format!("Status: {}", status.label()), body));
        }

        let line_count = left_lines.len().max(right_lines.len()) as i32;
        let height = Pt::from_i32(
            HEADER_LINES_TOP + LINE_PITCH * (line_count - 1).max(0) + HEADER_BOTTOM_PAD,
        );
        if !canvas.frame().fits(height) {
            return Err(InvoiceError::Unplaceable(
                "header block is taller than the page content area".to_string(),
            ));
        }

        canvas.draw_text(
            TITLE,
            content.x,
            top - Pt::from_i32(TITLE_BASELINE),
            TextStyle::new(FontId::Bold, TITLE_SIZE),
        )?;
        for (index, line) in left_lines.iter().enumerate() {
            let y = top - Pt::from_i32(HEADER_LINES_TOP + LINE_PITCH * index as i32);
            canvas.draw_text(line, content.x, y, body)?;
        }
        let right_width = content.width.mul_ratio(1, 2);
        for (index, (line, style)) in right_lines.iter().enumerate() {
            let y = top - Pt::from_i32(HEADER_LINES_TOP + LINE_PITCH * index as i32);
            let text = fit_text(canvas, line, *style, right_width)?;
            canvas.draw_text_right(&text, content.right(), y, *style)?;
        }
        canvas.frame_mut().advance(height);
        Ok(())
    }

    fn draw_client(&self, canvas: &mut Canvas, invoice: &InvoiceData) -> Result<(), InvoiceError> {
        let Some(client) = &invoice.client else {
            return Err(InvoiceError::InvalidInput("client is missing".to_string()));
        };
        let mut lines: Vec<(String, TextStyle)> = vec![
            (
                "Bill To:".to_string(),
                TextStyle::new(FontId::Bold, BODY_SIZE),
            ),
            (
                single_line(&client.name),
                TextStyle::new(FontId::Regular, BODY_SIZE),
            ),
        ];
        if let Some(email) = client
            .email
            .as_deref()
            .map(single_line)
            .filter(|email| !email.is_empty())
        {
            lines.push((email, TextStyle::new(FontId::Regular, BODY_SIZE)));
        }
        if let Some(address) = &client.address {
            for line in address.lines().map(single_line).filter(|l| !l.is_empty()) {
                lines.push((line, TextStyle::new(FontId::Regular, BODY_SIZE)));
            }
        }

        let height = Pt::from_i32(LINE_PITCH * lines.len() as i32 + CLIENT_GAP);
        if !canvas.frame().fits(height) {
            return Err(InvoiceError::Unplaceable(
                "client block does not fit below the header".to_string(),
            ));
        }
        let x = canvas.frame().rect().x;
        let top = canvas.frame().top_y();
        for (index, (line, style)) in lines.iter().enumerate() {
            let y = top - Pt::from_i32(CLIENT_FIRST_BASELINE + LINE_PITCH * index as i32);
            canvas.draw_text(line, x, y, *style)?;
        }
        canvas.frame_mut().advance(height);
        Ok(())
    }

    fn draw_row(
        &self,
        canvas: &mut Canvas,
        columns: &[Column; 4],
        index: usize,
        item: &LineItem,
    ) -> Result<(), InvoiceError> {
        let style = TextStyle::new(FontId::Regular, BODY_SIZE);
        let baseline = canvas.frame().top_y() - Pt::from_i32(ROW_BASELINE);
        canvas.meta(META_ROW, index.to_string());

        let [description, quantity, rate, amount] = columns;
        let text = fit_text(
            canvas,
            &single_line(&item.description),
            style,
            description.text_width(),
        )?;
        canvas.draw_text(&text, description.anchor(), baseline, style)?;
        canvas.draw_text_right(
            &self.formatter.quantity(item.quantity),
            quantity.anchor(),
            baseline,
            style,
        )?;
        canvas.draw_text_right(
            &self.formatter.currency(item.rate),
            rate.anchor(),
            baseline,
            style,
        )?;
        let line_amount = item.amount().ok_or_else(|| {
            InvoiceError::InvalidInput(format!("item {}: amount out of range", index + 1))
        })?;
        canvas.draw_text_right(
            &self.formatter.currency(line_amount),
            amount.anchor(),
            baseline,
            style,
        )?;
        canvas.frame_mut().advance(Pt::from_i32(ROW_HEIGHT));
        Ok(())
    }

    fn draw_totals(
        &self,
        canvas: &mut Canvas,
        columns: &[Column; 4],
        totals: &Totals,
    ) -> Result<(), InvoiceError> {
        let content = canvas.frame().rect();
        let rule_y = canvas.frame().top_y() - Pt::from_i32(SEPARATOR_GAP / 2);
        canvas.meta(META_TOTALS, "1");
        canvas.draw_line(
            Point::new(content.x, rule_y),
            Point::new(content.right(), rule_y),
            Pt::from_i32(1),
            rule_color(),
        );
        canvas.frame_mut().advance(Pt::from_i32(SEPARATOR_GAP));

        let body = TextStyle::new(FontId::Regular, BODY_SIZE);
        let grand = TextStyle::new(FontId::Bold, GRAND_TOTAL_SIZE);
        let label_x = columns[2].anchor();
        let value_x = columns[3].anchor();
        let rows = [
            ("Subtotal:", totals.subtotal, body),
            ("Tax:", totals.tax_total, body),
            ("Total:", totals.grand_total, grand),
        ];
        for (label, value, style) in rows {
            let baseline = canvas.frame().top_y() - Pt::from_i32(ROW_BASELINE);
            canvas.draw_text_right(label, label_x, baseline, style)?;
            canvas.draw_text_right(&self.formatter.currency(value), value_x, baseline, style)?;
            canvas.frame_mut().advance(Pt::from_i32(ROW_HEIGHT));
        }
        Ok(())
    }
}

fn start_page(
    assembler: &mut DocumentAssembler,
    report: &mut LayoutReport,
    reason: BreakReason,
    row: Option<usize>,
) -> Result<(), InvoiceError> {
    if assembler.current()?.frame().is_empty() {
        return Err(InvoiceError::Unplaceable(format!(
            "{} on page {}",
            reason.as_str(),
            assembler.page_count()
        )));
    }
    assembler.new_page()?;
    let page = assembler.page_count();
    log::debug!("page break ({}) -> page {page}", reason.as_str());
    report.breaks.push(PageBreak { reason, page, row });
    Ok(())
}

fn ensure_fits(
    assembler: &mut DocumentAssembler,
    height: Pt,
    what: &str,
) -> Result<(), InvoiceError> {
    let frame = assembler.current()?.frame();
    if frame.fits(height) {
        return Ok(());
    }
    Err(InvoiceError::Unplaceable(format!(
        "{what} needs {}pt but an empty page offers {}pt",
        height.to_f32(),
        frame.remaining_height().to_f32()
    )))
}

/// Shaded caption band at the top of the table. Returns the column geometry
/// for the rows beneath it.
fn draw_table_header(canvas: &mut Canvas, page: usize) -> Result<[Column; 4], InvoiceError> {
    let content = canvas.frame().rect();
    let columns = table_columns(content);
    let top = canvas.frame().top_y();
    let band = Pt::from_i32(BAND_HEIGHT);
    canvas.meta(META_TABLE_HEADER, page.to_string());
    canvas.fill_rect(content.x, top - band, content.width, band, band_color());
    let style = TextStyle::new(FontId::Bold, BODY_SIZE);
    let baseline = top - Pt::from_i32(ROW_BASELINE);
    for column in &columns {
        match column.align {
            Align::Left => canvas.draw_text(column.caption, column.anchor(), baseline, style)?,
            Align::Right => {
                canvas.draw_text_right(column.caption, column.anchor(), baseline, style)?;
            }
        }
    }
    canvas.frame_mut().advance(band);
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Command, Document};
    use crate::font::FontSet;
    use crate::format::LocaleFormatter;
    use crate::model::Client;
    use crate::page_template::PageTemplate;
    use crate::totals::compute_totals;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn invoice(items: Vec<LineItem>) -> InvoiceData {
        InvoiceData {
            invoice_number: "INV-42".to_string(),
            issue_date: NaiveDate::from_ymd_opt(2024, 1, 15).expect("date"),
            due_date: NaiveDate::from_ymd_opt(2024, 1, 30).expect("date"),
            client: Some(Client {
                name: "Acme Traders".to_string(),
                email: Some("billing@acme.test".to_string()),
                address: None,
            }),
            items,
            precomputed_total: None,
            status: None,
        }
    }

    fn items(count: usize) -> Vec<LineItem> {
        (0..count)
            .map(|i| {
                LineItem::new(
                    format!("Item {i}"),
                    Decimal::ONE,
                    Decimal::from(10),
                    Decimal::ZERO,
                )
            })
            .collect()
    }

    fn render(data: &InvoiceData) -> Result<(Document, LayoutReport), InvoiceError> {
        let issuer = Issuer::default();
        let formatter = LocaleFormatter::usd();
        let layout = InvoiceLayout::new(&issuer, &formatter);
        let totals = compute_totals(&data.items, data.precomputed_total)?;
        let mut assembler = DocumentAssembler::new(PageTemplate::default(), FontSet::standard());
        let report = layout.lay_out(data, &totals, &mut assembler)?;
        Ok((assembler.finish("Invoice".to_string(), None), report))
    }

    fn texts(doc: &Document) -> Vec<String> {
        doc.pages()
            .iter()
            .flat_map(|p| p.text_runs().map(|(_, _, t)| t.to_string()))
            .collect()
    }

    #[test]
    fn columns_split_the_content_width() {
        let content = PageTemplate::default().content_rect();
        let columns = table_columns(content);
        assert_eq!(columns[0].left, content.x);
        assert_eq!(columns[0].right.to_milli(), 50_000 + 247_640);
        assert_eq!(columns[3].right, content.right());
        assert_eq!(columns[3].anchor(), content.right() - Pt::from_i32(5));
        for pair in columns.windows(2) {
            assert_eq!(pair[0].right, pair[1].left);
        }
    }

    #[test]
    fn two_items_fit_on_one_page_with_totals() {
        let data = invoice(vec![
            LineItem::new("A", Decimal::from(2), Decimal::from(100), Decimal::from(10)),
            LineItem::new("B", Decimal::ONE, Decimal::from(50), Decimal::ZERO),
        ]);
        let (doc, report) = render(&data).expect("layout");
        assert_eq!(doc.page_count(), 1);
        assert!(report.breaks.is_empty());
        let texts = texts(&doc);
        for expected in [
            "INVOICE",
            "Invoice #: INV-42",
            "Date: 15 Jan 2024",
            "Due Date: 30 Jan 2024",
            "Bill To:",
            "Acme Traders",
            "$250.00",
            "$20.00",
            "$270.00",
        ] {
            assert!(texts.iter().any(|t| t == expected), "missing {expected}");
        }
    }

    #[test]
    fn amounts_end_at_the_amount_column_edge() {
        let data = invoice(vec![LineItem::new(
            "Bolts",
            Decimal::from(3),
            Decimal::from(7),
            Decimal::ZERO,
        )]);
        let (doc, _) = render(&data).expect("layout");
        let fonts = FontSet::standard();
        let edge = PageTemplate::default().content_rect().right() - Pt::from_i32(CELL_PADDING);
        // The row is drawn before the subtotal, so the first match is the row amount.
        let (x, _, text) = doc.pages()[0]
            .text_runs()
            .find(|(_, _, t)| *t == "$21.00")
            .expect("amount drawn");
        let width = fonts
            .measure_text_width(text, FontId::Regular, Pt::from_f32(BODY_SIZE))
            .expect("measure");
        assert_eq!(x + width, edge);
    }

    #[test]
    fn zero_items_draw_band_and_zero_totals() {
        let (doc, report) = render(&invoice(Vec::new())).expect("layout");
        assert_eq!(doc.page_count(), 1);
        assert_eq!(report.rows, 0);
        let page = &doc.pages()[0];
        assert_eq!(page.meta_count(META_TABLE_HEADER), 1);
        assert_eq!(page.meta_count(META_TOTALS), 1);
        let zeros = page.text_runs().filter(|(_, _, t)| *t == "$0.00").count();
        assert_eq!(zeros, 3);
    }

    #[test]
    fn many_items_paginate_without_losing_rows() {
        let data = invoice(items(100));
        let (doc, report) = render(&data).expect("layout");
        assert_eq!(report.rows, 100);
        assert!(doc.page_count() >= 3);
        let mut seen: Vec<usize> = Vec::new();
        for page in doc.pages() {
            let rows: Vec<usize> = page
                .meta_values(META_ROW)
                .map(|v| v.parse().expect("row index"))
                .collect();
            if !rows.is_empty() {
                assert_eq!(page.meta_count(META_TABLE_HEADER), 1);
            }
            seen.extend(rows);
        }
        assert_eq!(seen, (0..100).collect::<Vec<_>>());
        assert!(
            report
                .breaks
                .iter()
                .all(|b| b.reason == BreakReason::RowOverflow || b.reason == BreakReason::TotalsOverflow)
        );
        assert_eq!(doc.pages().last().map(|p| p.meta_count(META_TOTALS)), Some(1));
    }

    #[test]
    fn band_is_never_orphaned_at_the_bottom() {
        for count in [30, 31, 32, 33, 34, 35, 36] {
            let (doc, _) = render(&invoice(items(count))).expect("layout");
            for page in doc.pages() {
                if page.meta_count(META_TABLE_HEADER) > 0 {
                    assert!(page.meta_count(META_ROW) > 0 || count == 0);
                }
            }
        }
    }

    #[test]
    fn totals_move_whole_to_the_next_page() {
        // Find an item count whose rows fill page one exactly up to the totals.
        let mut moved = false;
        for count in 25..40 {
            let (doc, report) = render(&invoice(items(count))).expect("layout");
            if report
                .breaks
                .iter()
                .any(|b| b.reason == BreakReason::TotalsOverflow)
            {
                let last = doc.pages().last().expect("page");
                assert_eq!(last.meta_count(META_ROW), 0);
                assert_eq!(last.meta_count(META_TABLE_HEADER), 0);
                assert_eq!(last.meta_count(META_TOTALS), 1);
                moved = true;
            }
        }
        assert!(moved, "some item count should push totals to a new page");
    }

    #[test]
    fn tall_client_block_pushes_the_table_to_page_two() {
        let mut data = invoice(items(1));
        // Leaves less than a band plus one row below the client block.
        let address: Vec<String> = (0..36).map(|i| format!("Line {i}")).collect();
        if let Some(client) = data.client.as_mut() {
            client.address = Some(address.join("\n"));
        }
        let (doc, report) = render(&data).expect("layout");
        assert_eq!(doc.page_count(), 2);
        assert_eq!(report.breaks[0].reason, BreakReason::TableStart);
        assert_eq!(doc.pages()[0].meta_count(META_TABLE_HEADER), 0);
        assert_eq!(doc.pages()[1].meta_count(META_ROW), 1);
    }

    #[test]
    fn client_block_taller_than_a_page_is_unplaceable() {
        let mut data = invoice(items(1));
        let address: Vec<String> = (0..60).map(|i| format!("Line {i}")).collect();
        if let Some(client) = data.client.as_mut() {
            client.address = Some(address.join("\n"));
        }
        assert!(matches!(render(&data), Err(InvoiceError::Unplaceable(_))));
    }

    #[test]
    fn awkward_descriptions_stay_one_run() {
        let data = invoice(vec![LineItem::new(
            "Widgets, large\n\"premium\" grade",
            Decimal::ONE,
            Decimal::ONE,
            Decimal::ZERO,
        )]);
        let (doc, _) = render(&data).expect("layout");
        let page = &doc.pages()[0];
        let description_x = PageTemplate::default().content_rect().x + Pt::from_i32(CELL_PADDING);
        let runs: Vec<_> = page
            .text_runs()
            .filter(|(_, _, t)| t.contains("Widgets"))
            .collect();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].0, description_x);
        assert_eq!(runs[0].2, "Widgets, large \"premium\" grade");
    }

    #[test]
    fn long_descriptions_are_truncated_to_the_column() {
        let long = "Extended maintenance contract ".repeat(10);
        let data = invoice(vec![LineItem::new(
            long.clone(),
            Decimal::ONE,
            Decimal::ONE,
            Decimal::ZERO,
        )]);
        let (doc, _) = render(&data).expect("layout");
        let column = table_columns(PageTemplate::default().content_rect())[0];
        let fonts = FontSet::standard();
        let (_, _, text) = doc.pages()[0]
            .text_runs()
            .find(|(_, _, t)| t.starts_with("Extended"))
            .expect("description drawn");
        assert!(text.ends_with(ELLIPSIS));
        assert!(text.len() < long.len());
        let width = fonts
            .measure_text_width(text, FontId::Regular, Pt::from_f32(BODY_SIZE))
            .expect("measure");
        assert!(width <= column.text_width());
    }

    #[test]
    fn columns_narrower_than_the_ellipsis_get_nothing() {
        let canvas = Canvas::new(&PageTemplate::default(), FontSet::standard()).expect("canvas");
        let style = TextStyle::new(FontId::Regular, BODY_SIZE);
        // "..." is 8.34pt wide at 10pt.
        let text = fit_text(&canvas, "Consulting", style, Pt::from_i32(5)).expect("fit");
        assert_eq!(text, "");
        let text = fit_text(&canvas, "Consulting", style, Pt::ZERO).expect("fit");
        assert_eq!(text, "");
        let text = fit_text(&canvas, "Consulting", style, Pt::from_i32(9)).expect("fit");
        assert_eq!(text, ELLIPSIS);
    }

    #[test]
    fn long_invoice_numbers_stay_in_the_right_half() {
        let mut data = invoice(items(1));
        data.invoice_number = "INV-".to_string() + &"9".repeat(120);
        let (doc, _) = render(&data).expect("layout");
        let content = PageTemplate::default().content_rect();
        let half = content.width.mul_ratio(1, 2);
        let fonts = FontSet::standard();
        let (x, _, text) = doc.pages()[0]
            .text_runs()
            .find(|(_, _, t)| t.starts_with("Invoice #:"))
            .expect("number drawn");
        assert!(text.ends_with(ELLIPSIS));
        assert!(x >= content.right() - half);
        let width = fonts
            .measure_text_width(text, FontId::Bold, Pt::from_f32(BODY_SIZE))
            .expect("measure");
        assert!(width <= half);
    }

    #[test]
    fn status_is_printed_when_present() {
        let mut data = invoice(items(1));
        data.status = Some(crate::model::InvoiceStatus::Overdue);
        let (doc, _) = render(&data).expect("layout");
        assert!(texts(&doc).iter().any(|t| t == "Status: OVERDUE"));
    }

    #[test]
    fn band_is_filled_gray_behind_captions() {
        let (doc, _) = render(&invoice(items(1))).expect("layout");
        let page = &doc.pages()[0];
        let position = page
            .commands
            .iter()
            .position(|c| matches!(c, Command::FillRect { .. }))
            .expect("band");
        assert_eq!(page.commands[position - 1], Command::SetFillColor(band_color()));
    }
}
