//! PDF rendering: result table pages followed by a summary page

use crate::error::{Error, Result};
use crate::results::{SearchResult, Sentiment};
use chrono::Utc;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

/// A4 in points
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: f32 = 40.0;
const ROW_HEIGHT: f32 = 14.0;
const ROWS_PER_PAGE: usize = 48;
const TITLE_CHARS: usize = 50;

/// x offsets of the table columns
const COLUMNS: [(&str, f32); 6] = [
    ("#", 0.0),
    ("Title", 22.0),
    ("Source", 290.0),
    ("Date", 380.0),
    ("Sentiment", 440.0),
    ("Relevance", 500.0),
];

pub(super) fn render(results: &[SearchResult], title: &str) -> Result<Vec<u8>> {
    build(results, title).map_err(Error::Internal)
}

fn build(results: &[SearchResult], title: &str) -> anyhow::Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
            "F2" => bold_id,
        },
    });

    let mut page_ids = Vec::new();
    let chunks: Vec<&[SearchResult]> = if results.is_empty() {
        vec![results]
    } else {
        results.chunks(ROWS_PER_PAGE).collect()
    };

    for (page, chunk) in chunks.iter().enumerate() {
        let offset = page * ROWS_PER_PAGE;
        let ops = table_page(chunk, offset, (page == 0).then_some(title));
        page_ids.push(add_page(&mut doc, pages_id, ops)?);
    }
    if !results.is_empty() {
        page_ids.push(add_page(&mut doc, pages_id, summary_page(results))?);
    }

    let count = page_ids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => page_ids.into_iter().map(Object::from).collect::<Vec<_>>(),
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

fn add_page(doc: &mut Document, pages_id: ObjectId, operations: Vec<Operation>) -> anyhow::Result<ObjectId> {
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    }))
}

fn table_page(rows: &[SearchResult], offset: usize, heading: Option<&str>) -> Vec<Operation> {
    let mut ops = Vec::new();
    let mut y = PAGE_HEIGHT as f32 - MARGIN - 10.0;

    if let Some(heading) = heading {
        text(&mut ops, "F2", 18.0, MARGIN, y, heading);
        y -= 18.0;
        let generated = format!("Generated: {}", Utc::now().format("%Y-%m-%d"));
        text(&mut ops, "F1", 10.0, MARGIN, y, &generated);
        y -= 24.0;
    }

    for (label, x) in COLUMNS {
        text(&mut ops, "F2", 9.0, MARGIN + x, y, label);
    }
    y -= ROW_HEIGHT;

    for (i, result) in rows.iter().enumerate() {
        let analysis = result.analysis.as_ref();
        let cells = [
            (offset + i + 1).to_string(),
            truncate(&result.title, TITLE_CHARS),
            truncate(&result.source, 16),
            result.publish_date.format("%Y-%m-%d").to_string(),
            analysis.map_or("N/A".to_string(), |a| a.sentiment.to_string()),
            analysis.map_or("N/A".to_string(), |a| format!("{}%", a.relevance_score)),
        ];
        for ((_, x), cell) in COLUMNS.iter().zip(cells.iter()) {
            text(&mut ops, "F1", 8.0, MARGIN + x, y, cell);
        }
        y -= ROW_HEIGHT;
    }

    ops
}

fn summary_page(results: &[SearchResult]) -> Vec<Operation> {
    let count = |s: Sentiment| {
        results
            .iter()
            .filter(|r| r.analysis.as_ref().map(|a| a.sentiment) == Some(s))
            .count()
    };

    let mut ops = Vec::new();
    let mut y = PAGE_HEIGHT as f32 - MARGIN - 10.0;
    text(&mut ops, "F2", 16.0, MARGIN, y, "Summary");
    y -= 30.0;

    let lines = [
        format!("Total Results: {}", results.len()),
        format!("Positive: {}", count(Sentiment::Positive)),
        format!("Negative: {}", count(Sentiment::Negative)),
        format!("Neutral: {}", count(Sentiment::Neutral)),
        format!("Mixed: {}", count(Sentiment::Mixed)),
    ];
    for line in &lines {
        text(&mut ops, "F1", 12.0, MARGIN, y, line);
        y -= 20.0;
    }
    ops
}

fn text(ops: &mut Vec<Operation>, font: &str, size: f32, x: f32, y: f32, value: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font.into(), size.into()]));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    ops.push(Operation::new(
        "Tj",
        vec![Object::string_literal(win_ansi(value))],
    ));
    ops.push(Operation::new("ET", vec![]));
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() > max {
        let head: String = value.chars().take(max - 3).collect();
        format!("{}...", head)
    } else {
        value.to_string()
    }
}

/// Latin-1 bytes for the standard fonts; anything else becomes '?'
fn win_ansi(value: &str) -> Vec<u8> {
    value
        .chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}
