//! Resume PDF rendering.
//!
//! Two passes: `layout_resume` turns the content into styled lines (pure, no PDF
//! types), `paginate` assigns them to A4 pages, and `render_resume_pdf` draws
//! them with printpdf's built-in Helvetica faces. Rendering is CPU-bound; async
//! callers go through `render_resume_pdf_blocking`.

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference};
use thiserror::Error;
use tracing::debug;

use crate::errors::AppError;
use crate::models::resume::{EducationItem, ExperienceItem, ResumeContent};
use crate::resume::metrics::{pdf_safe, wrap, Face};

const PAGE_WIDTH_PT: f32 = 595.28;
const PAGE_HEIGHT_PT: f32 = 841.89;
const MARGIN_PT: f32 = 50.0;
const CONTENT_WIDTH_PT: f32 = PAGE_WIDTH_PT - 2.0 * MARGIN_PT;
const LEADING: f32 = 1.35;

const NAME_SIZE: f32 = 20.0;
const HEADING_SIZE: f32 = 12.0;
const ENTRY_TITLE_SIZE: f32 = 11.0;
const BODY_SIZE: f32 = 10.0;
const META_SIZE: f32 = 9.0;
const BULLET_INDENT_PT: f32 = 12.0;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF rendering failed: {0}")]
    Render(String),
}

impl From<PdfError> for AppError {
    fn from(e: PdfError) -> Self {
        AppError::Pdf(e.to_string())
    }
}

/// One line of laid-out text.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledLine {
    pub text: String,
    pub face: Face,
    pub size_pt: f32,
    pub indent_pt: f32,
    /// Extra vertical space above the line, dropped at the top of a page.
    pub space_before_pt: f32,
}

impl StyledLine {
    fn height(&self) -> f32 {
        self.size_pt * LEADING
    }
}

/// A line positioned on a page; `baseline_pt` is measured from the bottom edge.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub line: StyledLine,
    pub x_pt: f32,
    pub baseline_pt: f32,
}

struct LineBuilder {
    lines: Vec<StyledLine>,
    pending_space: f32,
}

impl LineBuilder {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            pending_space: 0.0,
        }
    }

    fn space(&mut self, pt: f32) {
        self.pending_space += pt;
    }

    fn paragraph(&mut self, text: &str, face: Face, size_pt: f32, indent_pt: f32) {
        let text = pdf_safe(text);
        for wrapped in wrap(&text, face, size_pt, CONTENT_WIDTH_PT - indent_pt) {
            self.lines.push(StyledLine {
                text: wrapped,
                face,
                size_pt,
                indent_pt,
                space_before_pt: std::mem::take(&mut self.pending_space),
            });
        }
    }

    /// Multi-line descriptions: each source line is its own paragraph, and lines
    /// that start with a bullet marker are indented.
    fn description(&mut self, text: &str) {
        for raw in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match strip_bullet(raw) {
                Some(rest) => self.paragraph(&format!("- {rest}"), Face::Regular, BODY_SIZE, BULLET_INDENT_PT),
                None => self.paragraph(raw, Face::Regular, BODY_SIZE, 0.0),
            }
        }
    }

    fn heading(&mut self, title: &str) {
        self.space(14.0);
        self.paragraph(title, Face::Bold, HEADING_SIZE, 0.0);
        self.space(2.0);
    }
}

fn strip_bullet(line: &str) -> Option<&str> {
    ['-', '*', '\u{2022}']
        .iter()
        .find_map(|marker| line.strip_prefix(*marker))
        .map(str::trim_start)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn date_range(start: &Option<String>, end: &Option<String>, current: bool) -> Option<String> {
    let end = if current {
        Some("Present")
    } else {
        non_blank(end)
    };
    match (non_blank(start), end) {
        (Some(s), Some(e)) => Some(format!("{s} - {e}")),
        (Some(s), None) => Some(s.to_string()),
        (None, Some(e)) => Some(e.to_string()),
        (None, None) => None,
    }
}

fn experience_entry(builder: &mut LineBuilder, item: &ExperienceItem) {
    let title = match (item.title.trim(), item.company.trim()) {
        ("", "") => return,
        (title, "") => title.to_string(),
        ("", company) => company.to_string(),
        (title, company) => format!("{title} - {company}"),
    };
    builder.space(6.0);
    builder.paragraph(&title, Face::Bold, ENTRY_TITLE_SIZE, 0.0);

    let meta: Vec<String> = [
        date_range(&item.start_date, &item.end_date, item.current),
        non_blank(&item.location).map(str::to_string),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !meta.is_empty() {
        builder.paragraph(&meta.join(" | "), Face::Regular, META_SIZE, 0.0);
    }
    if let Some(description) = non_blank(&item.description) {
        builder.description(description);
    }
}

fn education_entry(builder: &mut LineBuilder, item: &EducationItem) {
    let degree = match (non_blank(&item.degree), non_blank(&item.field)) {
        (Some(d), Some(f)) => Some(format!("{d} in {f}")),
        (Some(d), None) => Some(d.to_string()),
        (None, Some(f)) => Some(f.to_string()),
        (None, None) => None,
    };
    let institution = item.institution.trim();
    let title = match (degree, institution) {
        (None, "") => return,
        (Some(d), "") => d,
        (None, i) => i.to_string(),
        (Some(d), i) => format!("{d} - {i}"),
    };
    builder.space(6.0);
    builder.paragraph(&title, Face::Bold, ENTRY_TITLE_SIZE, 0.0);
    if let Some(dates) = date_range(&item.start_date, &item.end_date, false) {
        builder.paragraph(&dates, Face::Regular, META_SIZE, 0.0);
    }
    if let Some(description) = non_blank(&item.description) {
        builder.description(description);
    }
}

/// Lays the resume out as a flat list of styled lines. Empty sections are omitted.
pub fn layout_resume(content: &ResumeContent) -> Vec<StyledLine> {
    let mut builder = LineBuilder::new();

    let name = content.full_name.trim();
    builder.paragraph(
        if name.is_empty() { "Resume" } else { name },
        Face::Bold,
        NAME_SIZE,
        0.0,
    );

    let contact: Vec<&str> = [&content.email, &content.phone, &content.location]
        .into_iter()
        .filter_map(non_blank)
        .collect();
    if !contact.is_empty() {
        builder.space(2.0);
        builder.paragraph(&contact.join(" | "), Face::Regular, BODY_SIZE, 0.0);
    }

    if let Some(summary) = non_blank(&content.summary) {
        builder.heading("Summary");
        builder.description(summary);
    }

    let skills: Vec<&str> = content
        .skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if !skills.is_empty() {
        builder.heading("Skills");
        builder.paragraph(&skills.join(", "), Face::Regular, BODY_SIZE, 0.0);
    }

    if !content.experience.is_empty() {
        builder.heading("Experience");
        for item in &content.experience {
            experience_entry(&mut builder, item);
        }
    }

    if !content.education.is_empty() {
        builder.heading("Education");
        for item in &content.education {
            education_entry(&mut builder, item);
        }
    }

    builder.lines
}

/// Assigns lines to pages top to bottom, breaking when the next line would cross
/// the bottom margin. Always returns at least one page.
pub fn paginate(lines: Vec<StyledLine>) -> Vec<Vec<PlacedLine>> {
    let mut pages: Vec<Vec<PlacedLine>> = vec![Vec::new()];
    let mut cursor = PAGE_HEIGHT_PT - MARGIN_PT;

    for line in lines {
        let on_fresh_page = pages.last().map_or(true, Vec::is_empty);
        let space = if on_fresh_page { 0.0 } else { line.space_before_pt };
        let mut baseline = cursor - space - line.height();

        if baseline < MARGIN_PT && !on_fresh_page {
            pages.push(Vec::new());
            cursor = PAGE_HEIGHT_PT - MARGIN_PT;
            baseline = cursor - line.height();
        }

        cursor = baseline;
        let x_pt = MARGIN_PT + line.indent_pt;
        if let Some(page) = pages.last_mut() {
            page.push(PlacedLine {
                line,
                x_pt,
                baseline_pt: baseline,
            });
        }
    }
    pages
}

fn mm(pt: f32) -> Mm {
    Mm(pt * 25.4 / 72.0)
}

fn add_font(doc: &PdfDocumentReference, font: BuiltinFont) -> Result<IndirectFontRef, PdfError> {
    doc.add_builtin_font(font)
        .map_err(|e| PdfError::Render(format!("font setup: {e:?}")))
}

/// Renders the resume to PDF bytes.
pub fn render_resume_pdf(content: &ResumeContent) -> Result<Vec<u8>, PdfError> {
    let pages = paginate(layout_resume(content));
    let title = pdf_safe(content.full_name.trim());
    let title = if title.is_empty() { "Resume".to_string() } else { format!("{title} - Resume") };

    let (doc, first_page, first_layer) = PdfDocument::new(
        title,
        mm(PAGE_WIDTH_PT),
        mm(PAGE_HEIGHT_PT),
        "Content",
    );
    let regular = add_font(&doc, BuiltinFont::Helvetica)?;
    let bold = add_font(&doc, BuiltinFont::HelveticaBold)?;

    for (index, page) in pages.iter().enumerate() {
        let (page_ref, layer_ref) = if index == 0 {
            (first_page, first_layer)
        } else {
            doc.add_page(mm(PAGE_WIDTH_PT), mm(PAGE_HEIGHT_PT), "Content")
        };
        let layer = doc.get_page(page_ref).get_layer(layer_ref);
        for placed in page {
            let font = match placed.line.face {
                Face::Regular => &regular,
                Face::Bold => &bold,
            };
            layer.use_text(
                placed.line.text.clone(),
                placed.line.size_pt,
                mm(placed.x_pt),
                mm(placed.baseline_pt),
                font,
            );
        }
    }

    let bytes = doc
        .save_to_bytes()
        .map_err(|e| PdfError::Render(format!("serialize: {e:?}")))?;
    debug!("Rendered resume PDF: {} pages, {} bytes", pages.len(), bytes.len());
    Ok(bytes)
}

/// Runs `render_resume_pdf` on the blocking pool.
pub async fn render_resume_pdf_blocking(content: ResumeContent) -> Result<Vec<u8>, AppError> {
    let bytes = tokio::task::spawn_blocking(move || render_resume_pdf(&content))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in PDF render: {e}")))??;
    Ok(bytes)
}
