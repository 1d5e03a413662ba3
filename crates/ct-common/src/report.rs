use std::fs;
use std::io;
use std::path::PathBuf;

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, StringFormat, dictionary};
use tracing::{info, instrument};

use crate::scoring::ScoredCandidate;

pub const DEFAULT_REPORT_FILENAME: &str = "report.pdf";
pub const REPORT_TITLE: &str = "Preselected Candidates Report";

const MM: f32 = 72.0 / 25.4;
const A4_WIDTH: f32 = 595.0;
const A4_HEIGHT: f32 = 842.0;
// Rough Helvetica advance width as a fraction of the font size.
const AVG_GLYPH_WIDTH: f32 = 0.5;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("report generation failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("report generation failed for {}: {source}", .path.display())]
    Pdf {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },
}

/// Font sizes in points, heights and margins in millimetres.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportStyle {
    pub title_size: f32,
    pub header_size: f32,
    pub body_size: f32,
    pub title_height: f32,
    pub header_height: f32,
    pub body_height: f32,
    pub line_spacing: f32,
    pub page_margin: f32,
}

impl Default for ReportStyle {
    fn default() -> Self {
        Self {
            title_size: 12.0,
            header_size: 11.0,
            body_size: 10.0,
            title_height: 10.0,
            header_height: 8.0,
            body_height: 6.0,
            line_spacing: 6.0,
            page_margin: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontKind {
    Regular,
    Bold,
}

impl FontKind {
    fn resource_name(self) -> &'static str {
        match self {
            FontKind::Regular => "F1",
            FontKind::Bold => "F2",
        }
    }
}

/// One placed line of the report before page assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportLine {
    Text {
        text: String,
        font: FontKind,
        size: f32,
        height: f32,
        centered: bool,
    },
    Gap(f32),
}

impl ReportLine {
    fn height(&self) -> f32 {
        match self {
            ReportLine::Text { height, .. } => *height,
            ReportLine::Gap(height) => *height,
        }
    }
}

pub fn format_skills(skills: &[String]) -> String {
    skills.join(", ")
}

/// Builds the fixed sequence of lines: a title, then one section per candidate.
pub fn layout_lines(candidates: &[ScoredCandidate], style: &ReportStyle) -> Vec<ReportLine> {
    let mut lines = vec![
        ReportLine::Text {
            text: REPORT_TITLE.to_string(),
            font: FontKind::Bold,
            size: style.title_size,
            height: style.title_height,
            centered: true,
        },
        ReportLine::Gap(style.line_spacing),
    ];

    for scored in candidates {
        let candidate = &scored.candidate;
        lines.push(ReportLine::Text {
            text: format!("{} - {} student", candidate.full_name, candidate.degree),
            font: FontKind::Bold,
            size: style.header_size,
            height: style.header_height,
            centered: false,
        });

        let details = [
            format!(
                "{} - Academic average: ({:.2})",
                candidate.college, candidate.academic_average
            ),
            format!("Skills: {}", format_skills(&candidate.skills)),
            format!("Preselection score: {:.1}", scored.score),
            format!("Email: {}", candidate.email),
        ];
        for text in details {
            lines.push(ReportLine::Text {
                text,
                font: FontKind::Regular,
                size: style.body_size,
                height: style.body_height,
                centered: false,
            });
        }

        lines.push(ReportLine::Gap(style.line_spacing));
    }

    lines
}

/// Code points WinAnsi places in 0x80..=0x9F, where Latin-1 has C1 controls.
const WIN_ANSI_EXTRAS: [(char, u8); 27] = [
    ('\u{20AC}', 0x80),
    ('\u{201A}', 0x82),
    ('\u{0192}', 0x83),
    ('\u{201E}', 0x84),
    ('\u{2026}', 0x85),
    ('\u{2020}', 0x86),
    ('\u{2021}', 0x87),
    ('\u{02C6}', 0x88),
    ('\u{2030}', 0x89),
    ('\u{0160}', 0x8A),
    ('\u{2039}', 0x8B),
    ('\u{0152}', 0x8C),
    ('\u{017D}', 0x8E),
    ('\u{2018}', 0x91),
    ('\u{2019}', 0x92),
    ('\u{201C}', 0x93),
    ('\u{201D}', 0x94),
    ('\u{2022}', 0x95),
    ('\u{2013}', 0x96),
    ('\u{2014}', 0x97),
    ('\u{02DC}', 0x98),
    ('\u{2122}', 0x99),
    ('\u{0161}', 0x9A),
    ('\u{203A}', 0x9B),
    ('\u{0153}', 0x9C),
    ('\u{017E}', 0x9E),
    ('\u{0178}', 0x9F),
];

fn win_ansi_byte(c: char) -> Option<u8> {
    match u32::from(c) {
        code @ (0x20..=0x7E | 0xA0..=0xFF) => u8::try_from(code).ok(),
        _ => WIN_ANSI_EXTRAS
            .iter()
            .find(|(extra, _)| *extra == c)
            .map(|(_, byte)| *byte),
    }
}

/// Encodes text for a WinAnsi Type1 font; unmapped characters become '?'.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| win_ansi_byte(c).unwrap_or(b'?'))
        .collect()
}

/// Renders preselected candidates into a fixed-layout A4 PDF.
#[derive(Debug, Clone)]
pub struct PdfReportGenerator {
    output_dir: PathBuf,
    style: ReportStyle,
}

impl PdfReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            style: ReportStyle::default(),
        }
    }

    /// Writes `<output_dir>/<filename>` and returns its absolute path.
    #[instrument(skip(self, candidates), fields(count = candidates.len()))]
    pub fn generate(
        &self,
        candidates: &[ScoredCandidate],
        filename: &str,
    ) -> Result<PathBuf, ReportError> {
        let path = self.output_dir.join(filename);
        let io_err = |source: io::Error| ReportError::Io {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.output_dir).map_err(io_err)?;

        let mut doc = self.build_document(candidates).map_err(|source| ReportError::Pdf {
            path: path.clone(),
            source,
        })?;
        doc.compress();
        doc.save(&path).map_err(io_err)?;

        let absolute = fs::canonicalize(&path).map_err(io_err)?;
        info!(path = %absolute.display(), "report written");
        Ok(absolute)
    }

    fn build_document(&self, candidates: &[ScoredCandidate]) -> Result<Document, lopdf::Error> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(dictionary! {
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
                FontKind::Regular.resource_name() => regular_id,
                FontKind::Bold.resource_name() => bold_id,
            },
        });

        let lines = layout_lines(candidates, &self.style);
        let mut kids: Vec<Object> = Vec::new();
        for page in self.split_pages(&lines) {
            let content = Content {
                operations: self.page_operations(page),
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let page_count = kids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), A4_WIDTH.into(), A4_HEIGHT.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id: ObjectId = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        Ok(doc)
    }

    /// Greedy page breaking; a gap never starts a new page on its own.
    fn split_pages<'a>(&self, lines: &'a [ReportLine]) -> Vec<Vec<&'a ReportLine>> {
        let usable = (A4_HEIGHT / MM) - 2.0 * self.style.page_margin;
        let mut pages: Vec<Vec<&ReportLine>> = vec![Vec::new()];
        let mut used = 0.0;

        for line in lines {
            if used + line.height() > usable && used > 0.0 {
                if matches!(line, ReportLine::Gap(_)) {
                    continue;
                }
                pages.push(Vec::new());
                used = 0.0;
            }
            used += line.height();
            if let Some(current) = pages.last_mut() {
                current.push(line);
            }
        }

        pages
    }

    fn page_operations(&self, lines: Vec<&ReportLine>) -> Vec<Operation> {
        let margin = self.style.page_margin * MM;
        let mut cursor = margin;
        let mut operations = Vec::new();

        for line in lines {
            if let ReportLine::Text {
                text,
                font,
                size,
                height,
                centered,
            } = line
            {
                let cell = height * MM;
                let baseline = cursor + cell / 2.0 + size * 0.3;
                let x = if *centered {
                    let width = text.chars().count() as f32 * size * AVG_GLYPH_WIDTH;
                    ((A4_WIDTH - width) / 2.0).max(margin)
                } else {
                    margin
                };

                operations.extend([
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec![font.resource_name().into(), (*size).into()]),
                    Operation::new("Td", vec![x.into(), (A4_HEIGHT - baseline).into()]),
                    Operation::new(
                        "Tj",
                        vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
                    ),
                    Operation::new("ET", vec![]),
                ]);
            }
            cursor += line.height() * MM;
        }

        operations
    }
}
