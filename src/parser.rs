//! Section-labelled answer parser.
//!
//! The extraction prompt asks the model for seven blocks, each introduced by a
//! label line such as `DETECTED_LANGUAGE:`. Parsing walks the recognised label
//! lines in document order. Each block runs to the next recognised label, so a
//! missing label leaves its field empty without swallowing a neighbour. The
//! walk also tracks the label expected next, which is how missing, duplicated
//! and out-of-order labels end up in the [`ParseReport`]. Shortfalls are never
//! errors.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Top-level blocks of the extraction answer, in the order they are requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Section {
    ExtractedText,
    DetectedLanguage,
    LanguageCode,
    RomanizedTransliteration,
    EnglishTranslation,
    ContentType,
    DetailedAnalysis,
}

impl Section {
    pub const ALL: [Section; 7] = [
        Section::ExtractedText,
        Section::DetectedLanguage,
        Section::LanguageCode,
        Section::RomanizedTransliteration,
        Section::EnglishTranslation,
        Section::ContentType,
        Section::DetailedAnalysis,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Section::ExtractedText => "EXTRACTED_TEXT",
            Section::DetectedLanguage => "DETECTED_LANGUAGE",
            Section::LanguageCode => "LANGUAGE_CODE",
            Section::RomanizedTransliteration => "ROMANIZED_TRANSLITERATION",
            Section::EnglishTranslation => "ENGLISH_TRANSLATION",
            Section::ContentType => "CONTENT_TYPE",
            Section::DetailedAnalysis => "DETAILED_ANALYSIS",
        }
    }

    /// Label expected after this one; `None` for the final block.
    pub fn next(&self) -> Option<Section> {
        Section::ALL.get(self.index() + 1).copied()
    }

    /// The final block swallows everything after it, labels included.
    pub fn is_terminal(&self) -> bool {
        self.next().is_none()
    }

    fn index(&self) -> usize {
        *self as usize
    }

    fn from_label(label: &str) -> Option<Section> {
        Section::ALL
            .into_iter()
            .find(|section| section.label().eq_ignore_ascii_case(label))
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A label at the start of a line, optionally wrapped in markdown emphasis or
/// heading markers (`**LANGUAGE_CODE:**`, `## CONTENT_TYPE:`).
static LABEL_LINE: Lazy<Regex> = Lazy::new(|| {
    let labels = Section::ALL.map(|s| s.label()).join("|");
    Regex::new(&format!(r"(?mi)^[ \t#*]*({labels})[ \t*]*:\**"))
        .expect("section label pattern is valid")
});

/// Fields extracted from one extraction answer. Absent blocks are empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParsedResult {
    pub original_text: String,
    pub detected_language: String,
    pub language_code: String,
    pub romanized_text: String,
    pub english_translation: String,
    pub content_type: String,
    pub detailed_analysis: String,
    /// Verbatim model answer, kept for debugging and fallback display
    pub full_response: String,
}

impl ParsedResult {
    pub fn field(&self, section: Section) -> &str {
        match section {
            Section::ExtractedText => &self.original_text,
            Section::DetectedLanguage => &self.detected_language,
            Section::LanguageCode => &self.language_code,
            Section::RomanizedTransliteration => &self.romanized_text,
            Section::EnglishTranslation => &self.english_translation,
            Section::ContentType => &self.content_type,
            Section::DetailedAnalysis => &self.detailed_analysis,
        }
    }

    fn field_mut(&mut self, section: Section) -> &mut String {
        match section {
            Section::ExtractedText => &mut self.original_text,
            Section::DetectedLanguage => &mut self.detected_language,
            Section::LanguageCode => &mut self.language_code,
            Section::RomanizedTransliteration => &mut self.romanized_text,
            Section::EnglishTranslation => &mut self.english_translation,
            Section::ContentType => &mut self.content_type,
            Section::DetailedAnalysis => &mut self.detailed_analysis,
        }
    }

    /// Render the fields in the labelled format the extraction prompt asks for.
    pub fn to_labeled_text(&self) -> String {
        Section::ALL
            .iter()
            .map(|section| format!("{}:\n{}", section.label(), self.field(*section)))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Structured view of the detailed analysis block
    pub fn analysis_sections(&self) -> Vec<AnalysisSection> {
        parse_analysis_sections(&self.detailed_analysis)
    }
}

/// Label bookkeeping gathered while parsing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    /// Labels never seen
    pub missing: Vec<Section>,
    /// Labels seen after a label that should follow them
    pub out_of_order: Vec<Section>,
    /// Labels seen more than once; only the first occurrence is used
    pub duplicated: Vec<Section>,
}

impl ParseReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.out_of_order.is_empty() && self.duplicated.is_empty()
    }
}

/// Where the label walk stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    /// Waiting for this label next
    Expecting(Section),
    /// The terminal label was seen; the rest of the text is its body
    Finished,
}

impl Cursor {
    fn after(section: Section) -> Self {
        match section.next() {
            Some(next) => Cursor::Expecting(next),
            None => Cursor::Finished,
        }
    }
}

struct LabelHit {
    section: Section,
    label_start: usize,
    body_start: usize,
}

/// Split a raw extraction answer into its fields.
pub fn parse_response(raw: &str) -> (ParsedResult, ParseReport) {
    let mut hits: Vec<LabelHit> = Vec::new();
    for caps in LABEL_LINE.captures_iter(raw) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let Some(section) = Section::from_label(name.as_str()) else {
            continue;
        };
        hits.push(LabelHit {
            section,
            label_start: whole.start(),
            body_start: whole.end(),
        });
        if section.is_terminal() {
            break;
        }
    }

    let mut result = ParsedResult {
        full_response: raw.to_string(),
        ..Default::default()
    };
    let mut report = ParseReport::default();
    let mut seen = [false; Section::ALL.len()];
    let mut cursor = Cursor::Expecting(Section::ExtractedText);

    for (i, hit) in hits.iter().enumerate() {
        let body_end = hits
            .get(i + 1)
            .map(|next| next.label_start)
            .unwrap_or(raw.len());
        let body = raw[hit.body_start..body_end].trim();

        if seen[hit.section.index()] {
            report.duplicated.push(hit.section);
            continue;
        }
        seen[hit.section.index()] = true;

        cursor = match cursor {
            Cursor::Expecting(expected) if hit.section >= expected => Cursor::after(hit.section),
            Cursor::Expecting(_) | Cursor::Finished => {
                report.out_of_order.push(hit.section);
                cursor
            }
        };

        *result.field_mut(hit.section) = body.to_string();
    }

    report.missing = Section::ALL
        .into_iter()
        .filter(|section| !seen[section.index()])
        .collect();

    (result, report)
}

/// One line of the detailed analysis block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisLineKind<'a> {
    /// `Section 1:` / `Stanza 2:` / `Paragraph 3:`
    Heading(&'a str),
    /// `● original line (transliteration)`
    Source(&'a str),
    /// `○ Meaning: ...`, with the marker and prefix removed
    Meaning(&'a str),
    Blank,
    Other(&'a str),
}

const SOURCE_MARKER: char = '●';
const MEANING_MARKER: char = '○';
const HEADING_PREFIXES: [&str; 4] = ["section ", "stanza ", "paragraph ", "verse "];

pub fn classify_analysis_line(line: &str) -> AnalysisLineKind<'_> {
    let line = line.trim();
    if line.is_empty() {
        return AnalysisLineKind::Blank;
    }
    if let Some(rest) = line.strip_prefix(SOURCE_MARKER) {
        return AnalysisLineKind::Source(rest.trim());
    }
    if let Some(rest) = line.strip_prefix(MEANING_MARKER) {
        let rest = rest.trim();
        let rest = strip_prefix_ignore_case(rest, "meaning:").unwrap_or(rest);
        return AnalysisLineKind::Meaning(rest.trim());
    }
    let is_heading = line.contains(':')
        && HEADING_PREFIXES
            .iter()
            .any(|prefix| strip_prefix_ignore_case(line, prefix).is_some());
    if is_heading {
        return AnalysisLineKind::Heading(line);
    }
    AnalysisLineKind::Other(line)
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}

/// A grouped section of the detailed analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisSection {
    pub heading: Option<String>,
    pub lines: Vec<AnalysisLine>,
}

/// A source line with its optional romanization and meaning
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisLine {
    pub source: String,
    pub transliteration: Option<String>,
    pub meaning: Option<String>,
}

/// Group the detailed analysis into sections of source/meaning pairs.
///
/// Lines that are neither headings, bullets nor meanings are skipped here; the
/// raw block is still available for verbatim display.
pub fn parse_analysis_sections(text: &str) -> Vec<AnalysisSection> {
    let mut sections: Vec<AnalysisSection> = Vec::new();

    for line in text.lines() {
        match classify_analysis_line(line) {
            AnalysisLineKind::Heading(heading) => sections.push(AnalysisSection {
                heading: Some(heading.trim_end_matches(':').trim().to_string()),
                lines: Vec::new(),
            }),
            AnalysisLineKind::Source(source) => {
                let (source, transliteration) = split_transliteration(source);
                current_section(&mut sections).lines.push(AnalysisLine {
                    source: source.to_string(),
                    transliteration: transliteration.map(str::to_string),
                    meaning: None,
                });
            }
            AnalysisLineKind::Meaning(meaning) => {
                let section = current_section(&mut sections);
                match section.lines.last_mut() {
                    Some(last) if last.meaning.is_none() => {
                        last.meaning = Some(meaning.to_string());
                    }
                    _ => section.lines.push(AnalysisLine {
                        meaning: Some(meaning.to_string()),
                        ..Default::default()
                    }),
                }
            }
            AnalysisLineKind::Blank | AnalysisLineKind::Other(_) => {}
        }
    }

    sections.retain(|s| s.heading.is_some() || !s.lines.is_empty());
    sections
}

fn current_section(sections: &mut Vec<AnalysisSection>) -> &mut AnalysisSection {
    if sections.is_empty() {
        sections.push(AnalysisSection::default());
    }
    let last = sections.len() - 1;
    &mut sections[last]
}

/// `"नमस्ते, (Namaste,)"` -> `("नमस्ते,", Some("Namaste,"))`
fn split_transliteration(source: &str) -> (&str, Option<&str>) {
    let Some(inner) = source.strip_suffix(')') else {
        return (source, None);
    };
    match inner.rfind('(') {
        Some(open) if open > 0 => {
            let original = inner[..open].trim_end();
            let romanized = inner[open + 1..].trim();
            if original.is_empty() || romanized.is_empty() {
                (source, None)
            } else {
                (original, Some(romanized))
            }
        }
        _ => (source, None),
    }
}
