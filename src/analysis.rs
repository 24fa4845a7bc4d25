//! Two-phase analysis: a cheap existence check, then the structured extraction.

use crate::oracle::{InlineImage, Oracle, OracleError, OracleQuery, QueryKind};
use crate::parser::{self, ParsedResult};
use crate::prompts::{QuickCheckVerdict, TargetScript};
use crate::upload::UploadedImage;
use std::sync::Arc;
use std::time::Instant;

/// Result of a successful analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    /// The quick check found no readable text; no extraction call was made
    NoText,
    /// Both calls ran and the extraction answer was parsed
    Complete(ParsedResult),
}

/// Runs the quick-check / extraction sequence against an oracle
pub struct Analyzer {
    oracle: Arc<dyn Oracle>,
    script: TargetScript,
}

impl Analyzer {
    pub fn new(oracle: Arc<dyn Oracle>, script: TargetScript) -> Self {
        Self { oracle, script }
    }

    pub fn oracle_name(&self) -> &str {
        self.oracle.name()
    }

    pub fn script(&self) -> TargetScript {
        self.script
    }

    /// Ask whether the image holds text and, if so, extract and parse it.
    ///
    /// The calls are strictly sequential and the extraction is only issued when
    /// the quick check did not answer `NO_TEXT`.
    pub async fn analyze(&self, image: &UploadedImage) -> Result<AnalysisOutcome, OracleError> {
        let inline = InlineImage::encode(image);

        let quick_check = OracleQuery::new(
            QueryKind::QuickCheck,
            self.script.quick_check_prompt(),
            inline.clone(),
        );
        let start = Instant::now();
        let answer = self.oracle.evaluate(&quick_check).await?;
        let verdict = QuickCheckVerdict::from_answer(&answer);

        tracing::info!(
            "Quick check ({}) answered {:?} in {}ms",
            self.script,
            answer.trim(),
            start.elapsed().as_millis()
        );

        if verdict == QuickCheckVerdict::NoText {
            return Ok(AnalysisOutcome::NoText);
        }

        let extraction = OracleQuery::new(
            QueryKind::Extraction,
            self.script.extraction_prompt(),
            inline,
        );
        let start = Instant::now();
        let raw = self.oracle.evaluate(&extraction).await?;

        let (result, report) = parser::parse_response(&raw);
        if !report.is_clean() {
            tracing::warn!(
                "Extraction answer incomplete: missing {:?}, out of order {:?}, duplicated {:?}",
                report.missing,
                report.out_of_order,
                report.duplicated
            );
        }

        tracing::info!(
            "Extraction completed in {}ms: language {:?}, {} chars of text",
            start.elapsed().as_millis(),
            result.detected_language,
            result.original_text.chars().count()
        );

        Ok(AnalysisOutcome::Complete(result))
    }
}
