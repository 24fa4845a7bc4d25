//! Prompt text sent to the oracle and interpretation of the quick-check answer.
//!
//! Two deployment variants exist: a generic one that looks for text in any
//! language and a Devanagari one that only cares about Hindi script. Both use
//! the same answer tokens, so the orchestrator does not branch on the variant.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Quick-check token meaning readable text is present
pub const TEXT_FOUND: &str = "TEXT_FOUND";

/// Quick-check token meaning no readable text is present
pub const NO_TEXT: &str = "NO_TEXT";

/// Script family a deployment is looking for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetScript {
    /// Text in any language or script
    #[default]
    Any,
    /// Hindi text written in Devanagari
    Devanagari,
}

impl TargetScript {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Devanagari => "devanagari",
        }
    }

    /// Prompt for the cheap existence check
    pub fn quick_check_prompt(&self) -> &'static str {
        match self {
            Self::Any => QUICK_CHECK_ANY,
            Self::Devanagari => QUICK_CHECK_DEVANAGARI,
        }
    }

    /// Prompt for the full structured extraction
    pub fn extraction_prompt(&self) -> String {
        let (intro, language_hint, romanization_hint, example) = match self {
            Self::Any => (
                "You are an expert multilingual OCR and translation specialist.",
                "Full name of the detected language (e.g., \"Hindi\", \"Spanish\", \"Arabic\", \"Chinese\", \"English\", etc.)",
                "If the detected language uses a non-Latin script, provide romanized transliteration using standard romanization. If already in Latin script, write \"N/A - Already in Latin script\"",
                GENERIC_EXAMPLE,
            ),
            Self::Devanagari => (
                "You are an expert in Hindi and the Devanagari script, skilled in OCR, transliteration and translation.",
                "Full name of the detected language (usually \"Hindi\"; name the language if it is another Devanagari language such as \"Marathi\" or \"Sanskrit\")",
                "Romanized transliteration of the Devanagari text using IAST-style diacritics",
                DEVANAGARI_EXAMPLE,
            ),
        };

        format!(
            "{intro} Please analyze this image and provide a structured response.

Since text has been detected, provide your response in this EXACT format:

EXTRACTED_TEXT:
[Write the complete text exactly as it appears in the image, preserving all formatting and line breaks]

DETECTED_LANGUAGE:
[{language_hint}]

LANGUAGE_CODE:
[ISO language code (e.g., \"hi\" for Hindi, \"es\" for Spanish, \"ar\" for Arabic, \"zh\" for Chinese, \"en\" for English, etc.)]

ROMANIZED_TRANSLITERATION:
[{romanization_hint}]

ENGLISH_TRANSLATION:
[Provide a complete English translation of the text. If the text is already in English, write \"N/A - Original text is in English\"]

CONTENT_TYPE:
[Specify what type of content this is: poem, story, article, sign, book page, handwritten note, etc.]

DETAILED_ANALYSIS:
For each stanza/paragraph/section, follow this EXACT format with proper grouping:

Section 1:
● [Original text line], ([Transliteration/romanization if applicable])
○ Meaning: [English meaning of this line]
● [Next original text line], ([Transliteration/romanization if applicable])
○ Meaning: [English meaning of this line]

Section 2:
● [Original text line], ([Transliteration/romanization if applicable])
○ Meaning: [English meaning of this line]

[Continue this pattern for all sections]

Example format:
{example}

CRITICAL FORMATTING RULES:
- Use exactly ● (bullet) for original text lines with transliteration/romanization in parentheses (if applicable)
- Use exactly ○ (circle) for meanings that start with \"Meaning:\"
- Group lines by section with clear \"Section X:\" headers
- Analyze every single line of each section
- If it's poetry, use \"Stanza\" instead of \"Section\"
- If it's prose, treat each paragraph as a section
- Maintain consistent spacing and formatting throughout
- Do not use any other bullet or numbering styles
- For languages already in Latin script, you may omit transliteration in parentheses

Be accurate and thorough in your analysis. Make sure to format everything clearly under the specified sections."
        )
    }
}

impl std::fmt::Display for TargetScript {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const QUICK_CHECK_ANY: &str = "Look at this image and determine if there is any readable text present in any language.

Respond with ONLY:
- \"TEXT_FOUND\" if you see any readable text in any language
- \"NO_TEXT\" if there's no readable text or the image is not clear enough

Be quick and decisive - just look for any text characters, letters, or script symbols.";

const QUICK_CHECK_DEVANAGARI: &str = "Look at this image and determine if there is any readable Hindi text written in the Devanagari script.

Respond with ONLY:
- \"TEXT_FOUND\" if you see readable Devanagari text
- \"NO_TEXT\" if there's no Devanagari text, the text is in another script, or the image is not clear enough

Be quick and decisive - just look for Devanagari letters such as क, ख, ग, म or the horizontal headline (shirorekha) joining them.";

const GENERIC_EXAMPLE: &str = "Stanza 1:
● मैं तुम-सबकी ओर निहार रहा हूँ, (Main tum-sabakī ora nihāra rahā hūṅ,)
○ Meaning: I am gazing towards all of you,
● स्थान मुझे भी दो तुम अपने बीच; (Sthāna mujhe bhī dō tum apanē bīch;)
○ Meaning: Give me a place too, amongst yourselves;

Stanza 2:
● कुछ तो कहो कि मैं यहाँ हूँ! (Kuch to kaho ki main yahāṅ hūṅ!)
○ Meaning: Say something, for I am here!";

const DEVANAGARI_EXAMPLE: &str = "Section 1:
● यहाँ धूम्रपान करना मना है। (Yahāṅ dhūmrapān karnā manā hai.)
○ Meaning: Smoking is prohibited here.
● आदेश से, नगर निगम (Ādeś se, nagar nigam)
○ Meaning: By order, Municipal Corporation";

/// Interpretation of the quick-check answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickCheckVerdict {
    TextFound,
    NoText,
}

impl QuickCheckVerdict {
    /// Only an explicit `NO_TEXT` stops the request; anything else proceeds.
    pub fn from_answer(answer: &str) -> Self {
        if answer.contains(NO_TEXT) {
            Self::NoText
        } else {
            if !answer.contains(TEXT_FOUND) {
                tracing::warn!(
                    "Quick check answer contained neither token, continuing: {:?}",
                    answer.trim()
                );
            }
            Self::TextFound
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_tokens() {
        assert_eq!(QuickCheckVerdict::from_answer("NO_TEXT"), QuickCheckVerdict::NoText);
        assert_eq!(
            QuickCheckVerdict::from_answer("  \"NO_TEXT\"\n"),
            QuickCheckVerdict::NoText
        );
        assert_eq!(
            QuickCheckVerdict::from_answer("TEXT_FOUND"),
            QuickCheckVerdict::TextFound
        );
    }

    #[test]
    fn test_unexpected_answer_proceeds() {
        assert_eq!(
            QuickCheckVerdict::from_answer("I think there is some writing"),
            QuickCheckVerdict::TextFound
        );
        // token matching is case-sensitive
        assert_eq!(
            QuickCheckVerdict::from_answer("no_text"),
            QuickCheckVerdict::TextFound
        );
    }

    #[test]
    fn test_prompts_name_every_section_label() {
        for script in [TargetScript::Any, TargetScript::Devanagari] {
            let prompt = script.extraction_prompt();
            for label in crate::parser::Section::ALL {
                assert!(
                    prompt.contains(&format!("{}:", label.label())),
                    "{} prompt is missing {}",
                    script,
                    label.label()
                );
            }
            assert!(script.quick_check_prompt().contains(TEXT_FOUND));
            assert!(script.quick_check_prompt().contains(NO_TEXT));
        }
    }

    #[test]
    fn test_devanagari_prompt_is_script_specific() {
        assert!(TargetScript::Devanagari
            .quick_check_prompt()
            .contains("Devanagari"));
        assert!(!TargetScript::Any.quick_check_prompt().contains("Devanagari"));
    }
}
