//! Grain content, one variant per grain type.
//!
//! Content is checked in two modes that live side by side so they cannot drift:
//! - [`GrainContent::is_well_formed`] is the strict save-time check;
//! - [`GrainContent::has_any_content`] is the partial-content heuristic used
//!   by completion (any authored field counts).

use super::GrainType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker a `textToComplete` phrase must contain where the answer goes.
pub const BLANK_MARKER: &str = "___";
pub const PHRASE_MIN_CHARS: usize = 5;
pub const PHRASE_MAX_CHARS: usize = 200;
pub const QUESTION_MAX_CHARS: usize = 300;
/// Number of wrong options offered next to the correct one.
pub const FALSE_OPTIONS: usize = 3;
pub const MIN_PAIRS: usize = 4;
pub const MAX_PAIRS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum GrainContent {
    TextToComplete(TextToComplete),
    TestQuestion(TestQuestion),
    ImagesToGuess(ImagesToGuess),
    TextToGuess(TextToGuess),
    AudioToGuess(AudioToGuess),
    PairsOfText(PairsOfText),
    PairsOfImage(PairsOfImage),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextToComplete {
    pub phrase: String,
    pub correct_answer: String,
    pub false_alternatives: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TestQuestion {
    pub question: String,
    pub correct_answer: String,
    pub false_alternatives: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImagesToGuess {
    pub correct_image_url: String,
    pub false_image_urls: Vec<String>,
    pub correct_word: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextToGuess {
    pub image_url: String,
    pub correct_answer: String,
    pub false_alternatives: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AudioToGuess {
    pub correct_word: String,
    pub correct_audio_url: String,
    pub false_audio_urls: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextPair {
    pub left: String,
    pub right: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairsOfText {
    pub pairs: Vec<TextPair>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImagePair {
    pub image_url: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairsOfImage {
    pub pairs: Vec<ImagePair>,
}

/// A single reason content was refused at save time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentViolation {
    pub field: String,
    pub problem: String,
}

impl fmt::Display for ContentViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.problem)
    }
}

fn filled(s: &str) -> bool {
    !s.trim().is_empty()
}

fn blanks(n: usize) -> Vec<String> {
    vec![String::new(); n]
}

impl GrainContent {
    pub fn grain_type(&self) -> GrainType {
        match self {
            GrainContent::TextToComplete(_) => GrainType::TextToComplete,
            GrainContent::TestQuestion(_) => GrainType::TestQuestion,
            GrainContent::ImagesToGuess(_) => GrainType::ImagesToGuess,
            GrainContent::TextToGuess(_) => GrainType::TextToGuess,
            GrainContent::AudioToGuess(_) => GrainType::AudioToGuess,
            GrainContent::PairsOfText(_) => GrainType::PairsOfText,
            GrainContent::PairsOfImage(_) => GrainType::PairsOfImage,
        }
    }

    /// Zero-value content used when the structure builder creates a grain.
    pub fn default_for(grain_type: GrainType) -> Self {
        match grain_type {
            GrainType::TextToComplete => GrainContent::TextToComplete(TextToComplete {
                false_alternatives: blanks(FALSE_OPTIONS),
                ..Default::default()
            }),
            GrainType::TestQuestion => GrainContent::TestQuestion(TestQuestion {
                false_alternatives: blanks(FALSE_OPTIONS),
                ..Default::default()
            }),
            GrainType::ImagesToGuess => GrainContent::ImagesToGuess(ImagesToGuess {
                false_image_urls: blanks(FALSE_OPTIONS),
                ..Default::default()
            }),
            GrainType::TextToGuess => GrainContent::TextToGuess(TextToGuess {
                false_alternatives: blanks(FALSE_OPTIONS),
                ..Default::default()
            }),
            GrainType::AudioToGuess => GrainContent::AudioToGuess(AudioToGuess {
                false_audio_urls: blanks(FALSE_OPTIONS),
                ..Default::default()
            }),
            GrainType::PairsOfText => GrainContent::PairsOfText(PairsOfText {
                pairs: vec![TextPair::default(); MIN_PAIRS],
            }),
            GrainType::PairsOfImage => GrainContent::PairsOfImage(PairsOfImage {
                pairs: vec![ImagePair::default(); MIN_PAIRS],
            }),
        }
    }

    /// True when any authored field carries text.
    ///
    /// Stricter than a plain non-empty check on purpose: a field holding only
    /// whitespace counts as empty, so a grain of blanks never reads as started.
    pub fn has_any_content(&self) -> bool {
        match self {
            GrainContent::TextToComplete(c) => {
                filled(&c.phrase) || filled(&c.correct_answer) || any_filled(&c.false_alternatives)
            }
            GrainContent::TestQuestion(c) => {
                filled(&c.question) || filled(&c.correct_answer) || any_filled(&c.false_alternatives)
            }
            GrainContent::ImagesToGuess(c) => {
                filled(&c.correct_image_url) || filled(&c.correct_word) || any_filled(&c.false_image_urls)
            }
            GrainContent::TextToGuess(c) => {
                filled(&c.image_url) || filled(&c.correct_answer) || any_filled(&c.false_alternatives)
            }
            GrainContent::AudioToGuess(c) => {
                filled(&c.correct_word) || filled(&c.correct_audio_url) || any_filled(&c.false_audio_urls)
            }
            GrainContent::PairsOfText(c) => c.pairs.iter().any(|p| filled(&p.left) || filled(&p.right)),
            GrainContent::PairsOfImage(c) => c.pairs.iter().any(|p| filled(&p.image_url) || filled(&p.text)),
        }
    }

    /// Strict save-time validation. Collects every violation instead of
    /// stopping at the first one.
    pub fn is_well_formed(&self) -> Result<(), Vec<ContentViolation>> {
        let mut check = Checker::default();
        match self {
            GrainContent::TextToComplete(c) => {
                let len = c.phrase.trim().chars().count();
                if !(PHRASE_MIN_CHARS..=PHRASE_MAX_CHARS).contains(&len) {
                    check.fail(
                        "phrase",
                        format!(
                            "must be between {} and {} characters (got {})",
                            PHRASE_MIN_CHARS, PHRASE_MAX_CHARS, len
                        ),
                    );
                } else if !c.phrase.contains(BLANK_MARKER) {
                    check.fail("phrase", format!("must contain the blank marker '{}'", BLANK_MARKER));
                }
                check.required("correctAnswer", &c.correct_answer);
                check.options("falseAlternatives", &c.false_alternatives);
            }
            GrainContent::TestQuestion(c) => {
                check.required("question", &c.question);
                if c.question.trim().chars().count() > QUESTION_MAX_CHARS {
                    check.fail("question", format!("must be at most {} characters", QUESTION_MAX_CHARS));
                }
                check.required("correctAnswer", &c.correct_answer);
                check.options("falseAlternatives", &c.false_alternatives);
            }
            GrainContent::ImagesToGuess(c) => {
                check.required("correctImageUrl", &c.correct_image_url);
                check.options("falseImageUrls", &c.false_image_urls);
                check.required("correctWord", &c.correct_word);
            }
            GrainContent::TextToGuess(c) => {
                check.required("imageUrl", &c.image_url);
                check.required("correctAnswer", &c.correct_answer);
                check.options("falseAlternatives", &c.false_alternatives);
            }
            GrainContent::AudioToGuess(c) => {
                check.required("correctWord", &c.correct_word);
                check.required("correctAudioUrl", &c.correct_audio_url);
                check.options("falseAudioUrls", &c.false_audio_urls);
            }
            GrainContent::PairsOfText(c) => {
                check.pair_count(c.pairs.len());
                for (i, pair) in c.pairs.iter().enumerate() {
                    check.required(&format!("pairs[{}].left", i), &pair.left);
                    check.required(&format!("pairs[{}].right", i), &pair.right);
                }
            }
            GrainContent::PairsOfImage(c) => {
                check.pair_count(c.pairs.len());
                for (i, pair) in c.pairs.iter().enumerate() {
                    check.required(&format!("pairs[{}].imageUrl", i), &pair.image_url);
                    check.required(&format!("pairs[{}].text", i), &pair.text);
                }
            }
        }
        check.finish()
    }
}

fn any_filled(values: &[String]) -> bool {
    values.iter().any(|v| filled(v))
}

#[derive(Default)]
struct Checker {
    violations: Vec<ContentViolation>,
}

impl Checker {
    fn fail(&mut self, field: &str, problem: impl Into<String>) {
        self.violations.push(ContentViolation {
            field: field.to_string(),
            problem: problem.into(),
        });
    }

    fn required(&mut self, field: &str, value: &str) {
        if !filled(value) {
            self.fail(field, "must not be empty");
        }
    }

    fn options(&mut self, field: &str, values: &[String]) {
        if values.len() != FALSE_OPTIONS {
            self.fail(
                field,
                format!("must have exactly {} entries (got {})", FALSE_OPTIONS, values.len()),
            );
            return;
        }
        for (i, v) in values.iter().enumerate() {
            self.required(&format!("{}[{}]", field, i), v);
        }
    }

    fn pair_count(&mut self, n: usize) {
        if !(MIN_PAIRS..=MAX_PAIRS).contains(&n) {
            self.fail(
                "pairs",
                format!("must have between {} and {} pairs (got {})", MIN_PAIRS, MAX_PAIRS, n),
            );
        }
    }

    fn finish(self) -> Result<(), Vec<ContentViolation>> {
        if self.violations.is_empty() {
            Ok(())
        } else {
            Err(self.violations)
        }
    }
}
