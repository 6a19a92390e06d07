// Rule-based fallback generator
//
// Keyword matching against a fixed vocabulary. Total: every description
// yields a well-formed program.

use crate::domain::layout::DEFAULT_SCENE_NAME;
use crate::domain::source::RENDERER_IMPORT;
use crate::domain::{Description, JobId, SourceText};
use crate::port::{CodeGenerationProvider, GenerationError};
use async_trait::async_trait;
use regex_lite::Regex;
use std::fmt::Write as _;
use std::sync::OnceLock;

/// Literal used by the text block when the description quotes nothing
pub const DEFAULT_TEXT_LITERAL: &str = "Hello, Manim!";

const BODY_INDENT: &str = "        ";

const FADE_WORDS: [&str; 4] = ["fade", "fades", "fading", "faded"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Circle,
    Square,
    Triangle,
}

impl Shape {
    fn var(self) -> &'static str {
        match self {
            Shape::Circle => "circle",
            Shape::Square => "square",
            Shape::Triangle => "triangle",
        }
    }

    fn constructor(self) -> &'static str {
        match self {
            Shape::Circle => "Circle(color=BLUE)",
            Shape::Square => "Square(color=RED)",
            Shape::Triangle => "Triangle(color=GREEN)",
        }
    }

    fn declare(self) -> String {
        format!("{} = {}", self.var(), self.constructor())
    }
}

/// One recognized animation primitive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SceneBlock {
    Create(Shape),
    WriteText(String),
    Transform { from: Shape, to: Shape },
    Rotate(Shape),
    FadeIn(Shape),
    FadeOut(Shape),
    /// Nothing matched: show the description itself
    EchoDescription(String),
}

impl SceneBlock {
    fn lines(&self) -> Vec<String> {
        match self {
            SceneBlock::Create(shape) => vec![
                format!("# Create a {}", shape.var()),
                shape.declare(),
                format!("self.play(Create({}))", shape.var()),
                "self.wait(1)".to_string(),
            ],
            SceneBlock::WriteText(text) => vec![
                format!("# Add text: {}", comment_safe(text)),
                format!("text = Text({}, color=YELLOW)", string_literal(text)),
                "self.play(Write(text))".to_string(),
                "self.wait(1)".to_string(),
            ],
            SceneBlock::Transform { from, to } => vec![
                format!("# Transform {} to {}", from.var(), to.var()),
                from.declare(),
                to.declare(),
                format!("self.play(Create({}))", from.var()),
                "self.wait(1)".to_string(),
                format!("self.play(Transform({}, {}))", from.var(), to.var()),
                "self.wait(1)".to_string(),
            ],
            SceneBlock::Rotate(shape) => vec![
                format!("# Rotate a {}", shape.var()),
                shape.declare(),
                format!("self.play(Create({}))", shape.var()),
                format!("self.play(Rotate({}, angle=PI), run_time=2)", shape.var()),
                "self.wait(1)".to_string(),
            ],
            SceneBlock::FadeIn(shape) => vec![
                format!("# Fade in a {}", shape.var()),
                shape.declare(),
                format!("self.play(FadeIn({}))", shape.var()),
                "self.wait(1)".to_string(),
            ],
            SceneBlock::FadeOut(shape) => vec![
                format!("# Fade out a {}", shape.var()),
                shape.declare(),
                format!("self.play(Create({}))", shape.var()),
                "self.wait(1)".to_string(),
                format!("self.play(FadeOut({}))", shape.var()),
                "self.wait(1)".to_string(),
            ],
            SceneBlock::EchoDescription(description) => vec![
                "# Default animation".to_string(),
                format!(
                    "text = Text({}, font_size=24)",
                    string_literal(&format!("Animation based on: {}", description))
                ),
                "self.play(Write(text))".to_string(),
                "self.wait(2)".to_string(),
            ],
        }
    }
}

/// Deterministic, side-effect free fallback generator
#[derive(Debug, Clone)]
pub struct RuleBasedGenerator {
    scene_name: String,
}

impl Default for RuleBasedGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_SCENE_NAME)
    }
}

impl RuleBasedGenerator {
    pub fn new(scene_name: impl Into<String>) -> Self {
        Self {
            scene_name: scene_name.into(),
        }
    }

    /// Blocks for a description, in canonical order (never description order)
    pub fn plan(&self, description: &str) -> Vec<SceneBlock> {
        let lower = description.to_lowercase();
        let has = |word: &str| lower.contains(word);
        let mut blocks = Vec::new();

        if has("circle") {
            blocks.push(SceneBlock::Create(Shape::Circle));
        }
        if has("square") {
            blocks.push(SceneBlock::Create(Shape::Square));
        }
        if has("triangle") {
            blocks.push(SceneBlock::Create(Shape::Triangle));
        }

        if has("text") || has("write") {
            let literal = first_quoted(description).unwrap_or(DEFAULT_TEXT_LITERAL);
            blocks.push(SceneBlock::WriteText(literal.to_string()));
        }

        if has("transform") {
            if has("circle") && has("square") {
                blocks.push(SceneBlock::Transform {
                    from: Shape::Circle,
                    to: Shape::Square,
                });
            } else if has("square") && has("triangle") {
                blocks.push(SceneBlock::Transform {
                    from: Shape::Square,
                    to: Shape::Triangle,
                });
            }
        }

        let circle_or_square = if has("circle") {
            Some(Shape::Circle)
        } else if has("square") {
            Some(Shape::Square)
        } else {
            None
        };

        if has("rotate") {
            if let Some(shape) = circle_or_square {
                blocks.push(SceneBlock::Rotate(shape));
            }
        }

        // Whole words, so "fade it out" counts and "fade into" does not
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let has_word = |word: &str| words.iter().any(|w| *w == word);
        if let Some(shape) = circle_or_square {
            if FADE_WORDS.iter().any(|w| has_word(w)) {
                if has_word("in") {
                    blocks.push(SceneBlock::FadeIn(shape));
                } else if has_word("out") {
                    blocks.push(SceneBlock::FadeOut(shape));
                }
            }
        }

        if blocks.is_empty() {
            blocks.push(SceneBlock::EchoDescription(description.to_string()));
        }
        blocks
    }

    /// Render a full program for `description`. Never fails.
    pub fn render(&self, description: &str) -> SourceText {
        let mut out = String::new();
        let _ = writeln!(out, "{}", RENDERER_IMPORT);
        let _ = writeln!(out);
        let _ = writeln!(out, "class {}(Scene):", self.scene_name);
        let _ = writeln!(out, "    def construct(self):");
        let _ = writeln!(
            out,
            "{}# Generated from description: {}",
            BODY_INDENT,
            comment_safe(description)
        );
        let _ = writeln!(out);
        for block in self.plan(description) {
            for line in block.lines() {
                let _ = writeln!(out, "{}{}", BODY_INDENT, line);
            }
        }
        SourceText::new(out)
    }
}

#[async_trait]
impl CodeGenerationProvider for RuleBasedGenerator {
    fn name(&self) -> &'static str {
        "rule_based"
    }

    async fn generate(
        &self,
        description: &Description,
        _job_id: &JobId,
    ) -> Result<SourceText, GenerationError> {
        Ok(self.render(description.as_str()))
    }
}

fn quoted_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r#""([^"]*)""#).unwrap_or_else(|e| panic!("{e}")))
}

/// First `"..."` segment of the description
fn first_quoted(description: &str) -> Option<&str> {
    quoted_pattern()
        .captures(description)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Double-quoted literal with every special character escaped
fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Text safe to place after `#`: one line, control characters blanked,
/// whitespace runs collapsed
fn comment_safe(text: &str) -> String {
    let blanked: String = text
        .chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect();
    blanked.split_whitespace().collect::<Vec<_>>().join(" ")
}
