// Generated renderer source

use serde::{Deserialize, Serialize};
use std::fmt;

/// Import line every generated program starts with
pub const RENDERER_IMPORT: &str = "from manim import *";

/// Renderer source text produced by code generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceText(String);

impl SourceText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// True when the program imports the renderer and declares the entry-point
    /// scene class `class <scene_name>(`.
    pub fn declares_scene(&self, scene_name: &str) -> bool {
        let class_decl = format!("class {}(", scene_name);
        self.0.contains(RENDERER_IMPORT) && self.0.lines().any(|l| l.starts_with(&class_decl))
    }
}

impl fmt::Display for SourceText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
