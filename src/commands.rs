use crate::overlay::EasterEgg;
use anyhow::{Context, Result};
use regex::{Captures, Regex};

/// Builds the result for a regex match. Returning `None` declines the match
/// and resolution moves on to the next definition.
pub type PatternHandler = fn(&Captures<'_>) -> Option<CommandResult>;

/// A command matched by its exact (lowercased) text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandEntry {
    System(Vec<String>),
    Clear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultKind {
    Result,
    Ai,
    EasterEgg(EasterEgg),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandResult {
    pub kind: ResultKind,
    pub loading_text: String,
    pub response_lines: Vec<String>,
}

impl CommandResult {
    pub fn result(loading_text: &str, response_lines: Vec<String>) -> Self {
        Self {
            kind: ResultKind::Result,
            loading_text: loading_text.to_string(),
            response_lines,
        }
    }

    pub fn ai(loading_text: &str, response_lines: Vec<String>) -> Self {
        Self {
            kind: ResultKind::Ai,
            loading_text: loading_text.to_string(),
            response_lines,
        }
    }

    pub fn easter_egg(loading_text: &str, egg: EasterEgg) -> Self {
        Self {
            kind: ResultKind::EasterEgg(egg),
            loading_text: loading_text.to_string(),
            response_lines: Vec::new(),
        }
    }
}

pub struct PatternRule {
    pub name: &'static str,
    regex: Regex,
    handler: PatternHandler,
}

impl PatternRule {
    pub fn new(name: &'static str, pattern: &str, handler: PatternHandler) -> Result<Self> {
        let regex = Regex::new(pattern)
            .with_context(|| format!("pattern rule {name} has an invalid regex"))?;
        Ok(Self {
            name,
            regex,
            handler,
        })
    }

    fn apply(&self, text: &str) -> Option<CommandResult> {
        self.regex
            .captures(text)
            .and_then(|captures| (self.handler)(&captures))
    }
}

impl std::fmt::Debug for PatternRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternRule")
            .field("name", &self.name)
            .field("regex", &self.regex.as_str())
            .finish()
    }
}

#[derive(Debug)]
pub enum CommandDefinition {
    Static { key: String, entry: CommandEntry },
    Pattern(PatternRule),
}

/// How a submitted line was classified.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Clear,
    System(Vec<String>),
    Pattern { rule: &'static str, result: CommandResult },
    Unknown,
}

/// Ordered command definitions. Resolution walks the list top to bottom
/// and the first definition that matches wins.
#[derive(Debug, Default)]
pub struct CommandBook {
    definitions: Vec<CommandDefinition>,
}

impl CommandBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_static(mut self, key: &str, entry: CommandEntry) -> Self {
        self.definitions.push(CommandDefinition::Static {
            key: key.trim().to_lowercase(),
            entry,
        });
        self
    }

    pub fn with_pattern(mut self, rule: PatternRule) -> Self {
        self.definitions.push(CommandDefinition::Pattern(rule));
        self
    }

    pub fn static_keys(&self) -> Vec<&str> {
        self.definitions
            .iter()
            .filter_map(|definition| match definition {
                CommandDefinition::Static { key, .. } => Some(key.as_str()),
                CommandDefinition::Pattern(_) => None,
            })
            .collect()
    }

    /// Expects already trimmed text. Static keys compare against the
    /// lowercased text, patterns run against the text as typed.
    pub fn resolve(&self, text: &str) -> Resolution {
        let lowered = text.to_lowercase();
        for definition in &self.definitions {
            match definition {
                CommandDefinition::Static { key, entry } if *key == lowered => {
                    return match entry {
                        CommandEntry::Clear => Resolution::Clear,
                        CommandEntry::System(lines) => Resolution::System(lines.clone()),
                    };
                }
                CommandDefinition::Static { .. } => {}
                CommandDefinition::Pattern(rule) => {
                    if let Some(result) = rule.apply(text) {
                        return Resolution::Pattern {
                            rule: rule.name,
                            result,
                        };
                    }
                }
            }
        }
        Resolution::Unknown
    }
}
