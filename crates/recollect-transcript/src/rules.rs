//! Speaker-attribution rule table.
//!
//! A transcript line is classified by walking an ordered list of
//! `(name, matcher, role)` rules and taking the first that matches. When no
//! rule matches, the line stays with the currently active speaker. The table
//! is plain data: the default carries heuristics tuned against one real
//! conversation log, and an alternative table can be loaded from JSON.

use recollect_core::Role;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::TranscriptError;

/// Openers typical of the assistant's phrasing, in priority order.
static ASSISTANT_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^(That's|You're|I am|Thank you|My apologies)",
        r"^(The|This|Your|It's|What)",
        r"^(From my perspective|While I don't|If you)",
        r"^(Aletheia:|You are absolutely|That is a)",
        r"^(I have|I understand|I'm)",
        // Speaker name followed by a colon
        r"^\s*[A-Z][a-z]+:",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

const SHORT_LINE_MAX_CHARS: usize = 50;

/// What a rule sees of one non-blank line.
#[derive(Debug, Clone, Copy)]
pub struct LineContext<'a> {
    /// The line with any leading byte-order mark removed, whitespace intact.
    pub raw: &'a str,
    /// `raw` trimmed on both sides.
    pub trimmed: &'a str,
    /// 1-indexed position in the source, counting blank lines.
    pub line_number: usize,
    /// Role of the turn currently being buffered, if any.
    pub active: Option<Role>,
}

impl<'a> LineContext<'a> {
    pub fn new(line: &'a str, line_number: usize, active: Option<Role>) -> Self {
        let raw = line.trim_start_matches('\u{feff}');
        Self {
            raw,
            trimmed: raw.trim(),
            line_number,
            active,
        }
    }
}

/// A line predicate.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Trimmed line equals one of the values.
    Exact(Vec<String>),
    /// Trimmed line starts with one of the values.
    Prefix(Vec<String>),
    /// Raw line matches one of the patterns.
    Regex(Vec<Regex>),
    /// The active speaker is `after` and the raw line starts with a marker
    /// (an indent run or a bullet).
    Continuation { after: Role, markers: Vec<String> },
    /// Trimmed line is shorter than `max_chars` and looks like a question
    /// or a terse acknowledgment.
    ShortLine {
        max_chars: usize,
        contains: Vec<String>,
        ends_with: Vec<String>,
        starts_with: Vec<String>,
    },
    /// The first line of the transcript, or a line opening with a greeting.
    Opener {
        first_line: bool,
        prefixes: Vec<String>,
    },
}

impl Matcher {
    pub fn matches(&self, ctx: &LineContext<'_>) -> bool {
        match self {
            Matcher::Exact(values) => values.iter().any(|v| ctx.trimmed == v.as_str()),
            Matcher::Prefix(values) => values.iter().any(|v| ctx.trimmed.starts_with(v.as_str())),
            Matcher::Regex(patterns) => patterns.iter().any(|re| re.is_match(ctx.raw)),
            Matcher::Continuation { after, markers } => {
                ctx.active == Some(*after)
                    && markers.iter().any(|m| ctx.raw.starts_with(m.as_str()))
            }
            Matcher::ShortLine {
                max_chars,
                contains,
                ends_with,
                starts_with,
            } => {
                ctx.trimmed.chars().count() < *max_chars
                    && (contains.iter().any(|s| ctx.raw.contains(s.as_str()))
                        || ends_with.iter().any(|s| ctx.trimmed.ends_with(s.as_str()))
                        || starts_with.iter().any(|s| ctx.trimmed.starts_with(s.as_str())))
            }
            Matcher::Opener {
                first_line,
                prefixes,
            } => {
                (*first_line && ctx.line_number == 1)
                    || prefixes.iter().any(|p| ctx.trimmed.starts_with(p.as_str()))
            }
        }
    }
}

/// One entry of the rule table.
#[derive(Debug, Clone)]
pub struct Rule {
    pub name: String,
    pub matcher: Matcher,
    pub role: Role,
}

impl Rule {
    pub fn new(name: &str, matcher: Matcher, role: Role) -> Self {
        Self {
            name: name.to_string(),
            matcher,
            role,
        }
    }
}

/// Ordered rules plus the role assumed when nothing has been attributed yet.
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<Rule>,
    fallback: Role,
}

impl RuleTable {
    pub fn new(rules: Vec<Rule>, fallback: Role) -> Self {
        Self { rules, fallback }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn fallback(&self) -> Role {
        self.fallback
    }

    /// First rule matching `ctx`, if any.
    pub fn first_match(&self, ctx: &LineContext<'_>) -> Option<&Rule> {
        self.rules.iter().find(|r| r.matcher.matches(ctx))
    }

    /// Role for `ctx`: the first matching rule's role, else the active
    /// speaker, else the table fallback.
    pub fn classify(&self, ctx: &LineContext<'_>) -> Role {
        match self.first_match(ctx) {
            Some(rule) => rule.role,
            None => ctx.active.unwrap_or(self.fallback),
        }
    }

    /// Decode a rules document: `{ "fallback": "user", "rules": [...] }`.
    pub fn from_json(json: &str) -> Result<Self, TranscriptError> {
        let file: RulesFile =
            serde_json::from_str(json).map_err(|e| TranscriptError::InvalidRule {
                name: "<document>".to_string(),
                detail: e.to_string(),
            })?;
        let rules = file
            .rules
            .into_iter()
            .map(RuleSpec::compile)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(rules, file.fallback))
    }

    /// Load a rules document from disk.
    pub fn load(path: &Path) -> Result<Self, TranscriptError> {
        let content = std::fs::read_to_string(path).map_err(|e| TranscriptError::RulesFile {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        Self::from_json(&content)
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        let strings = |vals: &[&str]| vals.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let rules = vec![
            Rule::new(
                "system_filler",
                Matcher::Exact(strings(&["Google Search", "Same loop", "Same loop?"])),
                Role::System,
            ),
            Rule::new(
                "human_prompt",
                Matcher::Prefix(strings(&["More loop?", "Did you recieve my message?"])),
                Role::User,
            ),
            Rule::new(
                "assistant_phrasing",
                Matcher::Regex(ASSISTANT_PATTERNS.clone()),
                Role::Assistant,
            ),
            Rule::new(
                "assistant_continuation",
                Matcher::Continuation {
                    after: Role::Assistant,
                    markers: strings(&["   ", "*"]),
                },
                Role::Assistant,
            ),
            Rule::new(
                "short_human_line",
                Matcher::ShortLine {
                    max_chars: SHORT_LINE_MAX_CHARS,
                    contains: strings(&["?"]),
                    ends_with: strings(&["."]),
                    starts_with: strings(&["Hi", "No,"]),
                },
                Role::User,
            ),
            Rule::new(
                "opener",
                Matcher::Opener {
                    first_line: true,
                    prefixes: strings(&["Hi, how are you?"]),
                },
                Role::User,
            ),
        ];
        Self::new(rules, Role::User)
    }
}

// ── Rules file schema ──

/// On-disk rules document: `{ "fallback": "user", "rules": [...] }`.
#[derive(Debug, Deserialize)]
struct RulesFile {
    #[serde(default = "default_fallback")]
    fallback: Role,
    rules: Vec<RuleSpec>,
}

fn default_fallback() -> Role {
    Role::User
}

#[derive(Debug, Deserialize)]
struct RuleSpec {
    name: String,
    role: Role,
    #[serde(flatten)]
    matcher: MatcherSpec,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum MatcherSpec {
    Exact {
        values: Vec<String>,
    },
    Prefix {
        values: Vec<String>,
    },
    Regex {
        patterns: Vec<String>,
    },
    Continuation {
        after: Role,
        markers: Vec<String>,
    },
    ShortLine {
        max_chars: usize,
        #[serde(default)]
        contains: Vec<String>,
        #[serde(default)]
        ends_with: Vec<String>,
        #[serde(default)]
        starts_with: Vec<String>,
    },
    Opener {
        #[serde(default)]
        first_line: bool,
        #[serde(default)]
        prefixes: Vec<String>,
    },
}

impl RuleSpec {
    fn compile(self) -> Result<Rule, TranscriptError> {
        let matcher = match self.matcher {
            MatcherSpec::Exact { values } => Matcher::Exact(values),
            MatcherSpec::Prefix { values } => Matcher::Prefix(values),
            MatcherSpec::Regex { patterns } => {
                let compiled = patterns
                    .iter()
                    .map(|p| Regex::new(p))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| TranscriptError::InvalidRule {
                        name: self.name.clone(),
                        detail: e.to_string(),
                    })?;
                Matcher::Regex(compiled)
            }
            MatcherSpec::Continuation { after, markers } => {
                Matcher::Continuation { after, markers }
            }
            MatcherSpec::ShortLine {
                max_chars,
                contains,
                ends_with,
                starts_with,
            } => Matcher::ShortLine {
                max_chars,
                contains,
                ends_with,
                starts_with,
            },
            MatcherSpec::Opener {
                first_line,
                prefixes,
            } => Matcher::Opener {
                first_line,
                prefixes,
            },
        };
        Ok(Rule {
            name: self.name,
            matcher,
            role: self.role,
        })
    }
}
