use recollect_core::{
    message_id, rfc3339, Message, Metadata, ParsedConversation, Role, RoleCounts,
    SOURCE_HISTORICAL,
};
use serde_json::json;
use time::{Duration, OffsetDateTime};

use crate::clean::clean_message;
use crate::clock::{Clock, SystemClock};
use crate::error::TranscriptError;
use crate::rules::{LineContext, RuleTable};

/// Spacing between consecutive synthetic timestamps.
pub const DEFAULT_INTERVAL: Duration = Duration::minutes(2);

/// How far before "now" the synthetic timeline starts when not pinned.
pub const DEFAULT_LOOKBACK: Duration = Duration::days(30);

#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// First message timestamp. Defaults to clock-now minus 30 days.
    pub base_time: Option<OffsetDateTime>,
    pub interval: Duration,
    /// Discard `system` turns instead of emitting them.
    pub drop_system: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            base_time: None,
            interval: DEFAULT_INTERVAL,
            drop_system: false,
        }
    }
}

/// Output of one parse run.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTranscript {
    pub messages: Vec<Message>,
    pub counts: RoleCounts,
    pub parsed_at: String,
}

impl ParsedTranscript {
    pub fn into_document(self, source_file: &str) -> ParsedConversation {
        ParsedConversation::new(source_file, self.parsed_at, self.messages)
    }
}

/// Splits unlabeled transcript lines into speaker-attributed messages.
pub struct TranscriptParser {
    rules: RuleTable,
    options: ParseOptions,
    clock: Box<dyn Clock>,
}

impl TranscriptParser {
    pub fn new(rules: RuleTable) -> Self {
        Self {
            rules,
            options: ParseOptions::default(),
            clock: Box::new(SystemClock),
        }
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// Parse raw lines (without line terminators) in source order.
    ///
    /// Blank lines are skipped without ending the current turn. A line whose
    /// detected role differs from the active one closes the buffered turn
    /// and opens a new one; the last turn is closed at end of input.
    pub fn parse_lines<S: AsRef<str>>(
        &self,
        lines: &[S],
    ) -> Result<ParsedTranscript, TranscriptError> {
        let now = self.clock.now();
        let mut emitter = Emitter {
            base: match self.options.base_time {
                Some(base) => base,
                None => now
                    .checked_sub(DEFAULT_LOOKBACK)
                    .ok_or(TranscriptError::TimestampOutOfRange { sequence: 0 })?,
            },
            interval: self.options.interval,
            drop_system: self.options.drop_system,
            parsed_at: rfc3339(now)?,
            messages: Vec::new(),
            counts: RoleCounts::default(),
        };

        let mut turn: Option<Turn<'_>> = None;

        for (i, line) in lines.iter().enumerate() {
            let line = line.as_ref();
            if line.trim().is_empty() {
                continue;
            }
            let line_number = i + 1;
            let ctx = LineContext::new(line, line_number, turn.as_ref().map(|t| t.role));
            let role = self.rules.classify(&ctx);

            match turn.as_mut() {
                Some(t) if t.role == role => t.push(line, line_number),
                _ => {
                    if let Some(done) = turn.take() {
                        emitter.emit(done)?;
                    }
                    turn = Some(Turn::start(role, line, line_number));
                }
            }
        }

        if let Some(done) = turn {
            emitter.emit(done)?;
        }

        tracing::debug!(
            messages = emitter.messages.len(),
            user = emitter.counts.user,
            assistant = emitter.counts.assistant,
            system = emitter.counts.system,
            "parsed transcript"
        );

        Ok(ParsedTranscript {
            messages: emitter.messages,
            counts: emitter.counts,
            parsed_at: emitter.parsed_at,
        })
    }
}

impl Default for TranscriptParser {
    fn default() -> Self {
        Self::new(RuleTable::default())
    }
}

/// Lines buffered under one speaker.
struct Turn<'a> {
    role: Role,
    lines: Vec<&'a str>,
    line_start: usize,
    line_end: usize,
}

impl<'a> Turn<'a> {
    fn start(role: Role, line: &'a str, line_number: usize) -> Self {
        Self {
            role,
            lines: vec![line],
            line_start: line_number,
            line_end: line_number,
        }
    }

    fn push(&mut self, line: &'a str, line_number: usize) {
        self.lines.push(line);
        self.line_end = line_number;
    }
}

struct Emitter {
    base: OffsetDateTime,
    interval: Duration,
    drop_system: bool,
    parsed_at: String,
    messages: Vec<Message>,
    counts: RoleCounts,
}

impl Emitter {
    /// `base + interval * sequence`, or an error past the calendar's end.
    fn timestamp_for(&self, sequence: usize) -> Result<OffsetDateTime, TranscriptError> {
        i32::try_from(sequence)
            .ok()
            .and_then(|n| self.interval.checked_mul(n))
            .and_then(|offset| self.base.checked_add(offset))
            .ok_or(TranscriptError::TimestampOutOfRange { sequence })
    }

    fn emit(&mut self, turn: Turn<'_>) -> Result<(), TranscriptError> {
        let content = clean_message(&turn.lines.join("\n"));
        if content.is_empty() {
            return Ok(());
        }
        if self.drop_system && turn.role == Role::System {
            return Ok(());
        }

        let sequence = self.messages.len();
        let timestamp = rfc3339(self.timestamp_for(sequence)?)?;

        let mut metadata = Metadata::new();
        metadata.insert("source".into(), json!(SOURCE_HISTORICAL));
        metadata.insert("line_start".into(), json!(turn.line_start));
        metadata.insert("line_end".into(), json!(turn.line_end));
        metadata.insert("parsed_at".into(), json!(self.parsed_at));

        self.counts.add(turn.role);
        self.messages.push(Message {
            id: message_id(
                sequence,
                turn.line_start,
                turn.line_end,
                turn.role,
                &content,
            ),
            role: turn.role,
            content,
            timestamp,
            metadata,
        });
        Ok(())
    }
}
