mod clean;
mod clock;
mod error;
mod parse;
mod rules;
mod source;

pub use clean::{clean_message, preview};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::TranscriptError;
pub use parse::{ParseOptions, ParsedTranscript, TranscriptParser};
pub use rules::{LineContext, Matcher, Rule, RuleTable};
pub use source::{parse_file, read_transcript};
