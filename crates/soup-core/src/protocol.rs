//! The reply protocol the host model must follow, and its enforcement.
//!
//! Every reply starts with one of four tag markers. [`parse_reply`] splits the
//! marker from the body and [`judge`] decides whether the body is something
//! the host is allowed to say under that tag.
//!
//! | tag | legal when | shown content |
//! |---|---|---|
//! | `SOLVED` | always | body + truth block |
//! | `ANSWER` | body is a lexicon word (trailing punctuation ignored) | the word |
//! | `HINT`, `UNSOLVED` | body ≤ [`MAX_HINT_CHARS`] characters | body |
//! | untagged | same as `ANSWER` | the word |
//!
//! Anything else is shown as [`SILENCE`].

use std::fmt;

/// Shown to the player instead of a reply that broke the protocol.
pub const SILENCE: &str = "主持人保持沉默。（回答因规则限制被过滤）";

/// The closed set of answers allowed under `ANSWER`: yes, no, irrelevant,
/// doesn't matter.
pub const LEXICON: [&str; 4] = ["是", "不是", "没有关系", "不重要"];

/// Upper bound, in characters, on `HINT` and `UNSOLVED` bodies.
pub const MAX_HINT_CHARS: usize = 100;

/// Heading of the block that reveals the truth.
pub const TRUTH_HEADING: &str = "【汤底】";

// ─── Response kind ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
  Solved,
  Unsolved,
  Answer,
  Hint,
  /// No recognised marker; treated as an implicit answer.
  Untagged,
}

impl ResponseKind {
  /// Tagged kinds in the order their markers are tried.
  pub const TAGGED: [ResponseKind; 4] =
    [Self::Solved, Self::Answer, Self::Hint, Self::Unsolved];

  pub fn name(self) -> Option<&'static str> {
    match self {
      Self::Solved => Some("SOLVED"),
      Self::Unsolved => Some("UNSOLVED"),
      Self::Answer => Some("ANSWER"),
      Self::Hint => Some("HINT"),
      Self::Untagged => None,
    }
  }

  /// The canonical marker the model is told to write, e.g. `[[HINT]]`.
  pub fn marker(self) -> Option<String> {
    self.name().map(|name| format!("[[{name}]]"))
  }
}

impl fmt::Display for ResponseKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name().unwrap_or("UNTAGGED"))
  }
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
  pub kind: ResponseKind,
  pub body: String,
}

/// Split raw model output into its tag and body.
///
/// Accepts `[[TAG]]` and `[TAG]`. Without a recognised marker the whole
/// trimmed text becomes the body of an [`ResponseKind::Untagged`] reply.
pub fn parse_reply(raw: &str) -> ParsedReply {
  let text = raw.trim();
  for kind in ResponseKind::TAGGED {
    let Some(name) = kind.name() else { continue };
    if let Some(rest) = strip_marker(text, name) {
      return ParsedReply { kind, body: rest.trim().to_owned() };
    }
  }
  ParsedReply { kind: ResponseKind::Untagged, body: text.to_owned() }
}

fn strip_marker<'a>(text: &'a str, name: &str) -> Option<&'a str> {
  let double = text
    .strip_prefix("[[")
    .and_then(|rest| rest.strip_prefix(name))
    .and_then(|rest| rest.strip_prefix("]]"));
  double.or_else(|| {
    text
      .strip_prefix('[')
      .and_then(|rest| rest.strip_prefix(name))
      .and_then(|rest| rest.strip_prefix(']'))
  })
}

// ─── Lexicon ─────────────────────────────────────────────────────────────────

fn is_trailing_punctuation(c: char) -> bool {
  c.is_whitespace()
    || matches!(
      c,
      '。' | '．' | '.' | '！' | '!' | '？' | '?' | '，' | ',' | '；' | ';' | '：'
        | ':' | '…' | '~' | '～'
    )
}

/// Return the lexicon word `body` stands for, if any. Only trailing
/// punctuation is forgiven; anything else must match exactly.
pub fn lexicon_member(body: &str) -> Option<&'static str> {
  let word = body.trim_end_matches(is_trailing_punctuation).trim_start();
  LEXICON.iter().copied().find(|member| *member == word)
}

// ─── Legality ────────────────────────────────────────────────────────────────

/// The validator's decision about one reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
  pub is_legal: bool,
  /// What the player sees: the final content when legal, [`SILENCE`]
  /// otherwise.
  pub content:  String,
  /// Whether this reply asks the session to move to `solved`.
  pub solved:   bool,
}

impl Verdict {
  fn legal(content: String) -> Self { Self { is_legal: true, content, solved: false } }

  fn silent() -> Self {
    Self { is_legal: false, content: SILENCE.to_owned(), solved: false }
  }
}

/// The block appended to a reply (or a give-up notice) that reveals `truth`.
pub fn truth_block(truth: &str) -> String { format!("{TRUTH_HEADING}\n{truth}") }

/// Decide whether `reply` is allowed and what the player should see.
pub fn judge(reply: &ParsedReply, truth: &str) -> Verdict {
  match reply.kind {
    ResponseKind::Solved => {
      let content = if reply.body.is_empty() {
        truth_block(truth)
      } else {
        format!("{}\n\n{}", reply.body, truth_block(truth))
      };
      Verdict { is_legal: true, content, solved: true }
    }
    ResponseKind::Answer | ResponseKind::Untagged => {
      match lexicon_member(&reply.body) {
        Some(word) => Verdict::legal(word.to_owned()),
        None => Verdict::silent(),
      }
    }
    ResponseKind::Hint | ResponseKind::Unsolved => {
      if reply.body.chars().count() <= MAX_HINT_CHARS {
        Verdict::legal(reply.body.clone())
      } else {
        Verdict::silent()
      }
    }
  }
}
