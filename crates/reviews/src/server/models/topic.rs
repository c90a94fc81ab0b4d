//! The fixed topic set reviews are scored against

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
  Quality,
  Fit,
  Size,
  Comfort,
  Price,
}

/// Rejected topic name; renders as the message shown to API callers
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid topic. Choose from {}", Topic::choices())]
pub struct UnknownTopic(pub String);

impl Topic {
  pub const COUNT: usize = 5;

  /// Every topic, in score-column order
  pub const ALL: [Topic; Topic::COUNT] =
    [Topic::Quality, Topic::Fit, Topic::Size, Topic::Comfort, Topic::Price];

  pub const fn as_str(self) -> &'static str {
    match self {
      Topic::Quality => "quality",
      Topic::Fit => "fit",
      Topic::Size => "size",
      Topic::Comfort => "comfort",
      Topic::Price => "price",
    }
  }

  /// Column of this topic in a review's score row
  pub const fn index(self) -> usize {
    self as usize
  }

  pub fn names() -> Vec<&'static str> {
    Self::ALL.iter().map(|topic| topic.as_str()).collect()
  }

  /// The valid names as a bracketed, quoted list: `['quality', 'fit', ...]`
  pub fn choices() -> String {
    let quoted: Vec<String> = Self::ALL.iter().map(|topic| format!("'{topic}'")).collect();
    format!("[{}]", quoted.join(", "))
  }
}

impl fmt::Display for Topic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Topic {
  type Err = UnknownTopic;

  fn from_str(name: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|topic| topic.as_str() == name)
      .ok_or_else(|| UnknownTopic(name.to_string()))
  }
}
