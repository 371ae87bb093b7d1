use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Exchange market code, either `QUOTE-BASE` (e.g. `KRW-BTC`) or a bare
/// symbol (e.g. `BTC`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Instrument {
    code: String,
    split: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstrumentError {
    #[error("instrument code '{0}' is not a symbol or QUOTE-BASE pair")]
    Malformed(String),
}

impl Instrument {
    pub fn parse(code: &str) -> Result<Self, InstrumentError> {
        let code = code.trim();
        let valid_part =
            |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric());

        let split = code.find('-');
        let valid = match split {
            Some(at) => valid_part(&code[..at]) && valid_part(&code[at + 1..]),
            None => valid_part(code),
        };
        if !valid {
            return Err(InstrumentError::Malformed(code.to_string()));
        }
        Ok(Self {
            code: code.to_ascii_uppercase(),
            split,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Currency the instrument is priced in (`KRW` for `KRW-BTC`).
    pub fn quote(&self) -> Option<&str> {
        self.split.map(|at| &self.code[..at])
    }

    /// Traded coin (`BTC` for `KRW-BTC`, the whole code for a bare symbol).
    pub fn base(&self) -> &str {
        match self.split {
            Some(at) => &self.code[at + 1..],
            None => &self.code,
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code)
    }
}

impl TryFrom<String> for Instrument {
    type Error = InstrumentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Instrument> for String {
    fn from(value: Instrument) -> Self {
        value.code
    }
}

impl std::str::FromStr for Instrument {
    type Err = InstrumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
