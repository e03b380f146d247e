//! Batch generation requests and their input validation.

use std::fmt;

use serde_json::Value;

pub const MIN_DOCUMENTS: i64 = 1;
pub const MAX_DOCUMENTS: i64 = 100;

/// Link shown once a generation completed; the server renders the
/// decision tree trained on the generated documents.
pub const DECISION_TREE_LINK: &str = "/tree_img";
pub const DECISION_TREE_LABEL: &str = "See decision tree";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    NotANumber { input: String },
    OutOfRange { amount: i64 },
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::NotANumber { .. } => {
                write!(f, "Invalid input : please enter a number")
            }
            GenerationError::OutOfRange { .. } => write!(
                f,
                "Invalid input : please enter a number of documents between {} and {}",
                MIN_DOCUMENTS, MAX_DOCUMENTS
            ),
        }
    }
}

impl std::error::Error for GenerationError {}

/// Integer prefix of `input`, after leading whitespace and an optional
/// sign (`"12abc"` → 12, `"abc"` → none).
pub fn parse_leading_int(input: &str) -> Option<i64> {
    let s = input.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    // saturate absurdly long inputs; they are out of range anyway
    let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
    Some(sign * magnitude)
}

/// Validates a requested document count.
pub fn validate_amount(input: &str) -> Result<u32, GenerationError> {
    let amount = parse_leading_int(input).ok_or_else(|| GenerationError::NotANumber {
        input: input.to_string(),
    })?;
    if !(MIN_DOCUMENTS..=MAX_DOCUMENTS).contains(&amount) {
        return Err(GenerationError::OutOfRange { amount });
    }
    Ok(amount as u32)
}

/// Status line shown while a generation is in flight.
pub fn progress_message(amount: u32, reset: bool) -> String {
    format!("{} {} documents", if reset { "Generating" } else { "Adding" }, amount)
}

/// Which server endpoint produces the documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationRoute {
    /// `POST /generate_pdfs/{amount}` with a configuration filter.
    #[default]
    GeneratePdfs,
    /// `POST /compile/{amount}`, with `/False` appended in additive mode.
    Compile,
}

impl GenerationRoute {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "generate" | "generate_pdfs" => Some(GenerationRoute::GeneratePdfs),
            "compile" => Some(GenerationRoute::Compile),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub route: GenerationRoute,
    pub amount: u32,
    pub reset: bool,
    /// JSON body; `None` for the compile route.
    pub body: Option<Value>,
}

impl GenerationRequest {
    /// Path relative to the server root.
    pub fn path(&self) -> String {
        match self.route {
            GenerationRoute::GeneratePdfs => format!("generate_pdfs/{}", self.amount),
            GenerationRoute::Compile if self.reset => format!("compile/{}", self.amount),
            GenerationRoute::Compile => format!("compile/{}/False", self.amount),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejects_bad_counts() {
        assert_eq!(
            validate_amount("abc"),
            Err(GenerationError::NotANumber { input: "abc".to_string() })
        );
        assert_eq!(validate_amount("0"), Err(GenerationError::OutOfRange { amount: 0 }));
        assert_eq!(validate_amount("101"), Err(GenerationError::OutOfRange { amount: 101 }));
        assert_eq!(validate_amount("-5"), Err(GenerationError::OutOfRange { amount: -5 }));
        assert!(validate_amount("").is_err());
        assert!(validate_amount("99999999999999999999999").is_err());
    }

    #[test]
    fn test_accepts_bounds_and_prefixes() {
        assert_eq!(validate_amount("1"), Ok(1));
        assert_eq!(validate_amount("100"), Ok(100));
        assert_eq!(validate_amount(" 25 docs"), Ok(25));
        assert_eq!(validate_amount("+7"), Ok(7));
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            validate_amount("x").unwrap_err().to_string(),
            "Invalid input : please enter a number"
        );
        assert_eq!(
            validate_amount("0").unwrap_err().to_string(),
            "Invalid input : please enter a number of documents between 1 and 100"
        );
        assert_eq!(progress_message(5, true), "Generating 5 documents");
        assert_eq!(progress_message(5, false), "Adding 5 documents");
    }

    #[test]
    fn test_paths() {
        let mut req = GenerationRequest {
            route: GenerationRoute::GeneratePdfs,
            amount: 10,
            reset: false,
            body: Some(json!({})),
        };
        assert_eq!(req.path(), "generate_pdfs/10");
        req.route = GenerationRoute::Compile;
        assert_eq!(req.path(), "compile/10/False");
        req.reset = true;
        assert_eq!(req.path(), "compile/10");
        assert_eq!(GenerationRoute::from_name("Compile"), Some(GenerationRoute::Compile));
        assert_eq!(GenerationRoute::from_name("other"), None);
    }
}
