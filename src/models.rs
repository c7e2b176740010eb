use serde::{Serialize, Deserialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Size { XS, S, M, L, XL, XXL }

impl Size {
    pub const ALL: [Size; 6] = [Size::XS, Size::S, Size::M, Size::L, Size::XL, Size::XXL];

    pub fn code(self) -> &'static str {
        match self {
            Size::XS => "XS",
            Size::S => "S",
            Size::M => "M",
            Size::L => "L",
            Size::XL => "XL",
            Size::XXL => "XXL",
        }
    }
}

/// The third option, like the size picker's initial state.
impl Default for Size {
    fn default() -> Self { Size::ALL[2] }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.code()) }
}

impl FromStr for Size {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        Size::ALL
            .into_iter()
            .find(|size| size.code() == wanted)
            .ok_or_else(|| format!("unknown size '{}'", s.trim()))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ClothingItem {
    pub id: String,
    pub name: String,
    pub src: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TryOnResult {
    pub index: u32,
    pub image: String,
}

/// Body returned by the synthesis service. Every field is optional: missing
/// `logs`/`results` simply leave the session as it was.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct TryOnResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub results: Option<Vec<TryOnResult>>,
    #[serde(default)]
    pub logs: Option<Vec<String>>,
    /// Human-readable failure reason; FastAPI validation errors send a list.
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub id: String,
    pub date: String,
    pub image: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SizeRequest {
    pub size: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_size_is_third_option() {
        assert_eq!(Size::default(), Size::M);
        assert_eq!(Size::ALL.len(), 6);
    }

    #[test]
    fn size_parses_loosely() {
        assert_eq!(" xl ".parse::<Size>(), Ok(Size::XL));
        assert_eq!("XXL".parse::<Size>(), Ok(Size::XXL));
        assert!("XXXL".parse::<Size>().is_err());
    }

    #[test]
    fn response_tolerates_missing_and_null_fields() {
        let parsed: TryOnResponse = serde_json::from_str(r#"{"logs": null, "success": true}"#).unwrap();
        assert_eq!(parsed.logs, None);
        assert_eq!(parsed.results, None);

        let parsed: TryOnResponse = serde_json::from_str(
            r#"{"logs":["a","b"],"results":[{"index":0,"image":"x"}]}"#,
        ).unwrap();
        assert_eq!(parsed.logs, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(parsed.results, Some(vec![TryOnResult { index: 0, image: "x".into() }]));
        assert_eq!(parsed.detail, None);

        let parsed: TryOnResponse = serde_json::from_str(r#"{"success":false,"detail":"size not supported"}"#).unwrap();
        assert_eq!(parsed.detail, Some(serde_json::Value::String("size not supported".into())));
    }
}
