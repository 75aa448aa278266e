use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::EncodeError;

/// Maps a categorical value to the integer code a model was trained on.
pub trait CategoryEncoder {
    fn encode(&self, category: &str) -> Result<u32, EncodeError>;
}

/// Sorted-class label encoder: the code of a value is its index in the sorted class list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEncoder {
    column: String,
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new(column: impl Into<String>, classes: impl IntoIterator<Item = String>) -> Self {
        let mut classes = classes.into_iter().collect::<Vec<_>>();
        classes.sort();
        classes.dedup();
        Self {
            column: column.into(),
            classes,
        }
    }
}

impl CategoryEncoder for LabelEncoder {
    fn encode(&self, category: &str) -> Result<u32, EncodeError> {
        self.classes
            .binary_search_by(|c| c.as_str().cmp(category))
            .map(|idx| idx as u32)
            .map_err(|_| EncodeError::UnrecognizedCategory {
                column: self.column.clone(),
                value: category.to_string(),
            })
    }
}

/// Encoders for every categorical column, keyed by column name. Serialised as
/// `{"venue": ["A", "B"], ...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelEncoders {
    by_column: BTreeMap<String, LabelEncoder>,
}

impl LabelEncoders {
    pub fn insert(&mut self, encoder: LabelEncoder) {
        self.by_column.insert(encoder.column.clone(), encoder);
    }

    pub fn get(&self, column: &str) -> Option<&LabelEncoder> {
        self.by_column.get(column)
    }

    pub fn encode(&self, column: &str, category: &str) -> Result<u32, EncodeError> {
        self.get(column)
            .ok_or_else(|| EncodeError::UnknownColumn(column.to_string()))?
            .encode(category)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.by_column.keys().map(String::as_str)
    }
}

impl Serialize for LabelEncoders {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let plain = self
            .by_column
            .iter()
            .map(|(k, v)| (k.as_str(), v.classes.as_slice()))
            .collect::<BTreeMap<_, _>>();
        plain.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for LabelEncoders {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let plain = BTreeMap::<String, Vec<String>>::deserialize(deserializer)?;
        let mut out = LabelEncoders::default();
        for (column, classes) in plain {
            out.insert(LabelEncoder::new(column, classes));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn venues() -> LabelEncoder {
        LabelEncoder::new(
            "venue",
            ["Wankhede Stadium", "Eden Gardens", "Adelaide Oval"]
                .iter()
                .map(|s| s.to_string()),
        )
    }

    #[test]
    fn codes_follow_sorted_order() {
        let enc = venues();
        assert_eq!(enc.encode("Adelaide Oval"), Ok(0));
        assert_eq!(enc.encode("Eden Gardens"), Ok(1));
        assert_eq!(enc.encode("Wankhede Stadium"), Ok(2));
    }

    #[test]
    fn unseen_value_names_column_and_value() {
        let err = venues().encode("Lord's").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Value 'Lord's' not recognized in 'venue' encoder."
        );
    }

    #[test]
    fn deserializes_from_class_lists() {
        let encoders: LabelEncoders =
            serde_json::from_str(r#"{"toss_decision": ["field", "bat"]}"#).unwrap();
        assert_eq!(encoders.encode("toss_decision", "bat"), Ok(0));
        assert_eq!(
            encoders.encode("batting_team", "India"),
            Err(EncodeError::UnknownColumn("batting_team".to_string()))
        );
        let round = serde_json::to_string(&encoders).unwrap();
        assert_eq!(round, r#"{"toss_decision":["bat","field"]}"#);
    }
}
