use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// One record flowing from the map phase to the reduce phase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyValue {
    pub key: String,
    pub value: String,
}

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        KeyValue {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// All values one map task produced for a key. Only written in grouped mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct KeyValues {
    pub key: String,
    pub values: Vec<String>,
}

/// Groups records by key. Groups come out sorted by `order`; keys that
/// `order` considers equal but that differ are kept in separate groups,
/// ordered by plain string comparison.
pub fn group_by_key<F>(mut records: Vec<KeyValue>, order: F) -> Vec<KeyValues>
where
    F: Fn(&str, &str) -> Ordering,
{
    records.sort_by(|a, b| order(&a.key, &b.key).then_with(|| a.key.cmp(&b.key)));

    let mut groups: Vec<KeyValues> = vec![];
    for kv in records {
        match groups.last_mut() {
            Some(group) if group.key == kv.key => group.values.push(kv.value),
            _ => groups.push(KeyValues {
                key: kv.key,
                values: vec![kv.value],
            }),
        }
    }
    groups
}
