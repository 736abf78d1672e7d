use serde::{Deserialize, Serialize};

use crate::purchase::DesiredQuantity;

/// A product the operator wants bought when it shows up on the restock listing.
///
/// Stored as either a bare title string or `{title, quantity?}`; both shapes
/// normalise into this record on load and are written back as objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TargetRecord")]
pub struct Target {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TargetRecord {
    Title(String),
    Entry {
        title: String,
        #[serde(default)]
        quantity: Option<u32>,
    },
}

impl From<TargetRecord> for Target {
    fn from(record: TargetRecord) -> Self {
        match record {
            TargetRecord::Title(title) => Self {
                title: title.trim().to_string(),
                quantity: None,
            },
            TargetRecord::Entry { title, quantity } => Self {
                title: title.trim().to_string(),
                quantity,
            },
        }
    }
}

impl Target {
    pub fn new(title: impl Into<String>, quantity: Option<u32>) -> Self {
        Self {
            title: title.into(),
            quantity,
        }
    }

    /// A missing or zero quantity means "as many as the page allows".
    pub fn desired(&self) -> DesiredQuantity {
        match self.quantity {
            Some(n) if n > 0 => DesiredQuantity::Exactly(n),
            _ => DesiredQuantity::Unbounded,
        }
    }
}

/// Exact title lookup. First configured entry wins if a title is listed twice.
pub fn find_target<'a>(targets: &'a [Target], title: &str) -> Option<&'a Target> {
    targets.iter().find(|t| t.title == title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixed_shapes_normalise() {
        let json = r#"["Figure A", {"title": "Figure B", "quantity": 2}, {"title": "Figure C"}]"#;
        let targets: Vec<Target> = serde_json::from_str(json).unwrap();
        assert_eq!(targets.len(), 3);
        assert_eq!(targets[0], Target::new("Figure A", None));
        assert_eq!(targets[1], Target::new("Figure B", Some(2)));
        assert_eq!(targets[2], Target::new("Figure C", None));
    }

    #[test]
    fn serialises_as_objects() {
        let targets = vec![Target::new("A", None), Target::new("B", Some(3))];
        let json = serde_json::to_string(&targets).unwrap();
        assert_eq!(json, r#"[{"title":"A"},{"title":"B","quantity":3}]"#);
    }

    #[test]
    fn zero_quantity_is_unbounded() {
        assert_eq!(Target::new("A", Some(0)).desired(), DesiredQuantity::Unbounded);
        assert_eq!(Target::new("A", None).desired(), DesiredQuantity::Unbounded);
        assert_eq!(Target::new("A", Some(4)).desired(), DesiredQuantity::Exactly(4));
    }

    #[test]
    fn lookup_is_exact() {
        let targets = vec![Target::new("Figure A", Some(2))];
        assert!(find_target(&targets, "Figure A").is_some());
        assert!(find_target(&targets, "Figure A (Reissue)").is_none());
        assert!(find_target(&targets, "figure a").is_none());
    }
}
