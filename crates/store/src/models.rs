// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use serde::{Deserialize, Serialize};

/// One contribution to a pool. Append-only: records are never mutated after
/// insert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    pub user: String,
    pub is_private: bool,
    /// Plaintext wei amount; only present for public contributions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_wei: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx: Option<String>,
    /// Milliseconds since the unix epoch, matching the persisted layout
    pub timestamp: u64,
}

/// A funding project and its embedded contribution history. The wire/disk
/// field names are the persisted camelCase layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hard_cap: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_per: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_per: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    pub pool_address: String,
    pub creator: String,
    pub created_at: String,
    #[serde(default)]
    pub contributions: Vec<Contribution>,
}

impl Project {
    /// Pool addresses are compared case-insensitively throughout.
    pub fn matches_pool(&self, pool_address: &str) -> bool {
        self.pool_address.eq_ignore_ascii_case(pool_address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn persisted_layout_uses_camel_case() {
        let project = Project {
            id: "p1".into(),
            title: "Test".into(),
            category: None,
            description: None,
            images: None,
            hard_cap: None,
            min_per: None,
            max_per: None,
            start: None,
            end: None,
            pool_address: "0xPool".into(),
            creator: "0xCreator".into(),
            created_at: "2024-01-01T00:00:00Z".into(),
            contributions: vec![Contribution {
                user: "0xUser".into(),
                is_private: true,
                amount_wei: None,
                tx: Some("0xtx".into()),
                timestamp: 1700000000000,
            }],
        };
        let value = serde_json::to_value(&project).unwrap();
        assert_eq!(value["poolAddress"], "0xPool");
        assert_eq!(value["createdAt"], "2024-01-01T00:00:00Z");
        assert_eq!(value["contributions"][0]["isPrivate"], true);
        assert!(value["contributions"][0].get("amountWei").is_none());
    }

    #[test]
    fn reads_records_without_a_contributions_field() {
        let project: Project = serde_json::from_value(json!({
            "id": "p1",
            "title": "Bare",
            "poolAddress": "0xPool",
            "creator": "0xCreator",
            "createdAt": "2024-01-01T00:00:00Z",
        }))
        .unwrap();
        assert!(project.contributions.is_empty());
    }

    #[test]
    fn pool_matching_ignores_case() {
        let project: Project = serde_json::from_value(json!({
            "id": "p1",
            "title": "Bare",
            "poolAddress": "0xAbCd",
            "creator": "0xCreator",
            "createdAt": "2024-01-01T00:00:00Z",
        }))
        .unwrap();
        assert!(project.matches_pool("0xabcd"));
        assert!(project.matches_pool("0xABCD"));
        assert!(!project.matches_pool("0xother"));
    }
}
