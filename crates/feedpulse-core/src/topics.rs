//! Topic id → topic group resolution.
//!
//! Topic groups are declared in order and resolution is first-match: an id
//! listed under more than one group always lands in the earliest declaration.
//! The built-in table has such overlaps; [`TopicGroups::overlaps`] reports
//! them rather than rewriting the table.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Group for ids the table does not know, and for unassigned non-empty remarks.
pub const OTHER: &str = "Other";

/// Group for unassigned remarks that look like an empty / no-comment answer.
pub const NO_SUGGESTION: &str = "Nothing, No Suggestion";

/// Fragments that mark an empty answer. Matched as substrings of the
/// lower-cased remark.
pub const EMPTY_COMMENTS: &[&str] = &["nil", "na", "null", "no", "nop", "noo"];

const BUILTIN: &[(&str, &[i64])] = &[
    ("Sessions related to AI", &[0]),
    ("Internet, Wi-Fi, and Network Connectivity Issues", &[1]),
    (
        "Need for More Practical, Advanced, Hands-on, and Extended Sessions",
        &[2, 22, 10, 19, 31, 48, 49],
    ),
    (
        "Insufficient Break Time and Need for More Frequent Intervals",
        &[3],
    ),
    (
        "Teaching methodology & instructor effectiveness",
        &[4, 40, 25],
    ),
    (
        "Overall Positive Feedback",
        &[5, 14, 16, 20, 21, 23, 24, 32, 33, 37, 39, 41, 46, 50, 53],
    ),
    ("Session Pace and Speed of Delivery", &[7, 10, 45]),
    ("Topic Coverage, Depth, and Time Allocation", &[8]),
    (
        "Session Duration, Intervals, and Time Allocation",
        &[9, 11, 28, 43, 52],
    ),
    (
        "Overall Satisfaction with No Suggestions for Improvement",
        &[11],
    ),
    (
        "Need for Conceptual Clarity, Basic Explanations, and Learning Resources",
        &[12, 34],
    ),
    (
        "Interest in Continued and Advanced Skill-Based Courses",
        &[13],
    ),
    ("Classroom Infrastructure and Temperature Comfort", &[14, 18]),
    (
        "Expectations for Practical Data Analytics and Office-Oriented Tools",
        &[15],
    ),
    (
        "Classroom Infrastructure and Projector Visibility Issues",
        &[17],
    ),
    (
        "Classroom Thermal Comfort and Air Conditioning Issues",
        &[18],
    ),
    (
        "Interaction, Activities and Engagement in Learning",
        &[22, 55, 6],
    ),
    ("Malayalam", &[26]),
    ("Improvement and Minor Operational Suggestions", &[27]),
    ("Audio Quality and Classroom Environment", &[29]),
    ("Coding Related Queries", &[30, 54]),
    ("Content Delivery and Section Quality", &[35]),
    ("Information and Effectiveness of the session", &[36]),
    (NO_SUGGESTION, &[38, 44]),
    ("Study Material", &[42, 47]),
    ("Presentation and slides Quality", &[51]),
    ("Sitting capacity", &[56]),
];

/// One named topic group and the topic ids that map to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicGroup {
    pub name: String,
    pub ids: Vec<i64>,
}

/// Ordered topic-group table. Built once at startup and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicGroups {
    groups: Vec<TopicGroup>,
}

impl Default for TopicGroups {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TopicGroups {
    pub fn new(groups: Vec<TopicGroup>) -> Self {
        Self { groups }
    }

    /// The table the shipped topic model was labelled with.
    pub fn builtin() -> Self {
        let groups = BUILTIN
            .iter()
            .map(|(name, ids)| TopicGroup {
                name: (*name).to_string(),
                ids: ids.to_vec(),
            })
            .collect();
        Self { groups }
    }

    /// Load a table from a JSON array of `{ "name": ..., "ids": [...] }` objects.
    ///
    /// Declaration order in the file is the resolution order.
    pub fn from_json_file(path: &Path) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path).map_err(|source| CoreError::TopicMapIo {
            path: path.to_path_buf(),
            source,
        })?;
        let groups: Vec<TopicGroup> =
            serde_json::from_str(&text).map_err(|source| CoreError::TopicMapJson {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self { groups })
    }

    pub fn groups(&self) -> &[TopicGroup] {
        &self.groups
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// First declared group containing `id`.
    pub fn group_for_id(&self, id: i64) -> Option<&str> {
        self.groups
            .iter()
            .find(|g| g.ids.contains(&id))
            .map(|g| g.name.as_str())
    }

    /// Resolve a classifier output to a topic group name.
    ///
    /// With an id: the first group declaring it, else [`OTHER`]. Without one:
    /// [`NO_SUGGESTION`] if the remark looks empty, else [`OTHER`].
    pub fn resolve(&self, topic_id: Option<i64>, remark: &str) -> &str {
        match topic_id {
            Some(id) => self.group_for_id(id).unwrap_or(OTHER),
            None if is_empty_comment(remark) => NO_SUGGESTION,
            None => OTHER,
        }
    }

    /// Ids declared by more than one group, with every group that declares them
    /// in declaration order. Resolution always picks the first.
    pub fn overlaps(&self) -> Vec<(i64, Vec<&str>)> {
        let mut owners: BTreeMap<i64, Vec<&str>> = BTreeMap::new();
        for group in &self.groups {
            for &id in &group.ids {
                let names = owners.entry(id).or_default();
                if !names.contains(&group.name.as_str()) {
                    names.push(group.name.as_str());
                }
            }
        }
        owners
            .into_iter()
            .filter(|(_, names)| names.len() > 1)
            .collect()
    }
}

/// Whether a remark reads as an empty / no-comment answer.
pub fn is_empty_comment(remark: &str) -> bool {
    let lower = remark.to_lowercase();
    EMPTY_COMMENTS.iter().any(|w| lower.contains(w))
}
