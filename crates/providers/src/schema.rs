//! Prompt and strict response contract for tab classification.

use crate::traits::{ProviderError, TabSummary};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tab_sorter_core::{GroupColor, GroupProposal, TabId};

pub const SYSTEM_PROMPT: &str = "You organize browser tabs. Group the given tabs into a small \
number of logical groups by topic or task. Give every group a short name, optionally prefixed \
with one emoji, and one color from the allowed list. Every input tab id must appear in exactly \
one group. Respond with JSON only.";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassificationResponse {
    pub groups: Vec<ClassifiedGroup>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClassifiedGroup {
    pub group_name: String,
    pub color: GroupColor,
    pub tab_ids: Vec<TabId>,
}

impl From<ClassifiedGroup> for GroupProposal {
    fn from(group: ClassifiedGroup) -> Self {
        GroupProposal::new(group.group_name, group.color, group.tab_ids)
    }
}

/// JSON schema handed to the model as its structured-output contract.
pub fn response_schema() -> Value {
    let colors: Vec<&str> = GroupColor::ALL.iter().map(|c| c.as_str()).collect();
    json!({
        "type": "object",
        "additionalProperties": false,
        "required": ["groups"],
        "properties": {
            "groups": {
                "type": "array",
                "items": {
                    "type": "object",
                    "additionalProperties": false,
                    "required": ["groupName", "color", "tabIds"],
                    "properties": {
                        "groupName": { "type": "string" },
                        "color": { "type": "string", "enum": colors },
                        "tabIds": { "type": "array", "items": { "type": "integer" } }
                    }
                }
            }
        }
    })
}

pub fn user_message(tabs: &[TabSummary]) -> Result<String, ProviderError> {
    serde_json::to_string(tabs).map_err(|e| ProviderError::Parse(e.to_string()))
}

/// Parses the model's JSON answer. Text that is not JSON is a parse error;
/// JSON of the wrong shape is a schema error. Nothing is coerced.
pub fn parse_groups(content: &str) -> Result<Vec<GroupProposal>, ProviderError> {
    let value: Value =
        serde_json::from_str(content).map_err(|e| ProviderError::Parse(e.to_string()))?;
    let response: ClassificationResponse =
        serde_json::from_value(value).map_err(|e| ProviderError::Schema(e.to_string()))?;

    Ok(response.groups.into_iter().map(GroupProposal::from).collect())
}
