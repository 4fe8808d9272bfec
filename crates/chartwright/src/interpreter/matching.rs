// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

//! Token to field resolution as a single ordered rule list.
//!
//! Rules are tried in [`MatchRule::ORDER`]. The first rule that finds any
//! field wins, and within a rule the first field in list order wins.

use crate::field::{FieldDescriptor, FieldList};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s_\-]+").expect("separator pattern is valid"));

/// Lowercases and strips spaces, underscores and hyphens, so that
/// `Flow Rate`, `flow_rate` and `FlowRate` compare equal.
pub fn normalize_name(s: &str) -> String {
    SEPARATORS.replace_all(&s.to_lowercase(), "").into_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    Exact,
    Containment,
    NormalizedContainment,
}
impl MatchRule {
    pub const ORDER: [MatchRule; 3] = [
        MatchRule::Exact,
        MatchRule::Containment,
        MatchRule::NormalizedContainment,
    ];

    /// `token` must already be lowercase and trimmed.
    pub fn matches(&self, token: &str, field: &FieldDescriptor) -> bool {
        if token.is_empty() {
            return false;
        }
        let name = field.display_name().to_lowercase();
        match self {
            MatchRule::Exact => token == name || token == field.id().to_lowercase(),
            MatchRule::Containment => name.contains(token) || token.contains(name.as_str()),
            MatchRule::NormalizedContainment => {
                let token = normalize_name(token);
                let name = normalize_name(&name);
                !token.is_empty()
                    && !name.is_empty()
                    && (name.contains(token.as_str()) || token.contains(name.as_str()))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMatch<'a> {
    pub field: &'a FieldDescriptor,
    pub rule: MatchRule,
}

pub fn resolve_token<'a>(token: &str, fields: &'a FieldList) -> Option<FieldMatch<'a>> {
    MatchRule::ORDER.iter().find_map(|rule| {
        fields
            .iter()
            .find(|f| rule.matches(token, f))
            .map(|field| FieldMatch { field, rule: *rule })
    })
}

/// Resolves a synonym's canonical fragment: normalized equality first, then
/// normalized containment of the fragment in the field name.
pub fn resolve_canonical<'a>(fragment: &str, fields: &'a FieldList) -> Option<&'a FieldDescriptor> {
    let fragment = normalize_name(fragment);
    if fragment.is_empty() {
        return None;
    }
    fields
        .iter()
        .find(|f| normalize_name(f.display_name()) == fragment || normalize_name(f.id()) == fragment)
        .or_else(|| {
            fields
                .iter()
                .find(|f| normalize_name(f.display_name()).contains(fragment.as_str()))
        })
}
