// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::entity::Record;

/// 询价明细的终态，不计入工作量
pub const CLOSED_ITEM_STATUSES: [&str; 2] = ["COMPLETED", "CANCELLED"];

/// 用户工作量视图
///
/// 指派给某用户、尚未关闭的询价明细，以及按状态分组的数量。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserWorkload {
    pub user_id: String,
    pub total: u64,
    pub by_status: BTreeMap<String, u64>,
    pub items: Vec<Record>,
}

impl UserWorkload {
    pub fn from_items(user_id: impl Into<String>, items: Vec<Record>) -> Self {
        let mut by_status = BTreeMap::new();
        for item in &items {
            let status = item.get_str("status").unwrap_or("UNKNOWN").to_string();
            *by_status.entry(status).or_insert(0) += 1;
        }

        Self {
            user_id: user_id.into(),
            total: items.len() as u64,
            by_status,
            items,
        }
    }
}

/// 询价单及其明细
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InquiryWithItems {
    pub inquiry: Record,
    pub items: Vec<Record>,
}
