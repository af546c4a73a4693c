// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub id: i64,
    pub code: String,
    pub name: String,
}

/// Weighting datapoint. `value` is the default; `values_by_period`
/// holds per-period overrides keyed by YYYY-MM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasisAccount {
    pub id: i64,
    pub name: String,
    pub value: Option<Decimal>,
    pub values_by_period: HashMap<String, Decimal>,
}

/// Ledger amount to be distributed; same shape as a basis account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceAccount {
    pub id: i64,
    pub name: String,
    pub value: Option<Decimal>,
    pub values_by_period: HashMap<String, Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetRow {
    pub basis_account: String,
    pub operation_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationPreset {
    pub id: i64,
    pub name: String,
    pub rows: Vec<PresetRow>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Distribution {
    pub id: i64,
    pub source_account_id: i64,
    pub dist_type: String, // direct | percentage | dynamic
    pub preset_id: Option<i64>,
    pub status: String, // Distributed | Undistributed
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionDetail {
    pub distribution_id: i64,
    pub operation_code: String,
    pub pct: Option<Decimal>,
}

/// One saved allocation activity row (output of `allocate run --save`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRecord {
    pub id: i64,
    pub source_account: String,
    pub period: Option<String>,
    pub operation_code: String,
    pub amount: Decimal,
    pub basis_value: Decimal,
    pub ratio: Decimal,
    pub preset: Option<String>,
}
