// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::{AllocationPreset, BasisAccount, SourceAccount};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AllocationError {
    #[error("basis total is zero or negative; provide at least one positive weight")]
    InvalidBasis,
}

/// Resolved weight for one preset row at computation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetBasisRow {
    pub basis_account: String,
    pub operation_code: String,
    pub basis_value: Decimal,
    pub preset_id: String,
    pub preset_name: String,
}

/// A non-preset target weight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandaloneWeight {
    pub operation_code: String,
    pub basis_value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatAllocation {
    pub allocations: Vec<Decimal>,
    pub adjustment_index: Option<usize>,
    pub adjustment_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationEntry {
    pub operation_code: String,
    pub value: Decimal,
    pub basis_value: Decimal,
    pub ratio: Decimal,
    pub preset_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetRowAllocation {
    pub operation_code: String,
    pub basis_value: Decimal,
    pub allocation: Decimal,
    pub ratio: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetBreakdown {
    pub preset_id: String,
    pub preset_name: String,
    pub total_basis: Decimal,
    pub allocated_amount: Decimal,
    pub rows: Vec<PresetRowAllocation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetAllocation {
    pub allocations: Vec<AllocationEntry>,
    pub adjustment_index: Option<usize>,
    pub adjustment_amount: Decimal,
    pub preset_allocations: Vec<PresetBreakdown>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetMemberValue {
    pub account: String,
    pub account_name: String,
    pub value: Decimal,
}

pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

fn resolve_value(
    default: Option<Decimal>,
    by_period: &HashMap<String, Decimal>,
    period: Option<&str>,
) -> Decimal {
    if let Some(p) = period {
        if let Some(v) = by_period.get(p) {
            return *v;
        }
    }
    default.unwrap_or(Decimal::ZERO)
}

/// Weight to use for a basis account: the period override when present,
/// otherwise the default value, otherwise zero. Never fails.
pub fn basis_value(account: &BasisAccount, period: Option<&str>) -> Decimal {
    resolve_value(account.value, &account.values_by_period, period)
}

/// Amount to distribute for a source account; same fallback rule as
/// `basis_value`.
pub fn source_value(account: &SourceAccount, period: Option<&str>) -> Decimal {
    resolve_value(account.value, &account.values_by_period, period)
}

/// Resolve each preset row against the basis catalog. Rows referencing
/// an unknown account resolve to zero weight.
pub fn preset_member_values(
    preset: &AllocationPreset,
    basis_accounts: &[BasisAccount],
    period: Option<&str>,
) -> Vec<PresetMemberValue> {
    preset
        .rows
        .iter()
        .map(|row| {
            let account = basis_accounts.iter().find(|a| a.name == row.basis_account);
            let value = account.map(|a| basis_value(a, period)).unwrap_or(Decimal::ZERO);
            PresetMemberValue {
                account: row.basis_account.clone(),
                account_name: account
                    .map(|a| a.name.clone())
                    .unwrap_or_else(|| row.basis_account.clone()),
                value,
            }
        })
        .collect()
}

pub fn preset_total(
    preset: &AllocationPreset,
    basis_accounts: &[BasisAccount],
    period: Option<&str>,
) -> Decimal {
    preset_member_values(preset, basis_accounts, period)
        .iter()
        .map(|m| m.value)
        .sum()
}

fn largest_abs_index(values: &[Decimal]) -> Option<usize> {
    let mut iter = values.iter().enumerate();
    let (mut index, first) = iter.next()?;
    let mut largest = first.abs();
    for (i, v) in iter {
        let candidate = v.abs();
        if candidate > largest {
            index = i;
            largest = candidate;
        }
    }
    Some(index)
}

/// Split `source_amount` across `basis_weights` in proportion to weight
/// share. Each rounded share is corrected so the results sum exactly to
/// the source amount; any cent residual lands on the weight with the
/// largest raw (pre-rounding) share, first occurrence winning ties.
pub fn allocate_flat(
    source_amount: Decimal,
    basis_weights: &[Decimal],
) -> Result<FlatAllocation, AllocationError> {
    if basis_weights.is_empty() {
        return Ok(FlatAllocation {
            allocations: Vec::new(),
            adjustment_index: None,
            adjustment_amount: Decimal::ZERO,
        });
    }

    let total_basis: Decimal = basis_weights.iter().sum();
    if total_basis <= Decimal::ZERO {
        return Err(AllocationError::InvalidBasis);
    }

    let raw: Vec<Decimal> = basis_weights
        .iter()
        .map(|w| *w / total_basis * source_amount)
        .collect();
    let mut allocations: Vec<Decimal> = raw.iter().map(|v| round_cents(*v)).collect();
    let rounded_total: Decimal = allocations.iter().sum();
    let difference = round_cents(source_amount - rounded_total);

    if difference.is_zero() {
        return Ok(FlatAllocation {
            allocations,
            adjustment_index: None,
            adjustment_amount: Decimal::ZERO,
        });
    }

    // Anchor the correction to the raw magnitudes so ties between
    // rounded values cannot flip the chosen index between runs.
    let mut adjustment_index = None;
    if let Some(index) = largest_abs_index(&raw) {
        allocations[index] = round_cents(allocations[index] + difference);
        adjustment_index = Some(index);
    }

    Ok(FlatAllocation {
        allocations,
        adjustment_index,
        adjustment_amount: difference,
    })
}

/// Split `source_amount` across preset groups and standalone targets.
///
/// Two passes: each preset's share of the aggregate basis is split
/// across its rows, corrected against the preset's rounded share; then
/// one global correction reconciles the combined result with the source
/// amount. Presets whose total basis is zero or negative are skipped
/// outright and contribute nothing to the output.
pub fn allocate_with_presets(
    source_amount: Decimal,
    preset_rows: &[PresetBasisRow],
    standalone: &[StandaloneWeight],
) -> Result<PresetAllocation, AllocationError> {
    // Group rows by preset, keeping first-appearance order.
    let mut order: Vec<&str> = Vec::new();
    let mut groups: HashMap<&str, Vec<&PresetBasisRow>> = HashMap::new();
    for row in preset_rows {
        let entry = groups.entry(row.preset_id.as_str()).or_default();
        if entry.is_empty() {
            order.push(row.preset_id.as_str());
        }
        entry.push(row);
    }

    let preset_basis_total: Decimal = groups
        .values()
        .map(|rows| rows.iter().map(|r| r.basis_value).sum::<Decimal>())
        .sum();
    let standalone_total: Decimal = standalone.iter().map(|s| s.basis_value).sum();
    let total_basis = preset_basis_total + standalone_total;

    if total_basis <= Decimal::ZERO {
        return Err(AllocationError::InvalidBasis);
    }

    let mut preset_allocations: Vec<PresetBreakdown> = Vec::new();
    let mut all_allocations: Vec<AllocationEntry> = Vec::new();

    for preset_id in &order {
        let rows = &groups[preset_id];
        let preset_total_basis: Decimal = rows.iter().map(|r| r.basis_value).sum();
        if preset_total_basis <= Decimal::ZERO {
            continue;
        }

        let preset_amount = source_amount * (preset_total_basis / total_basis);

        let mut row_allocations: Vec<PresetRowAllocation> = rows
            .iter()
            .map(|row| {
                let ratio = row.basis_value / preset_total_basis;
                PresetRowAllocation {
                    operation_code: row.operation_code.clone(),
                    basis_value: row.basis_value,
                    allocation: round_cents(preset_amount * ratio),
                    ratio,
                }
            })
            .collect();

        // Correct the preset's rows against its own rounded share; the
        // true source amount is reconciled once more below.
        let rounded_total: Decimal = row_allocations.iter().map(|r| r.allocation).sum();
        let preset_difference = round_cents(round_cents(preset_amount) - rounded_total);
        if !preset_difference.is_zero() {
            let rounded: Vec<Decimal> = row_allocations.iter().map(|r| r.allocation).collect();
            if let Some(i) = largest_abs_index(&rounded) {
                row_allocations[i].allocation =
                    round_cents(row_allocations[i].allocation + preset_difference);
            }
        }

        let allocated_amount: Decimal = row_allocations.iter().map(|r| r.allocation).sum();
        for row in &row_allocations {
            all_allocations.push(AllocationEntry {
                operation_code: row.operation_code.clone(),
                value: row.allocation,
                basis_value: row.basis_value,
                ratio: row.ratio,
                preset_id: Some((*preset_id).to_string()),
            });
        }
        preset_allocations.push(PresetBreakdown {
            preset_id: (*preset_id).to_string(),
            preset_name: rows[0].preset_name.clone(),
            total_basis: preset_total_basis,
            allocated_amount,
            rows: row_allocations,
        });
    }

    for weight in standalone {
        let ratio = weight.basis_value / total_basis;
        all_allocations.push(AllocationEntry {
            operation_code: weight.operation_code.clone(),
            value: round_cents(source_amount * ratio),
            basis_value: weight.basis_value,
            ratio,
            preset_id: None,
        });
    }

    let total_allocated: Decimal = all_allocations.iter().map(|a| a.value).sum();
    let global_difference = round_cents(source_amount - total_allocated);
    let mut adjustment_index = None;

    if !global_difference.is_zero() {
        let values: Vec<Decimal> = all_allocations.iter().map(|a| a.value).collect();
        if let Some(i) = largest_abs_index(&values) {
            all_allocations[i].value = round_cents(all_allocations[i].value + global_difference);
            adjustment_index = Some(i);
        }
    }

    Ok(PresetAllocation {
        allocations: all_allocations,
        adjustment_index,
        adjustment_amount: global_difference,
        preset_allocations,
    })
}
