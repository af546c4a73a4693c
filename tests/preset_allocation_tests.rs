// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use prorata::allocation::{
    allocate_with_presets, preset_member_values, preset_total, AllocationError, PresetBasisRow,
    StandaloneWeight,
};
use prorata::models::{AllocationPreset, BasisAccount, PresetRow};
use rust_decimal::Decimal;
use std::collections::HashMap;

fn dec(s: &str) -> Decimal {
    Decimal::from_str_exact(s).unwrap()
}

fn row(preset: &str, op: &str, basis: &str) -> PresetBasisRow {
    PresetBasisRow {
        basis_account: format!("{}-basis", op),
        operation_code: op.to_string(),
        basis_value: dec(basis),
        preset_id: preset.to_string(),
        preset_name: format!("Preset {}", preset),
    }
}

fn standalone(op: &str, basis: &str) -> StandaloneWeight {
    StandaloneWeight {
        operation_code: op.to_string(),
        basis_value: dec(basis),
    }
}

#[test]
fn preset_and_standalone_split_exactly() {
    // Preset basis 60+40=100, standalone 30; aggregate 130. The preset's
    // outer share of 1300.00 is 1000.00, the standalone target gets 300.00.
    let rows = [row("p1", "OPS-A", "60"), row("p1", "OPS-B", "40")];
    let extra = [standalone("OPS-C", "30")];
    let result = allocate_with_presets(dec("1300.00"), &rows, &extra).unwrap();

    let values: Vec<Decimal> = result.allocations.iter().map(|a| a.value).collect();
    assert_eq!(values, vec![dec("600.00"), dec("400.00"), dec("300.00")]);
    assert_eq!(result.adjustment_index, None);
    assert!(result.adjustment_amount.is_zero());

    assert_eq!(result.preset_allocations.len(), 1);
    let breakdown = &result.preset_allocations[0];
    assert_eq!(breakdown.preset_id, "p1");
    assert_eq!(breakdown.preset_name, "Preset p1");
    assert_eq!(breakdown.total_basis, dec("100"));
    assert_eq!(breakdown.allocated_amount, dec("1000.00"));
    assert_eq!(breakdown.rows.len(), 2);
    assert_eq!(breakdown.rows[0].allocation, dec("600.00"));
    assert_eq!(breakdown.rows[1].allocation, dec("400.00"));
}

#[test]
fn preset_entries_carry_preset_id_and_standalones_do_not() {
    let rows = [row("p1", "OPS-A", "60"), row("p1", "OPS-B", "40")];
    let extra = [standalone("OPS-C", "30")];
    let result = allocate_with_presets(dec("1300.00"), &rows, &extra).unwrap();
    assert_eq!(result.allocations[0].preset_id.as_deref(), Some("p1"));
    assert_eq!(result.allocations[1].preset_id.as_deref(), Some("p1"));
    assert_eq!(result.allocations[2].preset_id, None);
}

#[test]
fn zero_basis_preset_is_skipped_silently() {
    let rows = [
        row("dead", "OPS-A", "0"),
        row("dead", "OPS-B", "0"),
        row("live", "OPS-C", "1"),
    ];
    let result = allocate_with_presets(dec("50.00"), &rows, &[]).unwrap();

    assert_eq!(result.preset_allocations.len(), 1);
    assert_eq!(result.preset_allocations[0].preset_id, "live");
    assert_eq!(result.allocations.len(), 1);
    assert_eq!(result.allocations[0].operation_code, "OPS-C");
    assert_eq!(result.allocations[0].value, dec("50.00"));
}

#[test]
fn all_zero_basis_fails() {
    let rows = [row("p1", "OPS-A", "0"), row("p1", "OPS-B", "0")];
    let err = allocate_with_presets(dec("100.00"), &rows, &[]).unwrap_err();
    assert_eq!(err, AllocationError::InvalidBasis);

    let err = allocate_with_presets(dec("100.00"), &[], &[standalone("OPS-A", "0")]).unwrap_err();
    assert_eq!(err, AllocationError::InvalidBasis);
}

#[test]
fn preset_rows_corrected_against_rounded_outer_share() {
    // One preset of equal thirds: rows round to 33.33 each against an
    // outer share of 100.00, so the first (largest-rounded tie) row
    // picks up the cent inside the preset, before any global step.
    let rows = [
        row("p1", "OPS-A", "1"),
        row("p1", "OPS-B", "1"),
        row("p1", "OPS-C", "1"),
    ];
    let result = allocate_with_presets(dec("100.00"), &rows, &[]).unwrap();

    let values: Vec<Decimal> = result.allocations.iter().map(|a| a.value).collect();
    assert_eq!(values, vec![dec("33.34"), dec("33.33"), dec("33.33")]);
    // The preset-local fix already reconciles the total.
    assert_eq!(result.adjustment_index, None);
    assert_eq!(result.preset_allocations[0].allocated_amount, dec("100.00"));
}

#[test]
fn global_correction_lands_on_largest_combined_allocation() {
    // Standalone-only equal thirds leave a one-cent residual that only
    // the global pass can absorb.
    let extra = [
        standalone("OPS-A", "1"),
        standalone("OPS-B", "1"),
        standalone("OPS-C", "1"),
    ];
    let result = allocate_with_presets(dec("100.00"), &[], &extra).unwrap();
    let values: Vec<Decimal> = result.allocations.iter().map(|a| a.value).collect();
    assert_eq!(values, vec![dec("33.34"), dec("33.33"), dec("33.33")]);
    assert_eq!(result.adjustment_index, Some(0));
    assert_eq!(result.adjustment_amount, dec("0.01"));
}

#[test]
fn per_preset_rounding_can_leave_global_residual() {
    // Two single-row presets each rounding a .005 share up: the preset
    // pass cannot see the combined overshoot, so the global pass pulls
    // one cent back from the first row.
    let rows = [row("p1", "OPS-A", "1"), row("p2", "OPS-B", "1")];
    let result = allocate_with_presets(dec("100.01"), &rows, &[]).unwrap();

    let total: Decimal = result.allocations.iter().map(|a| a.value).sum();
    assert_eq!(total, dec("100.01"));
    assert_eq!(result.adjustment_index, Some(0));
    assert_eq!(result.adjustment_amount, dec("-0.01"));
    let values: Vec<Decimal> = result.allocations.iter().map(|a| a.value).collect();
    assert_eq!(values, vec![dec("50.00"), dec("50.01")]);
}

#[test]
fn groups_keep_first_appearance_order() {
    let rows = [
        row("p1", "OPS-A", "10"),
        row("p2", "OPS-B", "10"),
        row("p1", "OPS-C", "20"),
    ];
    let result = allocate_with_presets(dec("400.00"), &rows, &[]).unwrap();

    assert_eq!(result.preset_allocations[0].preset_id, "p1");
    assert_eq!(result.preset_allocations[1].preset_id, "p2");
    let ops: Vec<&str> = result
        .allocations
        .iter()
        .map(|a| a.operation_code.as_str())
        .collect();
    // p1 rows stay contiguous in row order, then p2.
    assert_eq!(ops, vec!["OPS-A", "OPS-C", "OPS-B"]);
    let values: Vec<Decimal> = result.allocations.iter().map(|a| a.value).collect();
    assert_eq!(values, vec![dec("100.00"), dec("200.00"), dec("100.00")]);
}

#[test]
fn sum_preserved_for_awkward_mixes() {
    let rows = [
        row("p1", "OPS-A", "1"),
        row("p1", "OPS-B", "1"),
        row("p1", "OPS-C", "1"),
        row("p2", "OPS-D", "7"),
        row("p2", "OPS-E", "11"),
    ];
    let extra = [standalone("OPS-F", "3"), standalone("OPS-G", "13")];
    for amount in ["100.00", "0.07", "999.99", "-250.37"] {
        let amount = dec(amount);
        let result = allocate_with_presets(amount, &rows, &extra).unwrap();
        let total: Decimal = result.allocations.iter().map(|a| a.value).sum();
        assert_eq!(total, amount, "sum drifted for {}", amount);
    }
}

#[test]
fn repeated_calls_are_identical() {
    let rows = [
        row("p1", "OPS-A", "1"),
        row("p1", "OPS-B", "1"),
        row("p2", "OPS-C", "7"),
    ];
    let extra = [standalone("OPS-D", "3")];
    let first = allocate_with_presets(dec("999.99"), &rows, &extra).unwrap();
    for _ in 0..10 {
        let again = allocate_with_presets(dec("999.99"), &rows, &extra).unwrap();
        assert_eq!(again, first);
    }
}

#[test]
fn member_values_resolve_against_catalog() {
    let accounts = vec![
        BasisAccount {
            id: 1,
            name: "Headcount".into(),
            value: Some(dec("25")),
            values_by_period: HashMap::from([("2025-06".to_string(), dec("30"))]),
        },
        BasisAccount {
            id: 2,
            name: "SqFt".into(),
            value: Some(dec("1200")),
            values_by_period: HashMap::new(),
        },
    ];
    let preset = AllocationPreset {
        id: 9,
        name: "Facilities".into(),
        rows: vec![
            PresetRow {
                basis_account: "Headcount".into(),
                operation_code: "OPS-A".into(),
            },
            PresetRow {
                basis_account: "SqFt".into(),
                operation_code: "OPS-B".into(),
            },
            PresetRow {
                basis_account: "Missing".into(),
                operation_code: "OPS-C".into(),
            },
        ],
        note: None,
    };

    let members = preset_member_values(&preset, &accounts, Some("2025-06"));
    assert_eq!(members.len(), 3);
    assert_eq!(members[0].value, dec("30"));
    assert_eq!(members[1].value, dec("1200"));
    // Unknown accounts contribute zero weight rather than failing.
    assert_eq!(members[2].value, Decimal::ZERO);

    assert_eq!(preset_total(&preset, &accounts, Some("2025-06")), dec("1230"));
    assert_eq!(preset_total(&preset, &accounts, None), dec("1225"));
}
