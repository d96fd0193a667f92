//! Terminal output utilities.
//!
//! Provides formatting helpers for terminal output.

use crate::plan::{Operation, Plan};
use crate::Synthesis;
use colored::Colorize;

/// Format a value as a quoted, right-aligned field.
///
/// # Arguments
/// * `value` - The value to format
/// * `width` - The minimum width of the field
///
/// # Returns
/// A quoted, right-aligned string
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    let value_str = value.to_string();
    let quoted = format!("\"{value_str}\"");
    let quoted_len = quoted.len();

    if quoted_len >= width {
        quoted
    } else {
        format!("{quoted:>width$}")
    }
}

/// Most telling attribute of an operation, for one-line display.
fn detail(op: &Operation) -> String {
    ["cidr", "destination", "privateIp", "serviceName", "logDestination"]
        .iter()
        .find_map(|key| op.attributes.get(*key).and_then(|v| v.as_str()))
        .unwrap_or("")
        .to_string()
}

/// One CSV-style row per operation.
pub fn format_operation_row(step: usize, op: &Operation) -> String {
    format!(
        "{step},{kind},{id},{detail},{deps}",
        step = format_field(step, 6),
        kind = format_field(op.kind, 19),
        id = format_field(&op.logical_id, 58),
        detail = format_field(detail(op), 40),
        deps = format_field(op.depends_on.len(), 6),
    )
}

pub fn print_plan(plan: &Plan) {
    log::info!("#Start print_plan() {} operations", plan.operations.len());
    println!(
        r#" "step",             "kind",                                               "logical_id",                                 "detail", "deps""#
    );
    for (i, op) in plan.creation_order().enumerate() {
        println!("{}", format_operation_row(i + 1, op));
    }
}

/// Plan table followed by the networks and any warnings.
pub fn print_summary(synthesis: &Synthesis) {
    print_plan(&synthesis.plan);

    let topology = &synthesis.topology;
    for network in [&topology.provider, &topology.consumer] {
        println!("#{}# {network}", "NETWORK".on_blue());
    }
    println!(
        "#{}# {} -> {} via {}",
        "SERVICE".on_green(),
        topology.exposure.endpoint_service.service_name,
        topology.exposure.load_balancer.logical_id,
        topology.target.private_ip
    );
    for warning in synthesis.warnings() {
        println!("#{}# {warning}", "WARN".on_yellow());
    }
}
