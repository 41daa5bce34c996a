use crate::binding::FeatureStatus;
use crate::report::{AttributeReport, StatusReport};
use colored::{ColoredString, Colorize};

const LABEL_W: usize = 26;

fn status_label(status: FeatureStatus) -> ColoredString {
    match status {
        FeatureStatus::Known => "known".green(),
        FeatureStatus::Unknown => "unknown".yellow(),
        FeatureStatus::Degraded => "degraded".red().bold(),
        FeatureStatus::Unsupported => "unsupported".dimmed(),
    }
}

pub fn print_platform_summary(report: &StatusReport) {
    let mut rows: Vec<(&str, String)> = Vec::new();
    match &report.identity {
        Some(id) => {
            rows.push(("Vendor", id.vendor.clone()));
            rows.push(("Product", id.product.clone()));
            rows.push(("Board", id.board.clone()));
        }
        None => rows.push(("Identity", "Unreadable".to_string())),
    }
    rows.push(("Model", report.platform.clone()));
    let caps: Vec<String> = report
        .capabilities
        .iter()
        .map(|c| c.as_str().to_string())
        .collect();
    rows.push((
        "Capabilities",
        if caps.is_empty() {
            "None".to_string()
        } else {
            caps.join(", ")
        },
    ));
    rows.push(("Transport", report.transport.clone()));

    // Box width from content
    let inner_w = rows
        .iter()
        .map(|(l, v)| l.len().max(LABEL_W) + 2 + v.len())
        .max()
        .unwrap_or(40);

    let title = "Platform";
    let fill = inner_w.saturating_sub(1 + title.len());
    println!("╭─ {} {}╮", title.bold(), "─".repeat(fill));

    for (label, value) in &rows {
        let padded = format!("{:<w$}", label, w = LABEL_W);
        let pad = inner_w.saturating_sub(LABEL_W + 2 + value.len());
        println!("│ {}  {}{} │", padded.dimmed(), value, " ".repeat(pad));
    }

    println!("╰{}╯", "─".repeat(inner_w + 2));
}

pub fn print_attributes(attributes: &[AttributeReport]) {
    let title = format!("Attributes ({})", attributes.len());
    let divider_w: usize = 64;
    let fill = divider_w.saturating_sub(2 + title.len());
    println!("── {} {}", title.bold(), "─".repeat(fill));

    for attr in attributes {
        let name = format!("{:<w$}", attr.name, w = LABEL_W);
        let access = if attr.writable { "rw" } else { "ro" };
        let detail = match (&attr.value, &attr.error) {
            (Some(value), _) => value.normal(),
            (None, Some(err)) => err.red(),
            (None, None) => "".normal(),
        };
        println!(
            "  {} {}  {:<11} {}",
            name,
            access.dimmed(),
            status_label(attr.status),
            detail
        );
    }

    println!("{}", "─".repeat(divider_w));
}

pub fn print_status(report: &StatusReport) {
    print_platform_summary(report);
    println!();
    print_attributes(&report.attributes);

    let degraded: Vec<&str> = report
        .attributes
        .iter()
        .filter(|a| a.status == FeatureStatus::Degraded)
        .map(|a| a.name.as_str())
        .collect();
    if !degraded.is_empty() {
        println!(
            "  {} firmware did not confirm: {}",
            "Warning:".yellow().bold(),
            degraded.join(", ")
        );
    }
}

pub fn print_json<T: serde::Serialize>(value: &T) -> serde_json::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
