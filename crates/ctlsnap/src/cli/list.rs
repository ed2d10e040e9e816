//! `list` subcommand: list the controls of one or every control device.

use ctlsnap_lib::ControlRecord;
use ctlsnap_lib::descriptor::Metadata;
use ctlsnap_lib::device::PlatformDevice;
use ctlsnap_lib::enumerate;
use ctlsnap_lib::host;
use ctlsnap_lib::value::{ControlValue, ElementValue};
use serde_json::Value;

use super::{Config, Result, device, kv_width, to_json};

pub(super) fn cmd_list(device: &str, config: &Config, json: bool) -> Result<()> {
    if json {
        let out = host::list_controls(&[Value::String(device.to_string())])?;
        println!("{}", to_json(&out, config.pretty)?);
        return Ok(());
    }

    let records = enumerate::list_controls::<PlatformDevice>(device)?;
    print_records(device, &records);
    Ok(())
}

/// List every discovered card. A card that fails to open is reported and skipped.
pub(super) fn cmd_list_all(config: &Config, json: bool) -> Result<()> {
    let cards = device::enumerate_cards();

    if json {
        let mut out = serde_json::Map::new();
        for card in &cards {
            match host::list_controls(&[Value::String(card.device.clone())]) {
                Ok(records) => {
                    out.insert(card.device.clone(), records);
                }
                Err(e) => log::warn!("{}: {e}", card.device),
            }
        }
        println!("{}", to_json(&Value::Object(out), config.pretty)?);
        return Ok(());
    }

    if cards.is_empty() {
        println!("No sound cards found.");
        return Ok(());
    }

    for (i, card) in cards.iter().enumerate() {
        if i > 0 {
            println!();
        }
        match enumerate::list_controls::<PlatformDevice>(&card.device) {
            Ok(records) => print_records(&format!("{} ({})", card.device, card.name), &records),
            Err(e) => log::warn!("{}: {e}", card.device),
        }
    }
    Ok(())
}

fn print_records(label: &str, records: &[ControlRecord]) {
    println!(
        "{label}: {} control{}",
        records.len(),
        if records.len() == 1 { "" } else { "s" }
    );
    if records.is_empty() {
        return;
    }
    println!();

    let names: Vec<&str> = records.iter().map(|r| r.descriptor.name.as_str()).collect();
    let types: Vec<&str> = records
        .iter()
        .map(|r| r.descriptor.type_name.as_str())
        .collect();
    let name_w = kv_width(&names);
    let type_w = kv_width(&types);

    for r in records {
        println!("  {}", format_record(r, name_w, type_w));
    }
}

/// One table row: name, type, value, then bounds or items.
fn format_record(r: &ControlRecord, name_w: usize, type_w: usize) -> String {
    let d = &r.descriptor;
    let mut line = format!(
        "{:<name_w$}{:<type_w$}{}",
        d.name,
        d.type_name,
        format_value(r),
    );
    match &d.metadata {
        Metadata::Bounds(b) => line.push_str(&format!("  [{}..{} step {}]", b.min, b.max, b.step)),
        Metadata::Items(items) => {
            let names: Vec<&str> = items.iter().map(|i| i.as_deref().unwrap_or("?")).collect();
            line.push_str(&format!("  {{{}}}", names.join(", ")));
        }
        Metadata::None => {}
    }
    line
}

fn format_value(r: &ControlRecord) -> String {
    let items = r.descriptor.items();
    match &r.value {
        None => "-".to_string(),
        Some(ElementValue::Scalar(v)) => format_slot(v, items),
        Some(ElementValue::Sequence(values)) => {
            let slots: Vec<String> = values.iter().map(|v| format_slot(v, items)).collect();
            format!("[{}]", slots.join(", "))
        }
    }
}

fn format_slot(v: &ControlValue, items: Option<&[Option<String>]>) -> String {
    match v {
        ControlValue::Null => "null".to_string(),
        ControlValue::Boolean(true) => "on".to_string(),
        ControlValue::Boolean(false) => "off".to_string(),
        ControlValue::Number(n) => {
            let item = items
                .zip(usize::try_from(*n).ok())
                .and_then(|(items, i)| items.get(i))
                .and_then(|name| name.as_deref());
            match item {
                Some(name) => format!("{n} ({name})"),
                None => n.to_string(),
            }
        }
    }
}
