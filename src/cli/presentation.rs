//! Presentation: plan and dirty-state formatters for the CLI.

use crate::embedding::EmbeddingPlan;
use crate::error::EmbedError;
use crate::frame::SurfaceOp;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde_json::json;

fn surface_op_row(op: &SurfaceOp) -> Vec<String> {
    match op {
        SurfaceOp::CreateFrame { id, name, src, .. } => vec![
            "create frame".to_string(),
            format!(
                "id={} name={} src={}",
                id,
                name,
                src.as_ref().map(|u| u.as_str()).unwrap_or("(empty)")
            ),
        ],
        SurfaceOp::DestroyFrame { id, .. } => vec!["destroy frame".to_string(), id.clone()],
        SurfaceOp::RenameFrame { from, to } => {
            vec!["rename frame".to_string(), format!("{} -> {}", from, to)]
        }
        SurfaceOp::Attached { container } => vec!["attached".to_string(), container.to_string()],
        SurfaceOp::SubmitForm { form, .. } => vec![
            "submit form".to_string(),
            format!("{} {} -> {}", form.method, form.action, form.target),
        ],
    }
}

pub fn format_plan_text(plan: &EmbeddingPlan, ops: &[SurfaceOp]) -> String {
    let mut out = String::new();
    match plan {
        EmbeddingPlan::Navigate { url } => {
            out.push_str("Path: navigation\n");
            out.push_str(&format!("Target: {}\n\n", url));
        }
        EmbeddingPlan::FormPost { form } => {
            out.push_str("Path: form submission\n");
            out.push_str(&format!("Action: {}\n", form.action));
            out.push_str(&format!("Target frame: {}\n\n", form.target));
            let mut table = Table::new();
            table.load_preset(UTF8_BORDERS_ONLY);
            table.set_header(vec!["Field", "Value"]);
            for field in &form.fields {
                table.add_row(vec![field.name.clone(), field.value.clone()]);
            }
            out.push_str(&format!("{}\n\n", table));
        }
    }

    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Step", "Detail"]);
    for op in ops {
        table.add_row(surface_op_row(op));
    }
    out.push_str(&format!("{}", table));
    out
}

pub fn format_plan_json(plan: &EmbeddingPlan, ops: &[SurfaceOp]) -> Result<String, EmbedError> {
    let steps: Vec<_> = ops
        .iter()
        .map(|op| {
            let row = surface_op_row(op);
            json!({ "step": row[0], "detail": row[1] })
        })
        .collect();
    let out = json!({ "plan": plan, "steps": steps });
    Ok(serde_json::to_string_pretty(&out)?)
}

pub fn format_dirty_entries_text(entries: &[(String, String)]) -> String {
    if entries.is_empty() {
        return "No dirty-state entries.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Key", "State"]);
    for (key, state) in entries {
        table.add_row(vec![key.clone(), state.clone()]);
    }
    format!("{}\n\nTotal: {} entr{}", table, entries.len(), if entries.len() == 1 { "y" } else { "ies" })
}

pub fn format_dirty_entries_json(entries: &[(String, String)]) -> Result<String, EmbedError> {
    let list: Vec<_> = entries
        .iter()
        .map(|(key, state)| json!({ "key": key, "state": state }))
        .collect();
    Ok(serde_json::to_string_pretty(&json!({ "entries": list }))?)
}
