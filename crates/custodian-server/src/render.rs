//! Read-only asset summary page

use custodian_model::Asset;

/// Placeholder for absent values
const MISSING: &str = "&mdash;";

/// Escape text for HTML element content and attribute values
#[must_use]
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

fn field(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map_or_else(|| MISSING.to_string(), escape_html)
}

/// Render the summary shown to anyone scanning an asset's code
#[must_use]
pub fn render_asset_page(asset: &Asset) -> String {
    let details = &asset.details;
    let tag = escape_html(&asset.asset_tag);
    let name = field(Some(details.name.as_str()));
    let category = details
        .category_name
        .as_deref()
        .or(details.category_id.as_deref());
    let location = details
        .location_name
        .as_deref()
        .or(details.location_id.as_deref());
    let created = asset.created_at.to_rfc3339();

    let rows = [
        ("Asset Tag", tag.clone()),
        ("Name", name.clone()),
        ("Serial Number", field(details.serial_number.as_deref())),
        ("Category", field(category)),
        ("Location", field(location)),
        ("Assigned To", field(asset.assigned_user_name())),
        ("Status", field(Some(asset.status.as_str()))),
        ("Created At", field(Some(created.as_str()))),
    ];

    let list: String = rows
        .iter()
        .map(|(label, value)| format!("      <dt>{label}</dt><dd>{value}</dd>\n"))
        .collect();

    format!(
        r#"<!doctype html>
<html>
<head>
<meta charset="utf-8"/>
<title>Asset {tag}</title>
<meta name="viewport" content="width=device-width,initial-scale=1"/>
<style>
  body{{font-family:system-ui,-apple-system,Segoe UI,Roboto,Arial;margin:0;padding:24px;background:#f7fafc;color:#111}}
  .card{{background:#fff;border-radius:8px;padding:18px;box-shadow:0 4px 14px rgba(0,0,0,0.08);max-width:720px;margin:24px auto}}
  h1{{margin:0 0 8px 0;font-size:20px}}
  dt{{font-weight:600;color:#4b5563}}
  dd{{margin:4px 0 12px 0}}
</style>
</head>
<body>
  <div class="card">
    <h1>{name} &mdash; {tag}</h1>
    <dl>
{list}    </dl>
  </div>
</body>
</html>
"#
    )
}
