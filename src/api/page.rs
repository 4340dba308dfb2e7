//! HTML rendering for the entry page

use super::form::RecordForm;
use crate::excel::column_letter;
use crate::session::Preview;
use crate::types::DEFAULT_FILENAME;

/// Banner shown above the form after a submission
#[derive(Debug, Clone, PartialEq)]
pub enum Flash {
    Success(String),
    Error(String),
}

/// Everything the page needs for one render
#[derive(Debug, Clone, Default)]
pub struct PageView {
    pub form: RecordForm,
    pub flash: Option<Flash>,
    pub preview: Option<Preview>,
    pub preview_rows: usize,
}

/// Escape text for HTML element and attribute content
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the complete page
pub fn render_page(view: &PageView) -> String {
    let mut html = String::new();
    html.push_str(PAGE_HEAD);
    html.push_str("<h1>📋 Program &amp; Contract Data Entry Form</h1>\n");
    html.push_str(
        "<p class=\"info\">Files are not kept on the server. Upload an existing Excel \
         file (optional), add rows, then <strong>Download</strong> the updated file.</p>\n",
    );
    html.push_str(UPLOAD_SECTION);

    if let Some(flash) = &view.flash {
        let (class, text) = match flash {
            Flash::Success(msg) => ("success", msg),
            Flash::Error(msg) => ("error", msg),
        };
        html.push_str(&format!(
            "<p class=\"{}\">{}</p>\n",
            class,
            escape_html(text)
        ));
    }

    html.push_str(&render_form(&view.form));

    html.push_str(&format!(
        "<p><a class=\"button\" href=\"/download\" download=\"{0}\">⬇️ Download Excel ({0})</a></p>\n",
        DEFAULT_FILENAME
    ));

    if let Some(preview) = &view.preview {
        html.push_str(&render_preview(preview, view.preview_rows));
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Two-column entry form, fields in header order
fn render_form(form: &RecordForm) -> String {
    let fields = [
        ("program_name", "Program Name", "text", &form.program_name),
        ("program_code", "Program Code", "text", &form.program_code),
        ("program_budget", "Program Budget Value", "number", &form.program_budget),
        ("first_contract_name", "First Contract Name", "text", &form.first_contract_name),
        ("first_contractor_name", "First Contractor Name", "text", &form.first_contractor_name),
        ("contract_start_date", "Contract Start Date", "date", &form.contract_start_date),
        ("contract_finish_date", "Contract Finish Date", "date", &form.contract_finish_date),
        ("contract_value", "Contract Value", "number", &form.contract_value),
    ];

    let mut html = String::from("<form method=\"post\" action=\"/rows\" class=\"grid\">\n");
    for (name, label, kind, value) in fields {
        let extra = if kind == "number" {
            " min=\"0\" step=\"0.01\" placeholder=\"0.00\""
        } else {
            ""
        };
        html.push_str(&format!(
            "  <label>{label}<input type=\"{kind}\" name=\"{name}\" value=\"{value}\"{extra}></label>\n",
            label = label,
            kind = kind,
            name = name,
            value = escape_html(value),
            extra = extra,
        ));
    }
    html.push_str("  <button type=\"submit\">➕ Add Row</button>\n</form>\n");
    html
}

/// Preview table: total count plus the trailing rows
fn render_preview(preview: &Preview, limit: usize) -> String {
    let width = preview.rows.iter().map(Vec::len).max().unwrap_or(0);

    let mut html = format!(
        "<details open>\n<summary>Preview last {} rows</summary>\n\
         <p>Total rows (including header): {}</p>\n",
        limit, preview.total_rows
    );
    html.push_str("<table>\n<tr><th></th>");
    for col in 0..width {
        html.push_str(&format!("<th>{}</th>", column_letter(col)));
    }
    html.push_str("</tr>\n");

    let first_row = preview.total_rows - preview.rows.len() + 1;
    for (offset, row) in preview.rows.iter().enumerate() {
        html.push_str(&format!("<tr><th>{}</th>", first_row + offset));
        for col in 0..width {
            let text = row.get(col).map(|c| c.to_string()).unwrap_or_default();
            html.push_str(&format!("<td>{}</td>", escape_html(&text)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</table>\n</details>\n");
    html
}

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Program &amp; Contract Data Entry</title>
<style>
body { font-family: sans-serif; max-width: 48rem; margin: 2rem auto; padding: 0 1rem; }
.grid { display: grid; grid-template-columns: 1fr 1fr; gap: 0.75rem 1.5rem; }
.grid label { display: flex; flex-direction: column; font-size: 0.9rem; }
.grid button { grid-column: 1 / -1; justify-self: start; }
.info { background: #e8f0fe; padding: 0.75rem; }
.success { background: #e6f4ea; padding: 0.75rem; }
.error { background: #fce8e6; padding: 0.75rem; }
table { border-collapse: collapse; font-size: 0.85rem; }
td, th { border: 1px solid #ccc; padding: 0.25rem 0.5rem; }
</style>
</head>
<body>
"#;

const UPLOAD_SECTION: &str = r#"<section>
<label>Upload existing Excel (optional): <input type="file" id="upload" accept=".xlsx"></label>
<p class="error" id="upload-error" hidden></p>
<script>
document.getElementById("upload").addEventListener("change", async (event) => {
  const file = event.target.files[0];
  if (!file) return;
  const response = await fetch("/upload", { method: "POST", body: file });
  if (response.ok) { window.location.reload(); return; }
  const body = await response.json().catch(() => ({ error: response.statusText }));
  const banner = document.getElementById("upload-error");
  banner.textContent = body.error;
  banner.hidden = false;
});
</script>
</section>
"#;
