//! Panel rendering
//!
//! Turns School State into the HTML snippets the page shows. Pure string
//! building; the DOM glue in `main.rs` only assigns the results. All record
//! text is escaped before it reaches `innerHTML`.

use crate::school::{Course, FeeRecord, ResultRecord, SchoolState, StaffMember, Student};
use crate::tenants::Tenant;

/// Escape text for use in element content and quoted attributes
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

/// One line of panel text (unescaped)
pub trait PanelLine {
    fn panel_line(&self) -> String;
}

impl PanelLine for Student {
    fn panel_line(&self) -> String {
        format!("{} — {} ({})", self.student_id, self.name, self.class_name)
    }
}

impl PanelLine for FeeRecord {
    fn panel_line(&self) -> String {
        format!("{} — {} on {}", self.student_id, self.amount, self.date)
    }
}

impl PanelLine for Course {
    fn panel_line(&self) -> String {
        format!("{} — {}", self.code, self.title)
    }
}

impl PanelLine for StaffMember {
    fn panel_line(&self) -> String {
        format!("{} — {}", self.name, self.role)
    }
}

impl PanelLine for ResultRecord {
    fn panel_line(&self) -> String {
        format!("{} — {}: {}", self.student_id, self.course, self.grade)
    }
}

/// `<div>` per record, or an italic placeholder when there are none
pub fn render_list<T: PanelLine>(records: &[T], empty: &str) -> String {
    if records.is_empty() {
        return format!("<i>{}</i>", escape_html(empty));
    }
    records
        .iter()
        .map(|r| format!("<div>{}</div>", escape_html(&r.panel_line())))
        .collect()
}

/// Rendered HTML for every list panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panels {
    pub students: String,
    pub fees: String,
    pub courses: String,
    pub staff: String,
    pub results: String,
}

impl Panels {
    /// `(element id, html)` pairs in page order
    pub fn by_element_id(&self) -> [(&'static str, &str); 5] {
        [
            ("studentsList", self.students.as_str()),
            ("feesList", self.fees.as_str()),
            ("coursesList", self.courses.as_str()),
            ("staffList", self.staff.as_str()),
            ("resultsList", self.results.as_str()),
        ]
    }
}

pub fn render_panels(state: &SchoolState) -> Panels {
    Panels {
        students: render_list(&state.students, "No students"),
        fees: render_list(&state.fees, "No fees"),
        courses: render_list(&state.courses, "No courses"),
        staff: render_list(&state.staff, "No staff"),
        results: render_list(&state.results, "No results"),
    }
}

/// Options for the fee and result student pickers
pub fn student_options(students: &[Student]) -> String {
    if students.is_empty() {
        return "<option value=\"\">(no students)</option>".to_string();
    }
    students
        .iter()
        .map(|s| {
            format!(
                "<option value=\"{}\">{}</option>",
                escape_html(&s.student_id),
                escape_html(&format!("{} — {}", s.student_id, s.name))
            )
        })
        .collect()
}

/// Options for the tenant picker
pub fn tenant_options(tenants: &[Tenant]) -> String {
    tenants
        .iter()
        .map(|t| {
            format!(
                "<option value=\"{}\">{}</option>",
                escape_html(&t.id),
                escape_html(&t.name)
            )
        })
        .collect()
}

/// Label next to the picker: ` (<name>)`, or nothing
pub fn current_tenant_label(tenant: Option<&Tenant>) -> String {
    tenant.map(|t| format!(" ({})", t.name)).unwrap_or_default()
}
