//! HTML fragments rendered inside the tooltip surface.

use chrono::NaiveDateTime;

use crate::models::RecordDetails;

/// Placeholder for values the backend did not provide.
pub const NO_DATA: &str = "Нет данных";

/// Header fallback when the record has no class name.
const DEFAULT_TITLE: &str = "Запись";

/// Loading indicator shown while details are being fetched.
pub fn loading() -> String {
    r#"<div class="record-tooltip-loading"><i class="bi bi-hourglass-split me-2"></i>Загрузка данных...</div>"#
        .to_string()
}

/// Error box with a failure reason.
pub fn error(reason: &str) -> String {
    format!(
        r#"
    <div class="record-tooltip-error">
        <i class="bi bi-exclamation-triangle-fill me-2"></i>
        Ошибка при получении данных: {}
    </div>
    "#,
        html_escape(reason)
    )
}

/// Full record details: header, data rows and deep links.
pub fn record_details(details: &RecordDetails) -> String {
    let title = known(details.mssql_sxclass_name.as_deref()).unwrap_or(DEFAULT_TITLE);

    let mut content = format!(
        r#"
    <div class="record-tooltip-header">{} — Детальная информация</div>
    "#,
        html_escape(title)
    );

    content.push_str(&row("Дата создания", details.created_date.as_deref()));
    content.push_str(&row("Создал", details.created_by.as_deref()));
    content.push_str(&row("Дата изменения", details.modified_date.as_deref()));
    content.push_str(&row("Изменил", details.modified_by.as_deref()));
    content.push_str(&row("Пути папок в консоли", details.folder_paths.as_deref()));

    let has_objects = if details.has_objects() { "Да" } else { "Нет" };
    content.push_str(&row("Наличие объектов", Some(has_objects)));
    content.push_str(&row("Количество объектов", details.object_count.as_deref()));
    content.push_str(&row(
        "Дата создания последнего объекта",
        details.last_object_created.as_deref(),
    ));
    content.push_str(&row(
        "Дата последнего изменения",
        details.last_object_modified.as_deref(),
    ));

    let links = links(details);
    if !links.is_empty() {
        content.push_str(&format!(
            r#"
    <div class="record-tooltip-row">
        <div class="record-tooltip-label">Ссылки:</div>
        <div class="record-tooltip-value">{}</div>
    </div>
    "#,
            links
        ));
    }

    content
}

/// One label/value row.
fn row(label: &str, value: Option<&str>) -> String {
    let value = known(value)
        .map(format_value)
        .unwrap_or_else(|| NO_DATA.to_string());

    format!(
        r#"
    <div class="record-tooltip-row">
        <div class="record-tooltip-label">{}:</div>
        <div class="record-tooltip-value">{}</div>
    </div>
    "#,
        label,
        html_escape(&value)
    )
}

/// Deep links into the source system's admin UI.
fn links(details: &RecordDetails) -> String {
    let Some(base_url) = known(details.base_url.as_deref()) else {
        return String::new();
    };

    let mut links = String::new();

    if let Some(ouid) = known(details.a_ouid.as_deref()) {
        let url = format!(
            "{}admin/edit.htm?id={}%40SXClass",
            base_url,
            urlencoding::encode(ouid)
        );
        links.push_str(&format!(
            r#"<div><a href="{}" target="_blank" class="btn btn-sm btn-outline-primary mt-1"><i class="bi bi-box-arrow-up-right"></i> Перейти к объекту</a></div>"#,
            html_escape(&url)
        ));
    }

    if let Some(name) = known(details.mssql_sxclass_name.as_deref()) {
        let url = format!(
            "{}admin/objectsofclass.htm?cls={}",
            base_url,
            urlencoding::encode(name)
        );
        links.push_str(&format!(
            r#"<div><a href="{}" target="_blank" class="btn btn-sm btn-outline-info mt-1"><i class="bi bi-boxes"></i> Объекты класса</a></div>"#,
            html_escape(&url)
        ));
    }

    links
}

/// Filter out empty values and the textual nulls some uploads contain.
fn known(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !matches!(*v, "null" | "undefined" | "None" | NO_DATA))
}

/// ISO datetimes are shown as `YYYY-MM-DD HH:MM:SS`, everything else verbatim.
fn format_value(value: &str) -> String {
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| value.to_string())
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Tooltip styles. Only `position`, `display` and the size bounds affect
/// placement; the rest is presentation.
pub const TOOLTIP_CSS: &str = r#"
.record-tooltip {
    position: absolute;
    display: none;
    background-color: #ffffff;
    border: 2px solid #007bff;
    border-radius: 6px;
    box-shadow: 0 4px 15px rgba(0, 0, 0, 0.3);
    padding: 15px;
    z-index: 1000;
    min-width: 350px;
    max-width: 500px;
    font-size: 0.9rem;
    opacity: 0;
    transition: opacity 0.2s ease;
    color: #333333;
    font-family: Arial, sans-serif;
}

.record-tooltip.visible {
    display: block;
    opacity: 1;
}

.record-tooltip-header {
    font-weight: bold;
    margin-bottom: 10px;
    padding-bottom: 8px;
    border-bottom: 1px solid #dee2e6;
    font-size: 16px;
    color: #000000;
    text-align: center;
}

.record-tooltip-row {
    display: flex;
    margin-bottom: 8px;
    padding-bottom: 4px;
    border-bottom: 1px dotted #eeeeee;
}

.record-tooltip-label {
    flex: 0 0 45%;
    font-weight: 600;
    color: #495057;
    font-size: 14px;
    padding-right: 10px;
}

.record-tooltip-value {
    flex: 0 0 55%;
    word-break: break-word;
    color: #212529;
    font-size: 14px;
}

.record-tooltip-loading {
    text-align: center;
    padding: 15px;
    color: #6c757d;
    font-size: 14px;
    font-weight: 500;
}

.record-tooltip-error {
    color: #dc3545;
    text-align: center;
    padding: 15px;
    font-size: 14px;
    font-weight: 500;
    background-color: #f8d7da;
    border-radius: 4px;
}

.record-tooltip .btn {
    padding: 3px 8px;
    font-size: 12px;
    margin-right: 5px;
    text-decoration: none;
    display: inline-block;
    margin-bottom: 4px;
}

.record-tooltip .btn-outline-primary {
    color: #007bff;
    border-color: #007bff;
}

.record-tooltip .btn-outline-primary:hover {
    color: #fff;
    background-color: #007bff;
}

.record-tooltip .btn-outline-info {
    color: #17a2b8;
    border-color: #17a2b8;
}

.record-tooltip .btn-outline-info:hover {
    color: #fff;
    background-color: #17a2b8;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    fn details() -> RecordDetails {
        RecordDetails {
            mssql_sxclass_name: Some("Foo".to_string()),
            created_date: Some("2024-01-01".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_record_details_header_and_created_date() {
        let html = record_details(&details());
        assert!(html.contains("Foo — Детальная информация"));
        assert!(html.contains(
            r#"<div class="record-tooltip-label">Дата создания:</div>
        <div class="record-tooltip-value">2024-01-01</div>"#
        ));
    }

    #[test]
    fn test_missing_values_render_placeholder() {
        let html = record_details(&RecordDetails {
            created_by: Some("null".to_string()),
            ..Default::default()
        });
        assert!(html.contains("Запись — Детальная информация"));
        assert!(html.contains(
            r#"<div class="record-tooltip-label">Создал:</div>
        <div class="record-tooltip-value">Нет данных</div>"#
        ));
        assert!(html.contains(
            r#"<div class="record-tooltip-label">Наличие объектов:</div>
        <div class="record-tooltip-value">Нет</div>"#
        ));
        assert!(!html.contains("Ссылки:"));
    }

    #[test]
    fn test_iso_datetime_is_reformatted() {
        assert_eq!(format_value("2024-03-05T14:07:09"), "2024-03-05 14:07:09");
        assert_eq!(format_value("2024-03-05T14:07:09.123"), "2024-03-05 14:07:09");
        assert_eq!(format_value("2024-03-05"), "2024-03-05");
        assert_eq!(format_value("Иванов"), "Иванов");
    }

    #[test]
    fn test_links_row() {
        let mut d = details();
        d.base_url = Some("https://sx.example/".to_string());
        d.a_ouid = Some("1001".to_string());
        d.object_count = Some("5".to_string());

        let html = record_details(&d);
        assert!(html.contains("Ссылки:"));
        assert!(html.contains("https://sx.example/admin/edit.htm?id=1001%40SXClass"));
        assert!(html.contains("https://sx.example/admin/objectsofclass.htm?cls=Foo"));
        assert!(html.contains(
            r#"<div class="record-tooltip-label">Наличие объектов:</div>
        <div class="record-tooltip-value">Да</div>"#
        ));
    }

    #[test]
    fn test_values_are_escaped() {
        let html = record_details(&RecordDetails {
            mssql_sxclass_name: Some("<script>".to_string()),
            ..Default::default()
        });
        assert!(html.contains("&lt;script&gt; — Детальная информация"));
        assert!(!html.contains("<script>"));

        assert!(error("a & b").contains("Ошибка при получении данных: a &amp; b"));
    }

    #[test]
    fn test_stylesheet_covers_link_buttons() {
        for class in ["btn-outline-primary", "btn-outline-info"] {
            assert!(TOOLTIP_CSS.contains(&format!(".record-tooltip .{} {{", class)));
            assert!(TOOLTIP_CSS.contains(&format!(".record-tooltip .{}:hover {{", class)));
        }
    }

    #[test]
    fn test_loading() {
        assert!(loading().contains("Загрузка данных..."));
    }
}
