//! Embedded Typst templates

/// Todo List report layout - loaded from templates/todo_report.typ
pub const TODO_REPORT_TEMPLATE: &str = include_str!("../templates/todo_report.typ");

/// Path the report template reads the chart image from
pub const CHART_PATH: &str = "/chart.png";
