pub mod formatter;
pub mod report;

pub use formatter::{
    format_duration_hours, format_errors, format_label, format_result_detail,
    format_results_table, format_score, format_summary, format_tsv, should_use_colors,
};
pub use report::{to_json, write_json_report, Report};
