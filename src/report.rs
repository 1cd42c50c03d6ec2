//! One-page wind zone report for a located point.

use std::path::Path;

use clap::ValueEnum;

use crate::error::ExportError;
use crate::geography::locate::LookupResult;

pub const REPORT_TITLE: &str = "NBC Wind Zone Report";
pub const DEFAULT_REPORT_FILE: &str = "NBC_Wind_Zone_Report.txt";

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl ReportFormat {
    /// JSON for a `.json` extension in any case, text otherwise.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ReportFormat::Json,
            _ => ReportFormat::Text,
        }
    }
}

/// Renders the report for `result`; `None` means nothing has been selected yet.
pub fn render(result: Option<&LookupResult>, format: ReportFormat) -> Result<String, ExportError> {
    let result = result.ok_or(ExportError::NoResult)?;
    match format {
        ReportFormat::Text => Ok(render_text(result)),
        ReportFormat::Json => Ok(serde_json::to_string_pretty(result)?),
    }
}

fn render_text(result: &LookupResult) -> String {
    let rows = [
        ("Wind Zone", result.zone_id.clone()),
        ("Basic Wind Speed", format!("{} m/s", result.wind_speed_mps)),
        ("Standard", result.standard_ref.clone()),
        ("Latitude", result.latitude_text()),
        ("Longitude", result.longitude_text()),
    ];

    let mut document = format!("{REPORT_TITLE}\n{}\n\n", "=".repeat(REPORT_TITLE.len()));
    for (label, value) in rows {
        document.push_str(&format!("{:<18}{value}\n", format!("{label}:")));
    }
    document
}

/// Renders and writes the report, returning the rendered document.
pub fn export(
    result: Option<&LookupResult>,
    format: ReportFormat,
    path: &Path,
) -> Result<String, ExportError> {
    let document = render(result, format)?;
    std::fs::write(path, &document).map_err(|source| ExportError::Io {
        path: path.to_owned(),
        source,
    })?;
    tracing::info!("Wrote {format:?} report to {}", path.display());
    Ok(document)
}
