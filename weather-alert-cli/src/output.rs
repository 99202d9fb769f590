use weather_alert_core::{HourlyTable, LocationInfo, RunReport, format_number};

const PREVIEW_ROWS: usize = 5;

pub fn print_report(report: &RunReport) {
    print_location(&report.location);
    println!();
    print_preview(&report.table);
    println!();
    println!(
        "Wrote {} hourly rows to {}; {} alert(s) raised.",
        report.table.len(),
        report.output.display(),
        report.alerts.len()
    );
}

fn print_location(location: &LocationInfo) {
    for line in location_lines(location) {
        println!("{line}");
    }
}

fn location_lines(location: &LocationInfo) -> Vec<String> {
    vec![
        format!(
            "Coordinates {}°N {}°E",
            format_number(location.latitude),
            format_number(location.longitude)
        ),
        format!("Elevation {} m asl", format_number(location.elevation)),
        format!(
            "Timezone {} {}",
            location.timezone, location.timezone_abbreviation
        ),
        format!(
            "Timezone difference to GMT+0 {} s",
            location.utc_offset_seconds
        ),
    ]
}

fn print_preview(table: &HourlyTable) {
    for line in preview_lines(table, PREVIEW_ROWS) {
        println!("{line}");
    }
}

/// Header plus the first and last `n` rows, right-aligned in columns.
fn preview_lines(table: &HourlyTable, n: usize) -> Vec<String> {
    let header: Vec<String> = table.header().iter().map(|h| h.to_string()).collect();

    let mut rows: Vec<Option<Vec<String>>> = Vec::new();
    if table.len() <= n * 2 {
        rows.extend(table.records.iter().map(|r| Some(table.row_cells(r))));
    } else {
        rows.extend(table.records[..n].iter().map(|r| Some(table.row_cells(r))));
        rows.push(None);
        rows.extend(
            table.records[table.len() - n..]
                .iter()
                .map(|r| Some(table.row_cells(r))),
        );
    }

    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows.iter().flatten() {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count().max(3));
        }
    }

    let render = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:>w$}"))
            .collect::<Vec<_>>()
            .join("  ")
    };

    let mut lines = vec![render(&header)];
    for row in &rows {
        match row {
            Some(cells) => lines.push(render(cells)),
            None => {
                let dots: Vec<String> = widths.iter().map(|_| "...".to_string()).collect();
                lines.push(render(&dots));
            }
        }
    }
    lines.push(format!("[{} rows x {} columns]", table.len(), header.len()));
    lines
}
