// CSV rendering for table and estimate downloads
use crate::domain::table::TimeSeriesTable;
use crate::domain::tube::TubeReport;

const EXPORT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

pub fn table_to_csv(table: &TimeSeriesTable) -> String {
    let mut out = String::from("time");
    for column in table.columns() {
        out.push(',');
        out.push_str(&escape(column));
    }
    out.push('\n');

    for row in table.rows() {
        out.push_str(&row.time.format(EXPORT_TIME_FORMAT).to_string());
        for value in &row.values {
            out.push(',');
            if let Some(value) = value {
                out.push_str(&value.to_string());
            }
        }
        out.push('\n');
    }
    out
}

pub fn estimates_to_csv(reports: &[TubeReport]) -> String {
    let mut out = String::from("name,target,offset,estimate,r value\n");
    for report in reports {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            escape(&report.label),
            report.estimate.target,
            report.offset,
            escape(&report.estimate.display()),
            report.estimate.confidence
        ));
    }
    out
}

fn escape(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::estimate::{Crossing, Estimate};
    use crate::domain::growth::{GrowthFit, Window};
    use crate::domain::test_support::{at, table_from_fn};

    #[test]
    fn test_table_to_csv() {
        let table = table_from_fn(2, 2, 60, |r, c| (c == 0 || r == 1).then_some(0.5 + r as f64));
        let csv = table_to_csv(&table);

        assert_eq!(
            csv,
            "time,field1,field2\n\
             2024-01-01 00:00:00-05:00,0.5,\n\
             2024-01-01 00:01:00-05:00,1.5,1.5\n"
        );
    }

    #[test]
    fn test_estimates_to_csv() {
        let fit = GrowthFit {
            origin: Some(at(0.0)),
            last_time_point: 1.0,
            window: Window::default(),
            line: None,
        };
        let reports = vec![
            TubeReport {
                index: 0,
                label: "E. coli, K12".to_string(),
                offset: 0.01,
                fit: fit.clone(),
                estimate: Estimate {
                    target: 0.8,
                    crossing: Crossing::At(at(3.5)),
                    confidence: 0.987,
                },
            },
            TubeReport {
                index: 1,
                label: "tube 2".to_string(),
                offset: 0.0,
                fit,
                estimate: Estimate {
                    target: 0.5,
                    crossing: Crossing::InsufficientData,
                    confidence: 0.0,
                },
            },
        ];

        assert_eq!(
            estimates_to_csv(&reports),
            "name,target,offset,estimate,r value\n\
             \"E. coli, K12\",0.8,0.01,2024-01-01 03:30:00,0.987\n\
             tube 2,0.5,0,none,0\n"
        );
    }
}
