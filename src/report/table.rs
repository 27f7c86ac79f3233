//! Per-call CSV table

use std::path::Path;

use anyhow::{Context, Result};
use calldrop_core::{SessionVerdict, VerdictSet};
use chrono::{DateTime, Utc};

const COLUMNS: [&str; 9] = [
    "file",
    "open_time",
    "intentional",
    "in_task",
    "transfer_drop",
    "transfer_kind",
    "position",
    "close_time",
    "duration_secs",
];

/// Write one row per call, preceded by `key, value` metadata lines
pub fn write_csv(path: &Path, meta: &[(String, String)], verdicts: &VerdictSet) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to create CSV file: {:?}", path))?;

    for (key, value) in meta {
        wtr.write_record([key.as_str(), value.as_str()])?;
    }
    wtr.write_record(COLUMNS)?;

    for verdict in verdicts {
        wtr.write_record(row(verdict))?;
    }

    wtr.flush()
        .with_context(|| format!("Failed to write CSV file: {:?}", path))?;
    Ok(())
}

fn row(verdict: &SessionVerdict) -> [String; 9] {
    let v = &verdict.verdict;
    [
        verdict.id.clone(),
        timestamp(&verdict.open_time),
        v.intentional.to_string(),
        v.in_task.to_string(),
        v.transfer_drop.to_string(),
        if v.transfer_drop {
            v.transfer_kind.label().to_string()
        } else {
            String::new()
        },
        verdict.position.clone().unwrap_or_default(),
        verdict.close_time.as_ref().map(timestamp).unwrap_or_default(),
        verdict
            .duration_secs()
            .map(|s| s.to_string())
            .unwrap_or_default(),
    ]
}

fn timestamp(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use calldrop_core::{TransferKind, Verdict};
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_csv_layout() {
        let open = Utc.with_ymd_and_hms(2024, 10, 1, 6, 0, 0).unwrap();
        let verdicts = VerdictSet::from_verdicts(vec![
            SessionVerdict {
                id: "a_20241001T060000.log".to_string(),
                open_time: open,
                verdict: Verdict {
                    intentional: false,
                    in_task: true,
                    transfer_drop: true,
                    transfer_kind: TransferKind::Science,
                },
                position: Some("4430.530 N -12503.956 E".to_string()),
                close_time: Some(open + Duration::seconds(95)),
            },
            SessionVerdict {
                id: "b_20241001T070000.log".to_string(),
                open_time: open + Duration::hours(1),
                verdict: Verdict {
                    intentional: true,
                    in_task: false,
                    ..Default::default()
                },
                position: None,
                close_time: None,
            },
        ])
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deployment.csv");
        let meta = vec![("glider".to_string(), "unit_507".to_string())];
        write_csv(&path, &meta, &verdicts).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines,
            vec![
                "glider,unit_507",
                "file,open_time,intentional,in_task,transfer_drop,transfer_kind,position,close_time,duration_secs",
                "a_20241001T060000.log,2024-10-01T06:00:00Z,false,true,true,science,4430.530 N -12503.956 E,2024-10-01T06:01:35Z,95",
                "b_20241001T070000.log,2024-10-01T07:00:00Z,true,false,false,,,,",
            ]
        );
    }
}
