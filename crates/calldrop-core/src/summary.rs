//! Aggregator: pure reduction of a verdict set into counts and rates.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::batch::{SessionVerdict, VerdictSet};
use crate::classifier::TransferKind;
use crate::error::{AnalysisError, Result};

/// Transfer drops split by file kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindCounts {
    pub flight: usize,
    pub science: usize,
    pub other: usize,
    /// Transfer drops with no transfer marker to classify
    pub indeterminate: usize,
}

impl KindCounts {
    fn add(&mut self, kind: TransferKind) {
        match kind {
            TransferKind::Flight => self.flight += 1,
            TransferKind::Science => self.science += 1,
            TransferKind::Other => self.other += 1,
            TransferKind::None => self.indeterminate += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.flight + self.science + self.other + self.indeterminate
    }

    /// Percentages relative to `total()`
    pub fn rates(&self) -> KindRates {
        let total = self.total();
        KindRates {
            flight: percent(self.flight, total),
            science: percent(self.science, total),
            other: percent(self.other, total),
            indeterminate: percent(self.indeterminate, total),
        }
    }
}

/// Transfer-kind percentages of one bucket
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KindRates {
    pub flight: f64,
    pub science: f64,
    pub other: f64,
    pub indeterminate: f64,
}

/// Drop / intentional split of one conditioning bucket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketCounts {
    pub calls: usize,
    pub drops: usize,
    pub intentional: usize,
    pub transfer_drops: usize,
    pub kinds: KindCounts,
}

impl BucketCounts {
    fn add(&mut self, verdict: &SessionVerdict) {
        self.calls += 1;
        if verdict.verdict.intentional {
            self.intentional += 1;
        } else {
            self.drops += 1;
            if verdict.verdict.transfer_drop {
                self.transfer_drops += 1;
                self.kinds.add(verdict.verdict.transfer_kind);
            }
        }
    }

    /// Drops plus intentional ends must cover every call of the bucket
    fn check(&self, bucket: &'static str) -> Result<()> {
        if self.drops + self.intentional != self.calls {
            return Err(AnalysisError::CountMismatch {
                bucket,
                drops: self.drops,
                intentional: self.intentional,
                total: self.calls,
            });
        }
        Ok(())
    }

    pub fn drop_rate(&self) -> f64 {
        percent(self.drops, self.calls)
    }

    pub fn intentional_rate(&self) -> f64 {
        percent(self.intentional, self.calls)
    }

    /// Transfer drops as a share of this bucket's drops
    pub fn transfer_drop_rate(&self) -> f64 {
        percent(self.transfer_drops, self.drops)
    }
}

/// A numeric statistic
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatValue {
    Count(usize),
    /// Percentage, already scaled by 100
    Percent(f64),
    Days(f64),
    Seconds(f64),
}

impl StatValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            StatValue::Count(n) => n as f64,
            StatValue::Percent(v) | StatValue::Days(v) | StatValue::Seconds(v) => v,
        }
    }
}

impl Serialize for StatValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match *self {
            StatValue::Count(n) => serializer.serialize_u64(n as u64),
            StatValue::Percent(v) | StatValue::Days(v) | StatValue::Seconds(v) => {
                serializer.serialize_f64(v)
            }
        }
    }
}

/// Deployment-level statistics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    /// Every call
    pub overall: BucketCounts,
    /// Calls spent entirely in the autonomous task
    pub in_task: BucketCounts,
    /// Calls that showed the interactive prompt
    pub not_in_task: BucketCounts,
    /// Runs of consecutive calls sharing a GPS fix
    pub surfacings: usize,
    /// Calls with an estimated close time
    pub timed_calls: usize,
    /// Mean estimated call length over timed calls
    pub mean_call_secs: f64,
    /// Days between the first and last call opening
    pub span_days: f64,
}

impl Summary {
    /// Flat list of named statistics, in report order
    pub fn statistics(&self) -> Vec<(String, StatValue)> {
        use StatValue::{Count, Days, Percent, Seconds};

        let mut stats: Vec<(String, StatValue)> = vec![
            ("total_calls".into(), Count(self.overall.calls)),
            ("drops".into(), Count(self.overall.drops)),
            ("intentional".into(), Count(self.overall.intentional)),
            ("in_task_calls".into(), Count(self.in_task.calls)),
            ("not_in_task_calls".into(), Count(self.not_in_task.calls)),
            ("in_task_drops".into(), Count(self.in_task.drops)),
            ("in_task_intentional".into(), Count(self.in_task.intentional)),
            ("not_in_task_drops".into(), Count(self.not_in_task.drops)),
            (
                "not_in_task_intentional".into(),
                Count(self.not_in_task.intentional),
            ),
            ("transfer_drops".into(), Count(self.overall.transfer_drops)),
            (
                "in_task_transfer_drops".into(),
                Count(self.in_task.transfer_drops),
            ),
            (
                "not_in_task_transfer_drops".into(),
                Count(self.not_in_task.transfer_drops),
            ),
        ];

        let buckets = [
            ("", &self.overall),
            ("in_task_", &self.in_task),
            ("not_in_task_", &self.not_in_task),
        ];

        for (prefix, bucket) in buckets {
            let kinds = bucket.kinds;
            stats.push((format!("{prefix}flight_transfer_drops"), Count(kinds.flight)));
            stats.push((format!("{prefix}science_transfer_drops"), Count(kinds.science)));
            stats.push((format!("{prefix}other_transfer_drops"), Count(kinds.other)));
            stats.push((
                format!("{prefix}indeterminate_transfer_drops"),
                Count(kinds.indeterminate),
            ));
        }

        stats.extend([
            ("intentional_pct".into(), Percent(self.overall.intentional_rate())),
            ("drop_pct".into(), Percent(self.overall.drop_rate())),
            ("in_task_drop_pct".into(), Percent(self.in_task.drop_rate())),
            (
                "in_task_intentional_pct".into(),
                Percent(self.in_task.intentional_rate()),
            ),
            (
                "not_in_task_drop_pct".into(),
                Percent(self.not_in_task.drop_rate()),
            ),
            (
                "not_in_task_intentional_pct".into(),
                Percent(self.not_in_task.intentional_rate()),
            ),
            (
                "transfer_drop_pct".into(),
                Percent(self.overall.transfer_drop_rate()),
            ),
        ]);

        for (prefix, bucket) in buckets {
            let rates = bucket.kinds.rates();
            stats.push((format!("{prefix}flight_transfer_pct"), Percent(rates.flight)));
            stats.push((format!("{prefix}science_transfer_pct"), Percent(rates.science)));
            stats.push((format!("{prefix}other_transfer_pct"), Percent(rates.other)));
            stats.push((
                format!("{prefix}indeterminate_transfer_pct"),
                Percent(rates.indeterminate),
            ));
        }

        stats.extend([
            ("surfacings".into(), Count(self.surfacings)),
            ("timed_calls".into(), Count(self.timed_calls)),
            ("mean_call_secs".into(), Seconds(self.mean_call_secs)),
            ("span_days".into(), Days(self.span_days)),
        ]);

        stats
    }

    /// Look up one statistic by name
    pub fn get(&self, name: &str) -> Option<StatValue> {
        self.statistics()
            .into_iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// Serializes as a flat `name -> number` map
impl Serialize for Summary {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let stats = self.statistics();
        let mut map = serializer.serialize_map(Some(stats.len()))?;
        for (name, value) in &stats {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Reduce a verdict set to deployment statistics.
///
/// Pure: the same set always yields the same summary. Empty sets and empty
/// buckets give zero rates.
pub fn summarize(verdicts: &VerdictSet) -> Result<Summary> {
    let mut summary = Summary::default();
    let mut total_secs: i64 = 0;
    let mut last_fix: Option<&str> = None;

    for verdict in verdicts {
        if verdict.verdict.intentional && verdict.verdict.transfer_drop {
            return Err(AnalysisError::Consistency {
                id: verdict.id.clone(),
                detail: "verdict is both intentional and a transfer drop".to_string(),
            });
        }

        summary.overall.add(verdict);
        if verdict.verdict.in_task {
            summary.in_task.add(verdict);
        } else {
            summary.not_in_task.add(verdict);
        }

        if let Some(fix) = verdict.position.as_deref() {
            if last_fix != Some(fix) {
                summary.surfacings += 1;
                last_fix = Some(fix);
            }
        }

        // Clock lines can be off; a negative length is not a call length
        if let Some(secs) = verdict.duration_secs().filter(|s| *s >= 0) {
            summary.timed_calls += 1;
            total_secs += secs;
        }
    }

    summary.overall.check("overall")?;
    summary.in_task.check("in-task")?;
    summary.not_in_task.check("not-in-task")?;

    if summary.timed_calls > 0 {
        summary.mean_call_secs = total_secs as f64 / summary.timed_calls as f64;
    }
    summary.span_days = span_days(verdicts);

    Ok(summary)
}

/// Days between the first and last opening; relies on ascending order
fn span_days(verdicts: &VerdictSet) -> f64 {
    match (verdicts.first(), verdicts.last()) {
        (Some(first), Some(last)) => {
            (last.open_time - first.open_time).num_milliseconds() as f64 / 86_400_000.0
        }
        _ => 0.0,
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
