//! Terminal output formatting for the `calldrop` subcommands

use calldrop_core::{
    BucketCounts, Classification, PatternLibrary, RuleOutcome, Summary, TransferKind,
};

/// Whether color output is enabled (TTY + NO_COLOR not set)
fn use_color() -> bool {
    use std::io::IsTerminal;
    std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// ANSI color codes container (empty strings when color is disabled)
pub struct Colors {
    bold: &'static str,
    dim: &'static str,
    reset: &'static str,
    green: &'static str,
    yellow: &'static str,
    red: &'static str,
    cyan: &'static str,
}

impl Colors {
    /// Colors when `enabled` and the terminal allows it
    pub fn new(enabled: bool) -> Self {
        if enabled && use_color() {
            Self {
                bold: "\x1b[1m",
                dim: "\x1b[2m",
                reset: "\x1b[0m",
                green: "\x1b[32m",
                yellow: "\x1b[33m",
                red: "\x1b[31m",
                cyan: "\x1b[36m",
            }
        } else {
            Self::plain()
        }
    }

    fn plain() -> Self {
        Self {
            bold: "",
            dim: "",
            reset: "",
            green: "",
            yellow: "",
            red: "",
            cyan: "",
        }
    }

    /// Get color for a drop rate
    fn drop_rate(&self, pct: f64) -> &str {
        if pct >= 50.0 {
            self.red
        } else if pct >= 20.0 {
            self.yellow
        } else {
            self.green
        }
    }

    /// Get color for a rule outcome
    fn outcome(&self, outcome: RuleOutcome) -> &str {
        match outcome {
            RuleOutcome::Matched => self.green,
            RuleOutcome::Revoked => self.yellow,
            RuleOutcome::NoMatch | RuleOutcome::Skipped => self.dim,
        }
    }
}

/// Print deployment statistics
pub fn print_summary(c: &Colors, name: &str, summary: &Summary, skipped: usize) {
    println!("{}=== Call Drop Summary: {name} ==={}", c.bold, c.reset);
    println!();

    println!(
        "  {}Time span:{}   {:.1} days",
        c.dim, c.reset, summary.span_days
    );
    println!(
        "  {}Total calls:{} {}",
        c.bold, c.reset, summary.overall.calls
    );
    if skipped > 0 {
        println!("  {}Skipped:{}     {skipped}", c.yellow, c.reset);
    }
    println!();

    println!("  {}By mission context:{}", c.bold, c.reset);
    let max_calls = summary.overall.calls;
    print_bucket(c, "all calls", &summary.overall, max_calls);
    print_bucket(c, "in task", &summary.in_task, max_calls);
    print_bucket(c, "not in task", &summary.not_in_task, max_calls);
    println!();

    let kinds = summary.overall.kinds;
    if kinds.total() > 0 {
        println!(
            "  {}Transfer drops:{} {} ({:.1}% of drops)",
            c.bold,
            c.reset,
            summary.overall.transfer_drops,
            summary.overall.transfer_drop_rate()
        );
        let rates = kinds.rates();
        let max_kind = [kinds.flight, kinds.science, kinds.other, kinds.indeterminate]
            .into_iter()
            .max()
            .unwrap_or(1);
        for (kind, count, pct) in [
            (TransferKind::Flight.label(), kinds.flight, rates.flight),
            (TransferKind::Science.label(), kinds.science, rates.science),
            (TransferKind::Other.label(), kinds.other, rates.other),
            ("indeterminate", kinds.indeterminate, rates.indeterminate),
        ] {
            let bar = make_bar(c, count, max_kind, 30);
            println!("    {:<16} {:>6} {:>6.1}%  {bar}", kind, count, pct);
        }
        println!();
    }

    println!("  {}Surfacings:{}   {}", c.dim, c.reset, summary.surfacings);
    if summary.timed_calls > 0 {
        let secs = summary.mean_call_secs.round() as u64;
        println!(
            "  {}Mean call:{}    {}m {}s ({} timed calls)",
            c.dim,
            c.reset,
            secs / 60,
            secs % 60,
            summary.timed_calls
        );
    }
}

/// Print one drop/intentional line of a bucket
fn print_bucket(c: &Colors, label: &str, bucket: &BucketCounts, max_calls: usize) {
    let pct = bucket.drop_rate();
    let clr = c.drop_rate(pct);
    let bar = make_bar(c, bucket.calls, max_calls, 20);
    println!(
        "    {:<14} {:>6} calls  {clr}{:>6} dropped ({:>5.1}%){}  {:>6} intentional  {bar}",
        label, bucket.calls, bucket.drops, pct, c.reset, bucket.intentional
    );
}

/// Print a single classification with its decision trail
pub fn print_classification(c: &Colors, id: &str, classification: &Classification) {
    let verdict = &classification.verdict;
    let (label, clr) = if verdict.intentional {
        ("intentional", c.green)
    } else {
        ("dropped", c.red)
    };

    println!("{}{id}{}", c.bold, c.reset);
    println!("  {}Verdict:{}       {clr}{label}{}", c.dim, c.reset, c.reset);
    println!("  {}In task:{}       {}", c.dim, c.reset, verdict.in_task);
    if verdict.transfer_drop {
        println!(
            "  {}Transfer drop:{} {}{}{}",
            c.dim,
            c.reset,
            c.yellow,
            if verdict.is_indeterminate_transfer() {
                "indeterminate"
            } else {
                verdict.transfer_kind.label()
            },
            c.reset
        );
    }
    if let Some(position) = &classification.position {
        println!("  {}Position:{}      {position}", c.dim, c.reset);
    }
    println!();

    println!("  {}Decision:{}", c.bold, c.reset);
    for reason in &classification.reasons {
        println!(
            "    {:<26} {}{:<9}{} {}{}{}",
            reason.rule.label(),
            c.outcome(reason.outcome),
            format!("{:?}", reason.outcome),
            c.reset,
            c.cyan,
            reason.pattern.unwrap_or(""),
            c.reset,
        );
        if let Some(text) = &reason.matched_text {
            println!("      {}{text}{}", c.dim, c.reset);
        }
    }
}

/// Print the pattern library
pub fn print_patterns(c: &Colors, library: &PatternLibrary) {
    println!(
        "{}=== Pattern Library {} ==={}",
        c.bold,
        library.version(),
        c.reset
    );
    println!();
    println!(
        "  {}{:<24} {:<24} {}{}",
        c.dim, "Role", "Name", "Pattern", c.reset
    );
    for entry in library.entries() {
        println!(
            "  {:<24} {}{:<24}{} {}",
            entry.role.label(),
            c.cyan,
            entry.name,
            c.reset,
            entry.source().escape_debug()
        );
    }
}

/// Create a simple bar chart
fn make_bar(c: &Colors, value: usize, max: usize, width: usize) -> String {
    if max == 0 || value == 0 {
        return String::new();
    }
    let filled = (value * width) / max;
    let filled = filled.max(1); // at least 1 char for non-zero values
    format!("{}{}{}", c.dim, "█".repeat(filled), c.reset)
}
