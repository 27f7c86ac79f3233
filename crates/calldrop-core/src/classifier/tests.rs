use std::borrow::Cow;

use pretty_assertions::assert_eq;

use super::*;

fn verdict_of(text: &str) -> Verdict {
    classify(text).expect("classification failed").verdict
}

fn reason_for(classification: &Classification, rule: Rule) -> &DecisionReason {
    classification
        .reasons
        .iter()
        .find(|r| r.rule == rule)
        .expect("rule did not run")
}

#[test]
fn test_mission_start_without_cancellation_is_intentional() {
    let text = "\
Vehicle Name: unit_507
SEQUENCE: Running lastgasp.mi on try 0
Starting Mission: foo.mi
timestamp: Fri Sep 15 23:50:12 2023
  behavior surface_4: SUBSTATE 1 ->2 : Picking iridium or freewave
";
    assert_eq!(
        verdict_of(text),
        Verdict {
            intentional: true,
            in_task: true,
            transfer_drop: false,
            transfer_kind: TransferKind::None,
        }
    );
}

#[test]
fn test_science_transfer_drop_out_of_task() {
    let text = "\
GliderDos N -1 >send *.tbd
SCIENCE DATA LOGGING: science IS running
Starting zModem transfer of 00770005.tbd to/from ce_1012 size is 48551
   sending block 1
   sending block 2
Total Bytes sent/received: 19127";
    assert_eq!(
        verdict_of(text),
        Verdict {
            intentional: false,
            in_task: false,
            transfer_drop: true,
            transfer_kind: TransferKind::Science,
        }
    );
}

#[test]
fn test_flight_transfer_drop() {
    let text = "\
Starting zModem transfer of 00770006.SBD to/from ce_1012 size is 1024
Total Bytes sent/received: 512";
    let verdict = verdict_of(text);
    assert!(verdict.transfer_drop);
    assert_eq!(verdict.transfer_kind, TransferKind::Flight);
    assert!(verdict.in_task);
}

#[test]
fn test_other_transfer_drop() {
    let text = "\
Starting zModem transfer of 00770006.mlg to/from ce_1012 size is 1024
Total Bytes sent/received: 512";
    let verdict = verdict_of(text);
    assert!(verdict.transfer_drop);
    assert_eq!(verdict.transfer_kind, TransferKind::Other);
}

#[test]
fn test_transfer_drop_without_marker_stays_distinct_from_no_drop() {
    let dropped = verdict_of("junk before\nTotal Bytes sent/received: 4096");
    let clean = verdict_of("junk before\nnothing here");

    // Both carry `TransferKind::None`, only `transfer_drop` tells them apart
    assert_eq!(dropped.transfer_kind, TransferKind::None);
    assert_eq!(clean.transfer_kind, TransferKind::None);
    assert!(dropped.transfer_drop);
    assert!(!clean.transfer_drop);
    assert!(dropped.is_indeterminate_transfer());
    assert!(!clean.is_indeterminate_transfer());
}

#[test]
fn test_task_start_then_control_c_falls_through() {
    let text = "\
Starting Mission: foo.mi
load_mission(): Opening Mission file: foo.mi
^C
Mission completed ABNORMALLY (-1)
";
    let classification = classify(text).unwrap();
    assert!(!classification.verdict.intentional);
    assert_eq!(
        reason_for(&classification, Rule::TaskStartRevalidation).outcome,
        RuleOutcome::Revoked
    );
    assert_eq!(
        reason_for(&classification, Rule::IntentionalScan).outcome,
        RuleOutcome::NoMatch
    );
}

#[test]
fn test_cancelled_start_still_accepts_other_termination_evidence() {
    let text = "\
Starting Mission: foo.mi
^C
GliderDos I -3 >callback 15
I am going to hangup the Iridium!
";
    let classification = classify(text).unwrap();
    assert!(classification.verdict.intentional);
    assert!(!classification.verdict.in_task);
    let scan = reason_for(&classification, Rule::IntentionalScan);
    assert_eq!(scan.outcome, RuleOutcome::Matched);
    assert_eq!(scan.pattern, Some("callback_announcement"));
}

#[test]
fn test_termination_evidence_before_cancelled_start_counts() {
    // The intentional scan reads the whole transcript, not the suffix
    let text = "\
Exiting all devices ...
Starting Mission: foo.mi
Mission completed ABNORMALLY (-1)
";
    assert!(verdict_of(text).intentional);
}

#[test]
fn test_only_last_task_start_is_revalidated() {
    let text = "\
Starting Mission: first.mi
^C
GliderDos A 6 >run second.mi
Starting Mission: second.mi
timestamp: Fri Sep 15 23:50:12 2023
";
    let classification = classify(text).unwrap();
    assert!(classification.verdict.intentional);
    let revalidation = reason_for(&classification, Rule::TaskStartRevalidation);
    assert_eq!(revalidation.outcome, RuleOutcome::Matched);
    assert_eq!(
        revalidation.matched_text.as_deref(),
        Some("Starting Mission: second.mi")
    );
    assert_eq!(
        reason_for(&classification, Rule::IntentionalScan).outcome,
        RuleOutcome::Skipped
    );
}

#[test]
fn test_clean_start_followed_by_cancelled_restart_is_not_intentional_by_start() {
    let text = "\
Starting Mission: first.mi
timestamp: Fri Sep 15 23:50:12 2023
Starting Mission: second.mi
^C
";
    let classification = classify(text).unwrap();
    assert!(!classification.verdict.intentional);
}

#[test]
fn test_task_exit_prompt_anywhere_means_not_in_task() {
    let text = "\
GliderDos N -1 >
Starting Mission: foo.mi
";
    let verdict = verdict_of(text);
    assert!(!verdict.in_task);
    assert!(verdict.intentional);
}

#[test]
fn test_no_patterns_is_in_task_drop() {
    let verdict = verdict_of("Vehicle Name: unit_507\nCurr Time: Sat May 12 04:25:39 2018 MT:  116230\n");
    assert_eq!(
        verdict,
        Verdict {
            intentional: false,
            in_task: true,
            transfer_drop: false,
            transfer_kind: TransferKind::None,
        }
    );
}

#[test]
fn test_empty_transcript() {
    let verdict = verdict_of("");
    assert!(verdict.is_drop());
    assert!(verdict.in_task);
    assert!(!verdict.transfer_drop);
}

#[test]
fn test_control_r_resume_is_intentional() {
    let text = "\
^R  7955  0 behavior surface_4: User typed Control-R, resuming

   I heard a Control-R
   RESUMING MISSION
";
    let classification = classify(text).unwrap();
    assert!(classification.verdict.intentional);
    assert_eq!(
        reason_for(&classification, Rule::IntentionalScan).pattern,
        Some("control_r_heard")
    );
}

#[test]
fn test_callback_variable_is_not_a_callback() {
    let text = "GliderDos N -1 >get u_max_time_in_callback\n   u_max_time_in_callback 900\n";
    assert!(!verdict_of(text).intentional);
}

#[test]
fn test_intentional_transfer_conflict_is_reported() {
    let text = "\
GliderDos N -1 >callback 2
Starting zModem transfer of 00770005.sbd to/from ce_1012 size is 48551
Total Bytes sent/received: 19127";
    let violation = classify(text).unwrap_err();
    assert!(violation.verdict.intentional);
    assert!(violation.verdict.transfer_drop);
    assert_eq!(violation.verdict.transfer_kind, TransferKind::Flight);
}

#[test]
fn test_reasons_follow_rule_order() {
    let classification = classify("anything").unwrap();
    let rules: Vec<Rule> = classification.reasons.iter().map(|r| r.rule).collect();
    assert_eq!(rules, Rule::ORDER.to_vec());
}

#[test]
fn test_matched_text_is_truncated() {
    let long_name = "a".repeat(400);
    let text = format!("Starting Mission: {}.mi\n", long_name);
    let classification = classify(&text).unwrap();
    let matched = reason_for(&classification, Rule::TaskStartRevalidation)
        .matched_text
        .clone()
        .unwrap();
    assert!(matched.len() <= 200);
    assert!(matched.ends_with("..."));
}

#[test]
fn test_last_position_is_captured() {
    let text = "\
GPS Location:  4430.530 N -12503.956 E measured    835.845 secs ago
GPS Location:  4430.612 N -12503.901 E measured      1.220 secs ago
";
    let classification = classify(text).unwrap();
    assert_eq!(
        classification.position.as_deref(),
        Some("4430.612 N -12503.901 E")
    );
    assert_eq!(classify("no fix").unwrap().position, None);
}

#[test]
fn test_classification_serializes_flat_verdict() {
    let classification = classify("Total Bytes sent/received: 1").unwrap();
    let json = serde_json::to_value(&classification).unwrap();
    assert_eq!(json["transfer_drop"], true);
    assert_eq!(json["transfer_kind"], "none");
    assert_eq!(json["reasons"][3]["rule"], "transfer_drop");
    assert_eq!(json["reasons"][3]["outcome"], "matched");
}

#[test]
fn test_crlf_transcripts_classify_like_lf() {
    let lf = "GliderDos N -1 >callback 15\nhung up\n";
    let crlf = lf.replace('\n', "\r\n");
    assert_eq!(verdict_of(&crlf), verdict_of(lf));
    assert!(verdict_of(&crlf).intentional);

    assert!(verdict_of("GliderDos N -1 >exit reset\r\n").intentional);
    assert!(verdict_of("GliderDos N -1 >use + science\r\n").intentional);
    assert!(verdict_of("GliderDos N -1 >H 5 1\r\n").intentional);
}

#[test]
fn test_crlf_after_transfer_progress_ends_the_line() {
    let text = "Starting zModem transfer of 00770005.sbd to/from ce_1012 size is 1\r\n\
                Total Bytes sent/received: 19127\r\n";
    let verdict = verdict_of(text);
    assert!(!verdict.transfer_drop);

    let text = "Starting zModem transfer of 00770005.sbd to/from ce_1012 size is 1\r\n\
                Total Bytes sent/received: 19127\r";
    assert!(!verdict_of(text).transfer_drop);

    let text = "Starting zModem transfer of 00770005.sbd to/from ce_1012 size is 1\r\n\
                Total Bytes sent/received: 19127";
    assert_eq!(verdict_of(text).transfer_kind, TransferKind::Flight);
}

#[test]
fn test_normalize_line_endings() {
    assert!(matches!(normalize_line_endings("a\nb"), Cow::Borrowed("a\nb")));
    assert_eq!(normalize_line_endings("a\r\nb\rc\r\n"), "a\nb\nc\n");
}

/// Transcript fragments used to build every ordered combination
const FRAGMENTS: &[&str] = &[
    "GliderDos N -1 >",
    "Starting Mission: foo.mi",
    "^C",
    "Mission completed ABNORMALLY",
    "I am going to hangup the Iridium!",
    "Starting zModem transfer of 00770005.tbd to/from ce_1012 size is 1",
    "Starting zModem transfer of 00770005.sbd to/from ce_1012 size is 1",
    "Total Bytes sent/received: 100",
];

/// Every subset of `FRAGMENTS`, joined in catalogue order, with and without
/// a trailing line feed.
fn fragment_transcripts() -> Vec<String> {
    let mut out = Vec::new();
    for mask in 0u32..(1 << FRAGMENTS.len()) {
        let parts: Vec<&str> = FRAGMENTS
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, f)| *f)
            .collect();
        let joined = parts.join("\n");
        out.push(format!("{}\n", joined));
        out.push(joined);
    }
    out
}

#[test]
fn test_exclusivity_holds_for_all_fragment_combinations() {
    for text in fragment_transcripts() {
        match classify(&text) {
            Ok(c) => assert!(
                !(c.verdict.intentional && c.verdict.transfer_drop),
                "both flags set for {:?}",
                text
            ),
            Err(violation) => {
                // Reported, never returned as a verdict
                assert!(violation.verdict.intentional && violation.verdict.transfer_drop);
            }
        }
    }
}

#[test]
fn test_in_task_tracks_prompt_for_all_fragment_combinations() {
    for text in fragment_transcripts() {
        let has_prompt = text.contains("GliderDos N -1 >");
        let in_task = match classify(&text) {
            Ok(c) => c.verdict.in_task,
            Err(violation) => violation.verdict.in_task,
        };
        assert_eq!(in_task, !has_prompt, "wrong in_task for {:?}", text);
    }
}

#[test]
fn test_transfer_kind_none_iff_no_marker_or_no_drop() {
    for text in fragment_transcripts() {
        let verdict = match classify(&text) {
            Ok(c) => c.verdict,
            Err(violation) => violation.verdict,
        };
        if !verdict.transfer_drop {
            assert_eq!(verdict.transfer_kind, TransferKind::None);
        } else if text.contains("zModem transfer") {
            assert_ne!(verdict.transfer_kind, TransferKind::None, "{:?}", text);
        }
    }
}
