use regex::Regex;

use super::{PatternEntry, PatternRole};

/// (name, role, expression) rows of the built-in table.
///
/// Several phrases exist per termination reason because a call can be cut
/// while the terminal is still printing; matching any one of them is enough.
const TABLE: &[(&str, PatternRole, &str)] = &[
    // Callback result text. The command may be accepted and the phone hung
    // up before this prints, so the command lines below are matched too.
    (
        "callback_announcement",
        PatternRole::IntentionalTermination,
        r"I am going to hangup the Iridium!",
    ),
    // `callback N [0|1]` outside a mission. The leading `[^_]` rejects
    // variables such as `u_max_time_in_callback 900`, and the trailing line
    // feed means enter was pressed before the call ended.
    (
        "callback_command",
        PatternRole::IntentionalTermination,
        r"[^_]callback \d+(?: [01])*\n",
    ),
    // In-mission shortcut for callback
    (
        "callback_shortcut",
        PatternRole::IntentionalTermination,
        r"H \d+(?: [01])*\n",
    ),
    // Control-R resume ends with housekeeping
    (
        "housekeeping_done",
        PatternRole::IntentionalTermination,
        r"Housekeeping is done",
    ),
    // A bare `^R` is not listed: random bytes dumped after a science bay
    // transfer can contain it.
    (
        "control_r_heard",
        PatternRole::IntentionalTermination,
        r"I heard a Control-R",
    ),
    (
        "control_r_resuming",
        PatternRole::IntentionalTermination,
        r"User typed Control-R, resuming",
    ),
    // Freewave chosen over Iridium for a transfer
    (
        "freewave_console",
        PatternRole::IntentionalTermination,
        r"using FREEWAVE as console",
    ),
    // `use + dev` / `use - dev` resets every device, the phone included
    (
        "use_command",
        PatternRole::IntentionalTermination,
        r"[^_]use (?:\+|-) [_A-Za-z0-9]+\n",
    ),
    (
        "exit_command",
        PatternRole::IntentionalTermination,
        r"exit(?: reset| pico)*\n",
    ),
    // Printed by both `use` and every variant of `exit`
    (
        "exiting_devices",
        PatternRole::IntentionalTermination,
        r"Exiting all devices",
    ),
    // Every way of starting a mission prints one of these
    (
        "mission_starting",
        PatternRole::TaskStart,
        r"Starting Mission: [_a-zA-Z0-9]+\.mi",
    ),
    (
        "mission_file_opened",
        PatternRole::TaskStart,
        r"load_mission\(\): Opening Mission file:",
    ),
    ("control_c", PatternRole::CancellationEvidence, r"\^C"),
    (
        "mission_abnormal",
        PatternRole::CancellationEvidence,
        r"Mission completed ABNORMALLY",
    ),
    (
        "gliderdos_prompt",
        PatternRole::TaskExitPrompt,
        r"GliderDos (?:A|N|I) -*\d+ >",
    ),
    (
        "zmodem_progress",
        PatternRole::TransferOccurred,
        r"Total Bytes sent/received:",
    ),
    (
        "zmodem_start",
        PatternRole::TransferType,
        r"Starting zModem transfer of \d+.([A-Za-z]{3})",
    ),
    (
        "gps_location",
        PatternRole::Position,
        r"GPS Location:  (\d{4}\.\d+ N -\d{5}\.\d+ E)",
    ),
];

pub(super) fn entries() -> Vec<PatternEntry> {
    TABLE
        .iter()
        .map(|&(name, role, source)| PatternEntry {
            name,
            role,
            regex: Regex::new(source).expect("Invalid built-in pattern"),
        })
        .collect()
}
