//! Deterministic event classification.
//!
//! [`classify`] maps one raw switch event (header map plus optional
//! body) to an [`EventRecord`]: it assigns a severity, renders a short
//! summary, and extracts the fields meaningful to the event's family.
//!
//! The function is pure: no I/O, no shared state, same output for the
//! same input. This keeps it unit-testable against literal header
//! fixtures.

use std::collections::BTreeMap;

use crate::record::{EventDetails, EventRecord, Severity};

/// Cap applied to free-text log bodies before they become summaries.
pub const SUMMARY_BODY_CAP: usize = 300;

/// Event classes the subscriber is interested in.
///
/// The streaming session subscribes to the full event stream on the
/// wire; this list documents the classes the classifier renders with
/// family-specific summaries and attributes.
pub const SUBSCRIBED_EVENTS: &[&str] = &[
    "CHANNEL_CREATE",
    "CHANNEL_ANSWER",
    "CHANNEL_HANGUP",
    "CHANNEL_HANGUP_COMPLETE",
    "CHANNEL_BRIDGE",
    "CHANNEL_STATE",
    "SOFIA::REGISTER",
    "SOFIA::UNREGISTER",
    "SOFIA::REGISTER_ATTEMPT",
    "SOFIA::REGISTER_FAILURE",
    "SOFIA::GATEWAY_STATE",
    "CUSTOM sofia::register",
    "CUSTOM sofia::unregister",
    "CUSTOM sofia::register_failure",
    "CUSTOM sofia::gateway_add",
    "CUSTOM sofia::gateway_delete",
    "CUSTOM sofia::gateway_state",
    "HEARTBEAT",
    "RE_SCHEDULE",
    "API",
    "LOG",
];

/// Classifies one raw event into a normalized record.
///
/// `headers` is the complete decoded header mapping of the event;
/// `body` is the optional free-text payload (present for `LOG` events).
/// The event name is read from `Event-Name` (defaulting to `UNKNOWN`)
/// and the custom subclass from `Event-Subclass`.
#[must_use]
pub fn classify(headers: &BTreeMap<String, String>, body: Option<&str>) -> EventRecord {
    let name = header(headers, "Event-Name").unwrap_or("UNKNOWN").to_string();
    let subclass = header(headers, "Event-Subclass").unwrap_or("").to_string();

    EventRecord::new(
        name.clone(),
        subclass.clone(),
        severity_for(&name, &subclass),
        summary_for(&name, &subclass, headers, body),
        details_for(&name, &subclass, headers),
        headers.clone(),
    )
}

fn header<'a>(headers: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    headers.get(name).map(String::as_str)
}

fn header_or<'a>(headers: &'a BTreeMap<String, String>, name: &str, default: &'a str) -> &'a str {
    header(headers, name).unwrap_or(default)
}

/// Severity assignment, in priority order over the type and subtype.
fn severity_for(name: &str, subclass: &str) -> Severity {
    if name.contains("HANGUP") {
        Severity::Warning
    } else if name.contains("FAILURE")
        || name.contains("ERROR")
        || subclass.contains("failure")
    {
        Severity::Error
    } else if name.contains("REGISTER") || subclass.contains("register") {
        Severity::Info
    } else if name == "LOG" || name == "HEARTBEAT" {
        Severity::Debug
    } else {
        Severity::Info
    }
}

/// Renders the type-specific one-line summary.
fn summary_for(
    name: &str,
    subclass: &str,
    headers: &BTreeMap<String, String>,
    body: Option<&str>,
) -> String {
    match name {
        "CHANNEL_CREATE" => {
            let caller = header_or(headers, "Caller-Caller-ID-Number", "unknown");
            let dest = header_or(headers, "Caller-Destination-Number", "unknown");
            let direction = header_or(headers, "Call-Direction", "");
            format!("Call {direction}: {caller} -> {dest}")
        }
        "CHANNEL_ANSWER" => {
            let caller = header_or(headers, "Caller-Caller-ID-Number", "unknown");
            let dest = header_or(headers, "Caller-Destination-Number", "unknown");
            format!("Answered: {caller} -> {dest}")
        }
        "CHANNEL_HANGUP" | "CHANNEL_HANGUP_COMPLETE" => {
            let caller = header_or(headers, "Caller-Caller-ID-Number", "unknown");
            let cause = header_or(headers, "Hangup-Cause", "unknown");
            format!("Hangup: {caller} ({cause})")
        }
        "HEARTBEAT" => {
            let uptime = header_or(headers, "Up-Time", "");
            let sessions = header_or(headers, "Session-Count", "0");
            format!("Heartbeat: {sessions} sessions, uptime: {uptime}")
        }
        "LOG" => body.map_or_else(
            || format!("[LOG] {}", header_or(headers, "Log-File", "")),
            |text| truncate(text, SUMMARY_BODY_CAP),
        ),
        _ if is_registration(name, subclass) => {
            let user = header(headers, "from-user")
                .or_else(|| header(headers, "user"))
                .unwrap_or("unknown");
            let ip = header(headers, "network-ip")
                .or_else(|| header(headers, "ip"))
                .unwrap_or("");
            let profile = header_or(headers, "profile-name", "");
            if name.contains("FAILURE") || subclass.contains("failure") {
                format!("Register FAILED: {user}@{ip} [{profile}]")
            } else if name.contains("UNREGISTER") || subclass.contains("unregister") {
                format!("Unregister: {user}@{ip} [{profile}]")
            } else {
                format!("Register: {user}@{ip} [{profile}]")
            }
        }
        _ if is_gateway(name, subclass) => {
            let gateway = header_or(headers, "Gateway", "unknown");
            let state = header_or(headers, "State", "unknown");
            format!("Gateway {gateway}: {state}")
        }
        _ => format!("{name} {subclass}").trim().to_string(),
    }
}

/// Extracts the attribute set for the event's family.
fn details_for(name: &str, subclass: &str, headers: &BTreeMap<String, String>) -> EventDetails {
    let own = |field: &str| header(headers, field).map(String::from);
    match name {
        "CHANNEL_CREATE" | "CHANNEL_ANSWER" | "CHANNEL_HANGUP" | "CHANNEL_HANGUP_COMPLETE" => {
            EventDetails::Call {
                caller_id: own("Caller-Caller-ID-Number"),
                destination: own("Caller-Destination-Number"),
                uuid: own("Unique-ID"),
                direction: own("Call-Direction"),
            }
        }
        "HEARTBEAT" => EventDetails::Heartbeat {
            session_count: own("Session-Count"),
            uptime: own("Up-Time"),
        },
        "LOG" => EventDetails::Log {
            level: own("Log-Level"),
            file: own("Log-File"),
            line: own("Log-Line"),
        },
        _ if is_registration(name, subclass) => EventDetails::Registration {
            user: own("from-user").or_else(|| own("user")),
            ip: own("network-ip").or_else(|| own("ip")),
            profile: own("profile-name"),
        },
        _ if is_gateway(name, subclass) => EventDetails::Gateway {
            name: own("Gateway"),
            state: own("State"),
        },
        _ => EventDetails::None,
    }
}

fn is_registration(name: &str, subclass: &str) -> bool {
    name.contains("SOFIA::REGISTER") || subclass.contains("register")
}

fn is_gateway(name: &str, subclass: &str) -> bool {
    name == "SOFIA::GATEWAY_STATE" || subclass.contains("gateway")
}

fn truncate(text: &str, cap: usize) -> String {
    if text.len() <= cap {
        return text.to_string();
    }
    // Back off to a char boundary so the cut never splits a code point.
    let mut end = cap;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    text[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn hangup_complete_is_warning_with_cause_in_summary() {
        let h = headers(&[
            ("Event-Name", "CHANNEL_HANGUP_COMPLETE"),
            ("Caller-Caller-ID-Number", "100"),
            ("Hangup-Cause", "NORMAL_CLEARING"),
        ]);
        let record = classify(&h, None);
        assert_eq!(record.severity, Severity::Warning);
        assert!(record.summary.contains("NORMAL_CLEARING"));
        assert_eq!(record.summary, "Hangup: 100 (NORMAL_CLEARING)");
    }

    #[test]
    fn register_failure_is_error_with_exact_summary() {
        let h = headers(&[
            ("Event-Name", "SOFIA::REGISTER_FAILURE"),
            ("from-user", "alice"),
            ("network-ip", "203.0.113.5"),
            ("profile-name", "internal"),
        ]);
        let record = classify(&h, None);
        assert_eq!(record.severity, Severity::Error);
        assert_eq!(record.summary, "Register FAILED: alice@203.0.113.5 [internal]");
    }

    #[test]
    fn custom_register_failure_subclass_is_error() {
        let h = headers(&[
            ("Event-Name", "CUSTOM"),
            ("Event-Subclass", "sofia::register_failure"),
            ("from-user", "bob"),
            ("network-ip", "198.51.100.9"),
            ("profile-name", "external"),
        ]);
        let record = classify(&h, None);
        assert_eq!(record.severity, Severity::Error);
        assert_eq!(record.summary, "Register FAILED: bob@198.51.100.9 [external]");
    }

    #[test]
    fn heartbeat_is_debug_with_session_count() {
        let h = headers(&[
            ("Event-Name", "HEARTBEAT"),
            ("Session-Count", "3"),
            ("Up-Time", "0 years, 2 days"),
        ]);
        let record = classify(&h, None);
        assert_eq!(record.severity, Severity::Debug);
        assert_eq!(record.summary, "Heartbeat: 3 sessions, uptime: 0 years, 2 days");
        assert_eq!(
            record.details,
            EventDetails::Heartbeat {
                session_count: Some("3".to_string()),
                uptime: Some("0 years, 2 days".to_string()),
            }
        );
    }

    #[test]
    fn channel_create_extracts_call_fields() {
        let h = headers(&[
            ("Event-Name", "CHANNEL_CREATE"),
            ("Caller-Caller-ID-Number", "100"),
            ("Caller-Destination-Number", "200"),
            ("Unique-ID", "abc-123"),
            ("Call-Direction", "inbound"),
        ]);
        let record = classify(&h, None);
        assert_eq!(record.severity, Severity::Info);
        assert_eq!(record.summary, "Call inbound: 100 -> 200");
        assert_eq!(
            record.details,
            EventDetails::Call {
                caller_id: Some("100".to_string()),
                destination: Some("200".to_string()),
                uuid: Some("abc-123".to_string()),
                direction: Some("inbound".to_string()),
            }
        );
    }

    #[test]
    fn absent_call_fields_are_omitted_not_defaulted() {
        let h = headers(&[("Event-Name", "CHANNEL_CREATE")]);
        let record = classify(&h, None);
        assert_eq!(
            record.details,
            EventDetails::Call {
                caller_id: None,
                destination: None,
                uuid: None,
                direction: None,
            }
        );
        // Summary still renders with placeholders.
        assert_eq!(record.summary, "Call : unknown -> unknown");
    }

    #[test]
    fn registration_falls_back_to_short_header_names() {
        let h = headers(&[
            ("Event-Name", "CUSTOM"),
            ("Event-Subclass", "sofia::register"),
            ("user", "carol"),
            ("ip", "192.0.2.7"),
        ]);
        let record = classify(&h, None);
        assert_eq!(record.severity, Severity::Info);
        assert_eq!(record.summary, "Register: carol@192.0.2.7 []");
    }

    #[test]
    fn gateway_state_renders_name_and_state() {
        let h = headers(&[
            ("Event-Name", "SOFIA::GATEWAY_STATE"),
            ("Gateway", "trunk-a"),
            ("State", "DOWN"),
        ]);
        let record = classify(&h, None);
        assert_eq!(record.summary, "Gateway trunk-a: DOWN");
        assert_eq!(
            record.details,
            EventDetails::Gateway {
                name: Some("trunk-a".to_string()),
                state: Some("DOWN".to_string()),
            }
        );
    }

    #[test]
    fn log_body_is_truncated_to_cap() {
        let h = headers(&[("Event-Name", "LOG"), ("Log-File", "switch.c")]);
        let long_body = "x".repeat(SUMMARY_BODY_CAP + 50);
        let record = classify(&h, Some(&long_body));
        assert_eq!(record.summary.len(), SUMMARY_BODY_CAP);
        assert_eq!(record.severity, Severity::Debug);
    }

    #[test]
    fn log_without_body_names_the_source() {
        let h = headers(&[("Event-Name", "LOG"), ("Log-File", "sofia.c")]);
        let record = classify(&h, None);
        assert_eq!(record.summary, "[LOG] sofia.c");
    }

    #[test]
    fn unrecognized_event_renders_trimmed_type_and_subtype() {
        let h = headers(&[("Event-Name", "RE_SCHEDULE")]);
        let record = classify(&h, None);
        assert_eq!(record.summary, "RE_SCHEDULE");
        assert_eq!(record.severity, Severity::Info);
        assert_eq!(record.details, EventDetails::None);
    }

    #[test]
    fn classification_is_deterministic() {
        let h = headers(&[
            ("Event-Name", "CHANNEL_HANGUP"),
            ("Caller-Caller-ID-Number", "42"),
            ("Hangup-Cause", "USER_BUSY"),
        ]);
        let a = classify(&h, None);
        let b = classify(&h, None);
        assert_eq!(a.severity, b.severity);
        assert_eq!(a.summary, b.summary);
        assert_eq!(a.details, b.details);
        assert_eq!(a.raw_headers, b.raw_headers);
    }
}
