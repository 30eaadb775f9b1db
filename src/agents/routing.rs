//! Route-or-answer decisions for orchestrating agents.
//!
//! The LLM is asked for `{"target": ..., "reason": ...}` but its output is never
//! trusted to be valid JSON: the target is pulled out with a regex, and when that
//! fails or names no known agent the raw text is scanned for keywords. Every path
//! yields a decision.

use once_cell::sync::Lazy;
use regex::Regex;

static TARGET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)"target"\s*:\s*"([^"]+)""#).expect("valid target regex"));

static REASON_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)"reason"\s*:\s*"([^"]*)""#).expect("valid reason regex"));

/// Outcome of the routing step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    /// Answer with the agent's own prompt.
    SelfAnswer,
    /// Delegate to this peer (original casing from the peer list).
    Peer(String),
}

/// System prompt for the routing call.
pub fn routing_prompt(peers: &[String]) -> String {
    format!(
        "You are a strict routing engine for a multi-agent orchestrator.\n\
         Pick exactly one target from [{}] or SELF.\n\
         Return JSON only, exactly this schema:\n\
         {{\"target\":\"<agent-id-or-SELF>\",\"reason\":\"<short reason>\"}}\n\
         Rules:\n\
         - Use SELF for greetings, small talk, or unclear/ambiguous requests.\n\
         - Otherwise select the single best specialist agent.\n\
         - Never invent agent IDs.",
        peers.join(", ")
    )
}

/// Interpret the routing call's raw output against the known peers.
pub fn parse_routing_decision(raw: &str, peers: &[String]) -> RoutingDecision {
    let extracted = TARGET_RE.captures(raw).and_then(|captures| {
        let candidate = captures[1].replace('`', "");
        normalize_target(candidate.trim(), peers)
    });
    if let Some(decision) = extracted {
        return decision;
    }

    // No usable target: scan the whole answer.
    let lowered = raw.to_lowercase();
    if lowered.contains("self") {
        return RoutingDecision::SelfAnswer;
    }
    peers
        .iter()
        .find(|peer| lowered.contains(&peer.to_lowercase()))
        .map(|peer| RoutingDecision::Peer(peer.clone()))
        .unwrap_or(RoutingDecision::SelfAnswer)
}

/// Map an extracted target onto SELF or a known peer; `None` for ids nobody knows.
fn normalize_target(candidate: &str, peers: &[String]) -> Option<RoutingDecision> {
    let lowered = candidate.to_lowercase();
    if lowered == "self" || lowered == "none" {
        return Some(RoutingDecision::SelfAnswer);
    }
    peers
        .iter()
        .find(|peer| peer.to_lowercase() == lowered)
        .map(|peer| RoutingDecision::Peer(peer.clone()))
}

/// Advisory `reason` from the routing output, for logs only.
pub fn extract_reason(raw: &str) -> Option<String> {
    REASON_RE
        .captures(raw)
        .map(|captures| captures[1].trim().to_string())
        .filter(|reason| !reason.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peers() -> Vec<String> {
        vec!["billing".to_string(), "tech".to_string()]
    }

    fn peer(id: &str) -> RoutingDecision {
        RoutingDecision::Peer(id.to_string())
    }

    #[test]
    fn parses_well_formed_json() {
        assert_eq!(
            parse_routing_decision(r#"{"target":"billing","reason":"x"}"#, &peers()),
            peer("billing")
        );
    }

    #[test]
    fn target_match_ignores_case_and_keeps_peer_casing() {
        assert_eq!(
            parse_routing_decision(r#"  {"target": "TECH"}"#, &peers()),
            peer("tech")
        );
        let mixed = vec!["BillingDesk".to_string()];
        assert_eq!(
            parse_routing_decision(r#"{"TARGET":"billingdesk"}"#, &mixed),
            peer("BillingDesk")
        );
    }

    #[test]
    fn self_and_none_route_locally() {
        assert_eq!(
            parse_routing_decision(r#"{"target":"SELF"}"#, &peers()),
            RoutingDecision::SelfAnswer
        );
        assert_eq!(
            parse_routing_decision(r#"{"target":"none"}"#, &peers()),
            RoutingDecision::SelfAnswer
        );
    }

    #[test]
    fn unknown_target_routes_locally() {
        assert_eq!(
            parse_routing_decision(r#"{"target":"unknown"}"#, &peers()),
            RoutingDecision::SelfAnswer
        );
    }

    #[test]
    fn unknown_target_still_scans_for_peer_names() {
        assert_eq!(
            parse_routing_decision(r#"{"target":"tech-support","reason":"printer"}"#, &peers()),
            peer("tech")
        );
        assert_eq!(
            parse_routing_decision(r#"{"target":"sales","reason":"handle it myself"}"#, &peers()),
            RoutingDecision::SelfAnswer
        );
    }

    #[test]
    fn non_ascii_peer_ids_match_case_insensitively() {
        let peers = vec!["Élan".to_string()];
        assert_eq!(
            parse_routing_decision(r#"{"target":"ÉLAN"}"#, &peers),
            peer("Élan")
        );
        assert_eq!(
            parse_routing_decision("send it to élan please", &peers),
            peer("Élan")
        );
    }

    #[test]
    fn free_text_falls_back_to_keywords() {
        assert_eq!(
            parse_routing_decision("I will handle this myself", &peers()),
            RoutingDecision::SelfAnswer
        );
        assert_eq!(
            parse_routing_decision("Please ask tech for help", &peers()),
            peer("tech")
        );
        assert_eq!(
            parse_routing_decision("no idea", &peers()),
            RoutingDecision::SelfAnswer
        );
    }

    #[test]
    fn keyword_scan_prefers_peer_list_order() {
        assert_eq!(
            parse_routing_decision("tech or billing, hard to say", &peers()),
            peer("billing")
        );
    }

    #[test]
    fn code_fenced_json_is_accepted() {
        assert_eq!(
            parse_routing_decision("```json\n{\"target\":\"billing\"}\n```", &peers()),
            peer("billing")
        );
    }

    #[test]
    fn backticks_inside_target_are_stripped() {
        assert_eq!(
            parse_routing_decision(r#"{"target":" `tech` "}"#, &peers()),
            peer("tech")
        );
    }

    #[test]
    fn prompt_lists_peers() {
        let prompt = routing_prompt(&peers());
        assert!(prompt.starts_with("You are a strict routing engine"));
        assert!(prompt.contains("Pick exactly one target from [billing, tech] or SELF."));
        assert!(prompt.contains(r#"{"target":"<agent-id-or-SELF>","reason":"<short reason>"}"#));
        assert!(prompt.ends_with("- Never invent agent IDs."));
    }

    #[test]
    fn reason_is_optional() {
        assert_eq!(
            extract_reason(r#"{"target":"tech","reason":" printer jam "}"#).as_deref(),
            Some("printer jam")
        );
        assert_eq!(extract_reason(r#"{"target":"tech"}"#), None);
    }
}
