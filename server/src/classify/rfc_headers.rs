//! Stage 0a: RFC header inspection (§4.4, §6). Scores competing header
//! signals and returns the highest; `signals` accumulates every marker
//! seen regardless of which one wins.
use std::collections::HashMap;

use super::ClassificationResult;

const DEVELOPER_HEADERS: &[(&str, &str)] = &[
    ("X-GitHub-Reason", "github"),
    ("X-GitHub-Severity", "github"),
    ("X-GitHub-Sender", "github"),
    ("X-GitLab-Project", "gitlab"),
    ("X-GitLab-Pipeline-Id", "gitlab"),
    ("X-GitLab-NotificationReason", "gitlab"),
    ("X-JIRA-FingerPrint", "jira"),
    ("X-Atlassian-Token", "jira"),
    ("X-Linear-Team", "linear"),
    ("X-Linear-Project", "linear"),
    ("X-Sentry-Project", "sentry"),
    ("X-Vercel-Deployment-Url", "vercel"),
    ("X-AWS-Service", "aws"),
];

const ESP_MARKERS: &[(&str, &str, f64)] = &[
    ("X-MC-User", "mailchimp", 0.90),
    ("X-SG-EID", "sendgrid", 0.88),
    ("X-SES-Outgoing", "ses", 0.85),
    ("X-Mailgun-Variables", "mailgun", 0.85),
    ("X-PM-Message-Id", "postmark", 0.85),
    ("X-Campaign-ID", "campaign", 0.87),
];

const MARKETING_MAILERS: &[&str] = &["mailchimp", "sendgrid", "campaign", "constant contact", "hubspot", "klaviyo"];

// Developer-header priority, generalizing the teacher's flat severity
// switch into base + per-reason + known-service components.
const DEV_HEADER_BASE_PRIORITY: f64 = 0.18;
const DEVELOPER_SERVICE_BONUS: f64 = 0.20;

const REASON_BONUS: &[(&str, f64)] = &[
    ("review_requested", 0.30),
    ("assigned", 0.20),
    ("mentioned", 0.15),
    ("comment", 0.10),
    ("subscribed", 0.05),
];

fn reason_bonus(value_lower: &str) -> f64 {
    REASON_BONUS.iter().find(|(reason, _)| value_lower.contains(reason)).map(|(_, bonus)| *bonus).unwrap_or(0.10)
}

fn header(headers: &HashMap<String, String>, name: &str) -> Option<&str> {
    headers.iter().find(|(k, _)| k.eq_ignore_ascii_case(name)).map(|(_, v)| v.as_str())
}

pub fn classify(headers: &HashMap<String, String>) -> Option<ClassificationResult> {
    let mut signals = Vec::new();
    let mut best: Option<ClassificationResult> = None;

    let mut consider = |candidate: ClassificationResult| {
        if best.as_ref().map(|b| candidate.score > b.score).unwrap_or(true) {
            best = Some(candidate);
        }
    };

    for (name, service) in DEVELOPER_HEADERS {
        if let Some(value) = header(headers, name) {
            signals.push(format!("dev:{service}"));
            let lower = value.to_lowercase();
            let (priority, subcat) = if lower.contains("critical") {
                (0.95, "security")
            } else if lower.contains("high") {
                (0.88, "security")
            } else {
                let priority = (DEV_HEADER_BASE_PRIORITY + reason_bonus(&lower) + DEVELOPER_SERVICE_BONUS).clamp(0.0, 1.0);
                (priority, "developer")
            };
            consider(ClassificationResult::candidate("work", Some(subcat), priority, 0.95, "rfc_headers", service));
        }
    }

    if let Some(unsub) = header(headers, "List-Unsubscribe") {
        signals.push("List-Unsubscribe".into());
        let _ = unsub;
        consider(ClassificationResult::candidate("newsletter", None, 0.70, 0.95, "rfc_headers", "list_unsubscribe"));
    }

    if header(headers, "List-Id").is_some() {
        signals.push("List-Id".into());
        consider(ClassificationResult::candidate("newsletter", None, 0.65, 0.90, "rfc_headers", "list_id"));
    }

    if let Some(precedence) = header(headers, "Precedence") {
        signals.push(format!("Precedence:{precedence}"));
        match precedence.to_lowercase().as_str() {
            "bulk" => consider(ClassificationResult::candidate("marketing", None, 0.60, 0.90, "rfc_headers", "precedence_bulk")),
            "list" => consider(ClassificationResult::candidate("newsletter", None, 0.65, 0.85, "rfc_headers", "precedence_list")),
            "junk" => consider(ClassificationResult::candidate("spam", None, 0.30, 0.85, "rfc_headers", "precedence_junk")),
            _ => {}
        }
    }

    if let Some(auto_submitted) = header(headers, "Auto-Submitted") {
        if !auto_submitted.eq_ignore_ascii_case("no") {
            signals.push("Auto-Submitted".into());
            consider(ClassificationResult::candidate("notification", None, 0.70, 0.92, "rfc_headers", "auto_submitted"));
        }
    }

    for (name, esp, score) in ESP_MARKERS {
        if header(headers, name).is_some() {
            signals.push(format!("esp:{esp}"));
            consider(ClassificationResult::candidate("marketing", Some("marketing"), 0.55, *score, "rfc_headers", esp));
        }
    }

    if let Some(mailer) = header(headers, "X-Mailer") {
        let lower = mailer.to_lowercase();
        if MARKETING_MAILERS.iter().any(|m| lower.contains(m)) {
            signals.push(format!("mailer:{mailer}"));
            consider(ClassificationResult::candidate("marketing", None, 0.55, 0.86, "rfc_headers", "x_mailer"));
        }
    }

    if header(headers, "Feedback-ID").is_some() {
        signals.push("Feedback-ID".into());
        consider(ClassificationResult::candidate("marketing", None, 0.50, 0.80, "rfc_headers", "feedback_id"));
    }

    if let Some(from) = header(headers, "From") {
        let lower = from.to_lowercase();
        if lower.contains("no-reply") || lower.contains("noreply") || lower.contains("donotreply") {
            signals.push("no_reply_sender".into());
            let has_esp_or_auto = signals.iter().any(|s| s.starts_with("esp:") || s == "Auto-Submitted");
            let score = if has_esp_or_auto { 0.85 } else { 0.70 };
            consider(ClassificationResult::candidate("notification", None, 0.60, score, "rfc_headers", "no_reply_sender"));
        }
    }

    best.map(|mut result| {
        result.signals = signals;
        result
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn github_header_short_circuits_as_work() {
        let result = classify(&headers(&[("X-GitHub-Reason", "subscribed")])).unwrap();
        assert_eq!(result.category, "work");
        assert!(result.score >= 0.95);
    }

    #[test]
    fn github_review_requested_matches_worked_priority() {
        let result = classify(&headers(&[("X-GitHub-Reason", "review_requested")])).unwrap();
        assert_eq!(result.category, "work");
        assert_eq!(result.sub_category.as_deref(), Some("developer"));
        assert!((result.priority - 0.68).abs() < 1e-9);
        assert!(result.score >= 0.95);
    }

    #[test]
    fn esp_marker_tags_marketing_sub_category() {
        let result = classify(&headers(&[("X-MC-User", "abc123")])).unwrap();
        assert_eq!(result.category, "marketing");
        assert_eq!(result.sub_category.as_deref(), Some("marketing"));
        assert!(result.score >= 0.88);
    }

    #[test]
    fn list_unsubscribe_beats_list_id() {
        let result = classify(&headers(&[("List-Unsubscribe", "<mailto:unsub@x.com>"), ("List-Id", "foo")])).unwrap();
        assert_eq!(result.score, 0.95);
        assert_eq!(result.category, "newsletter");
    }

    #[test]
    fn no_signals_returns_none() {
        assert!(classify(&headers(&[])).is_none());
    }
}
