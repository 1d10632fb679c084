//! Stage 0c: subject pattern matching (§4.4). Critical phrases short-circuit
//! with fixed priorities; other matches combine the pattern's base score
//! with the category bonus.
use once_cell::sync::Lazy;
use regex::Regex;

use super::{category_bonus, ClassificationResult};

struct SubjectPattern {
    re: Regex,
    category: &'static str,
    sub_category: &'static str,
    score: f64,
}

macro_rules! pattern {
    ($re:expr, $category:expr, $sub_category:expr, $score:expr) => {
        SubjectPattern { re: Regex::new($re).unwrap(), category: $category, sub_category: $sub_category, score: $score }
    };
}

static CRITICAL_PATTERNS: &[(&str, f64)] = &[
    (r"is down", 0.99),
    (r"crashed", 0.98),
    (r"security breach", 0.99),
    (r"data breach", 0.99),
];

static CRITICAL_RE: Lazy<Vec<(Regex, f64)>> = Lazy::new(|| {
    CRITICAL_PATTERNS.iter().map(|(p, s)| (Regex::new(&format!("(?i){p}")).unwrap(), *s)).collect()
});

static PATTERNS: Lazy<Vec<SubjectPattern>> = Lazy::new(|| {
    vec![
        pattern!(r"(?i)deploy(ment)? (succeeded|failed)", "work", "alert", 0.90),
        pattern!(r"(?i)build (passed|failed)", "work", "alert", 0.90),
        pattern!(r"(?i)pipeline (succeeded|failed)", "work", "alert", 0.88),
        pattern!(r"(?i)(server|service) alert", "work", "alert", 0.90),
        pattern!(r"(?i)(cpu|memory|disk) usage", "work", "alert", 0.85),
        pattern!(r"(?i)approval (needed|required)", "work", "notification", 0.85),
        pattern!(r"(?i)please approve", "work", "notification", 0.85),
        pattern!(r"(?i)test (results|failed|passed)", "work", "notification", 0.80),
        pattern!(r"(?i)invoice", "finance", "invoice", 0.88),
        pattern!(r"(?i)payment (received|failed|due)", "finance", "invoice", 0.88),
        pattern!(r"(?i)receipt", "finance", "receipt", 0.82),
        pattern!(r"(?i)your order (has shipped|is out for delivery)", "shopping", "shipping", 0.88),
        pattern!(r"(?i)tracking number", "shopping", "shipping", 0.85),
        pattern!(r"(?i)(flight|trip) (confirmation|itinerary)", "travel", "travel", 0.88),
        pattern!(r"(?i)check-?in reminder", "travel", "travel", 0.82),
        pattern!(r"(?i)calendar invite", "work", "calendar", 0.80),
        pattern!(r"(?i)meeting (invite|reminder)", "work", "calendar", 0.80),
        pattern!(r"(?i)(password reset|verify your (email|account)|2fa|two-factor)", "work", "security", 0.85),
        pattern!(r"(?i)new (login|sign-?in)", "work", "security", 0.83),
        pattern!(r"(?i)(tagged|mentioned|commented on) you", "social", "notification", 0.78),
        pattern!(r"(?i)(newsletter|weekly digest|unsubscribe)", "newsletter", "newsletter", 0.82),
        pattern!(r"(?i)(limited time|% off|sale ends|exclusive offer)", "marketing", "deal", 0.80),
        pattern!(r"^\s*\[(urgent|alert|warning)\]", "work", "alert", 0.85),
    ]
});

pub fn classify(subject: &str) -> Option<ClassificationResult> {
    let lower = subject.to_lowercase();

    for (re, score) in CRITICAL_RE.iter() {
        if re.is_match(&lower) {
            return Some(ClassificationResult::candidate("work", Some("alert"), *score, *score, "subject", "critical_phrase"));
        }
    }

    let mut best: Option<ClassificationResult> = None;
    for p in PATTERNS.iter() {
        if p.re.is_match(&lower) {
            let priority = (p.score + category_bonus(p.category)).clamp(0.0, 1.0);
            let candidate = ClassificationResult::candidate(p.category, Some(p.sub_category), priority, p.score, "subject", "pattern");
            if best.as_ref().map(|b| candidate.score > b.score).unwrap_or(true) {
                best = Some(candidate);
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn critical_phrase_short_circuits() {
        let result = classify("Production database is down").unwrap();
        assert_eq!(result.score, 0.99);
        assert_eq!(result.sub_category.as_deref(), Some("alert"));
    }

    #[test]
    fn server_down_alert_matches_worked_priority() {
        let result = classify("Production is down").unwrap();
        assert_eq!(result.category, "work");
        assert_eq!(result.sub_category.as_deref(), Some("alert"));
        assert_eq!(result.priority, 0.99);
    }

    #[test]
    fn invoice_subject_matches_finance() {
        let result = classify("Your invoice #1234 is ready").unwrap();
        assert_eq!(result.category, "finance");
        assert_eq!(result.sub_category.as_deref(), Some("invoice"));
    }

    #[test]
    fn no_match_returns_none() {
        assert!(classify("hello from a friend").is_none());
    }

    #[test]
    fn sub_categories_are_in_the_valid_enum() {
        const VALID: &[&str] = &[
            "receipt", "invoice", "shipping", "order", "travel", "calendar", "account", "security", "sns", "comment", "newsletter",
            "marketing", "deal", "notification", "alert", "developer",
        ];
        for p in PATTERNS.iter() {
            assert!(VALID.contains(&p.sub_category), "{} not a valid sub_category", p.sub_category);
        }
    }
}
