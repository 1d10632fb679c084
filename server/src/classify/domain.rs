//! Stage 0b: sender-domain lookup against a curated category map (§4.4).
//! Subdomain matches apply a 0.95 discount; priority combines the domain's
//! base score with the fixed per-category bonus.
use super::{category_bonus, ClassificationResult};

struct DomainEntry {
    domain: &'static str,
    category: &'static str,
    sub_category: &'static str,
    base_score: f64,
}

const DOMAIN_MAP: &[DomainEntry] = &[
    // developer
    DomainEntry { domain: "github.com", category: "work", sub_category: "developer", base_score: 0.90 },
    DomainEntry { domain: "gitlab.com", category: "work", sub_category: "developer", base_score: 0.90 },
    DomainEntry { domain: "vercel.com", category: "work", sub_category: "developer", base_score: 0.88 },
    DomainEntry { domain: "sentry.io", category: "work", sub_category: "developer", base_score: 0.88 },
    DomainEntry { domain: "atlassian.com", category: "work", sub_category: "developer", base_score: 0.87 },
    DomainEntry { domain: "linear.app", category: "work", sub_category: "developer", base_score: 0.87 },
    // finance
    DomainEntry { domain: "chase.com", category: "finance", sub_category: "account", base_score: 0.90 },
    DomainEntry { domain: "paypal.com", category: "finance", sub_category: "account", base_score: 0.88 },
    DomainEntry { domain: "stripe.com", category: "finance", sub_category: "account", base_score: 0.87 },
    DomainEntry { domain: "wellsfargo.com", category: "finance", sub_category: "account", base_score: 0.90 },
    DomainEntry { domain: "venmo.com", category: "finance", sub_category: "account", base_score: 0.85 },
    DomainEntry { domain: "kbstar.com", category: "finance", sub_category: "account", base_score: 0.30 },
    // shopping
    DomainEntry { domain: "amazon.com", category: "shopping", sub_category: "order", base_score: 0.85 },
    DomainEntry { domain: "ebay.com", category: "shopping", sub_category: "order", base_score: 0.83 },
    DomainEntry { domain: "etsy.com", category: "shopping", sub_category: "order", base_score: 0.82 },
    // travel
    DomainEntry { domain: "united.com", category: "travel", sub_category: "travel", base_score: 0.88 },
    DomainEntry { domain: "delta.com", category: "travel", sub_category: "travel", base_score: 0.88 },
    DomainEntry { domain: "airbnb.com", category: "travel", sub_category: "travel", base_score: 0.86 },
    DomainEntry { domain: "booking.com", category: "travel", sub_category: "travel", base_score: 0.85 },
    // social
    DomainEntry { domain: "facebook.com", category: "social", sub_category: "sns", base_score: 0.80 },
    DomainEntry { domain: "linkedin.com", category: "social", sub_category: "sns", base_score: 0.80 },
    DomainEntry { domain: "twitter.com", category: "social", sub_category: "sns", base_score: 0.78 },
    DomainEntry { domain: "instagram.com", category: "social", sub_category: "sns", base_score: 0.78 },
    // productivity
    DomainEntry { domain: "slack.com", category: "work", sub_category: "notification", base_score: 0.85 },
    DomainEntry { domain: "notion.so", category: "work", sub_category: "notification", base_score: 0.83 },
    DomainEntry { domain: "asana.com", category: "work", sub_category: "notification", base_score: 0.82 },
    DomainEntry { domain: "zoom.us", category: "work", sub_category: "notification", base_score: 0.82 },
];

pub fn classify(sender_domain: &str) -> Option<ClassificationResult> {
    let sender_domain = sender_domain.to_lowercase();

    let mut best: Option<(&DomainEntry, bool)> = None;
    for entry in DOMAIN_MAP {
        if sender_domain == entry.domain {
            best = Some((entry, false));
            break;
        }
        if sender_domain.ends_with(&format!(".{}", entry.domain)) {
            if best.is_none() {
                best = Some((entry, true));
            }
        }
    }

    let (entry, is_subdomain) = best?;
    let base = if is_subdomain { entry.base_score * 0.95 } else { entry.base_score };
    let priority = (base + category_bonus(entry.category)).clamp(0.0, 1.0);

    Some(ClassificationResult::candidate(entry.category, Some(entry.sub_category), priority, base, "domain", entry.domain))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_scores_full_base() {
        let result = classify("github.com").unwrap();
        assert_eq!(result.category, "work");
        assert_eq!(result.score, 0.90);
    }

    #[test]
    fn subdomain_applies_discount() {
        let result = classify("notifications.github.com").unwrap();
        assert_eq!(result.score, 0.90 * 0.95);
    }

    #[test]
    fn unknown_domain_returns_none() {
        assert!(classify("example.com").is_none());
    }

    #[test]
    fn priority_includes_category_bonus() {
        let result = classify("chase.com").unwrap();
        assert_eq!(result.priority, (0.90f64 + 0.15).clamp(0.0, 1.0));
    }

    #[test]
    fn known_bank_sender_matches_worked_priority() {
        let result = classify("kbstar.com").unwrap();
        assert_eq!(result.category, "finance");
        assert_eq!(result.sub_category.as_deref(), Some("account"));
        assert!((result.priority - 0.45).abs() < 1e-9);
    }

    #[test]
    fn sub_categories_are_in_the_valid_enum() {
        const VALID: &[&str] = &[
            "receipt", "invoice", "shipping", "order", "travel", "calendar", "account", "security", "sns", "comment", "newsletter",
            "marketing", "deal", "notification", "alert", "developer",
        ];
        for entry in DOMAIN_MAP {
            assert!(VALID.contains(&entry.sub_category), "{} not a valid sub_category", entry.sub_category);
        }
    }
}
