//! Profile landing view shown after sign-up or with the `profile` command.

use mediaid_core::{ProfileItem, UserProfile};

const MISSING: &str = "-";

fn text(value: Option<&String>) -> &str {
    value.map(String::as_str).filter(|v| !v.is_empty()).unwrap_or(MISSING)
}

fn number(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(value) => format!("{value:.1}{unit}"),
        None => MISSING.to_string(),
    }
}

fn item_line(item: &ProfileItem) -> String {
    let name = text(item.name.as_ref());
    match (item.cui.as_ref(), item.status.as_ref()) {
        (Some(cui), Some(status)) => format!("  - {name} (CUI: {cui}) [{status}]"),
        (Some(cui), None) => format!("  - {name} (CUI: {cui})"),
        (None, Some(status)) => format!("  - {name} [{status}]"),
        (None, None) => format!("  - {name}"),
    }
}

/// Plain text lines for a fetched profile.
pub fn render_profile(profile: &UserProfile) -> Vec<String> {
    let mut lines = Vec::new();

    let basic = profile.basic_info.clone().unwrap_or_default();
    lines.push("Basic info".to_string());
    lines.push(format!("  Username: {}", text(basic.username.as_ref())));
    lines.push(format!("  Email: {}", text(basic.email.as_ref())));
    lines.push(format!("  Date of birth: {}", text(basic.date_of_birth.as_ref())));
    lines.push(format!("  Gender: {}", text(basic.gender.as_ref())));
    lines.push(format!("  Height: {}", number(basic.height, " cm")));
    lines.push(format!("  Weight: {}", number(basic.weight, " kg")));
    let bmi = match (basic.bmi, basic.bmi_category.as_ref()) {
        (Some(bmi), Some(category)) => format!("{bmi:.2} ({category})"),
        (bmi, _) => number(bmi, ""),
    };
    lines.push(format!("  BMI: {bmi}"));

    if let Some(risk) = &profile.risk_factors {
        lines.push("Risk".to_string());
        lines.push(format!("  Risk level: {}", text(risk.risk_level.as_ref())));
        lines.push(format!("  Overall score: {}", number(risk.overall_risk_score, "")));
    }

    if let Some(stats) = &profile.stats {
        let count = |value: Option<u32>| value.map(|v| v.to_string()).unwrap_or_else(|| MISSING.into());
        lines.push("Summary".to_string());
        lines.push(format!("  Active medications: {}", count(stats.active_medications)));
        lines.push(format!("  Active conditions: {}", count(stats.active_diseases)));
        if let Some(completeness) = stats.profile_completeness {
            lines.push(format!("  Profile completeness: {completeness:.0}%"));
        }
    }

    lines.push(format!("Medications ({})", profile.medications.len()));
    lines.extend(profile.medications.iter().map(item_line));
    lines.push(format!("Medical history ({})", profile.diseases.len()));
    lines.extend(profile.diseases.iter().map(item_line));

    lines
}
