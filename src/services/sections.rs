//! Locating job-relevant sections inside free-form resume text.

use crate::models::job::{JobField, JobPosting};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

static FIELD_PATTERNS: Lazy<HashMap<JobField, Regex>> = Lazy::new(|| {
    JobField::ALL
        .iter()
        .filter_map(|field| section_pattern(field.as_str()).map(|re| (*field, re)))
        .collect()
});

static SKILL_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[,;/|\n]").expect("separator pattern is valid"));

/// The keyword, any run of whitespace or colons, then everything up to the
/// next `Heading:` line or the end of the text (shortest match wins).
fn section_pattern(keyword: &str) -> Option<Regex> {
    Regex::new(&format!(
        r"(?i){}[\s:]*([\s\S]+?)(?:\n[A-Z][a-z]+:|\z)",
        regex::escape(keyword)
    ))
    .ok()
}

fn capture_section(pattern: &Regex, text: &str) -> String {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Returns the trimmed body of the section introduced by `keyword`, or an
/// empty string when the keyword does not occur.
pub fn extract_section(text: &str, keyword: &str) -> String {
    match section_pattern(keyword) {
        Some(pattern) => capture_section(&pattern, text),
        None => String::new(),
    }
}

/// The five scoring sections of a resume. A section that cannot be located
/// falls back to the whole resume text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeSections {
    sections: HashMap<JobField, String>,
}

impl ResumeSections {
    pub fn from_text(text: &str) -> Self {
        let sections = JobField::ALL
            .iter()
            .map(|field| {
                let found = FIELD_PATTERNS
                    .get(field)
                    .map(|pattern| capture_section(pattern, text))
                    .unwrap_or_default();
                let body = if found.is_empty() {
                    text.to_string()
                } else {
                    found
                };
                (*field, body)
            })
            .collect();

        Self { sections }
    }

    pub fn get(&self, field: JobField) -> &str {
        self.sections.get(&field).map(String::as_str).unwrap_or("")
    }
}

/// Skills and tools the posting lists that never appear in the resume text.
/// Matching is case-insensitive; output keeps the posting's order and spelling.
pub fn missing_skills(job: &JobPosting, resume_text: &str) -> Vec<String> {
    let haystack = resume_text.to_lowercase();
    let mut seen = HashSet::new();

    [job.skills.as_str(), job.tools.as_str()]
        .iter()
        .flat_map(|list| SKILL_SEPARATORS.split(list))
        .map(|item| item.trim().trim_end_matches('.').trim())
        .filter(|item| !item.is_empty())
        .filter(|item| seen.insert(item.to_lowercase()))
        .filter(|item| !haystack.contains(&item.to_lowercase()))
        .map(str::to_string)
        .collect()
}
