use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The structured fields shared by job postings and resume sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobField {
    Skills,
    Experience,
    Education,
    Tools,
    Description,
}

impl JobField {
    /// Scoring order.
    pub const ALL: [JobField; 5] = [
        JobField::Skills,
        JobField::Experience,
        JobField::Education,
        JobField::Tools,
        JobField::Description,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            JobField::Skills => "skills",
            JobField::Experience => "experience",
            JobField::Education => "education",
            JobField::Tools => "tools",
            JobField::Description => "description",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub skills: String,
    pub experience: String,
    pub education: String,
    pub tools: String,
    pub description: String,
}

impl JobPosting {
    /// Builds a posting from raw form fields. Returns `None` when any field is
    /// missing or blank. Values are trimmed.
    pub fn from_fields(fields: &HashMap<String, String>) -> Option<Self> {
        let take = |field: JobField| -> Option<String> {
            fields
                .get(field.as_str())
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Some(JobPosting {
            skills: take(JobField::Skills)?,
            experience: take(JobField::Experience)?,
            education: take(JobField::Education)?,
            tools: take(JobField::Tools)?,
            description: take(JobField::Description)?,
        })
    }

    pub fn field(&self, field: JobField) -> &str {
        match field {
            JobField::Skills => &self.skills,
            JobField::Experience => &self.experience,
            JobField::Education => &self.education,
            JobField::Tools => &self.tools,
            JobField::Description => &self.description,
        }
    }

    /// All fields joined with single spaces, in scoring order.
    pub fn combined_text(&self) -> String {
        JobField::ALL
            .iter()
            .map(|f| self.field(*f))
            .collect::<Vec<_>>()
            .join(" ")
    }
}
