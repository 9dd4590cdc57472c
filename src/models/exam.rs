// src/models/exam.rs

use serde::Serialize;

/// A department and the subjects a candidate sits in it.
#[derive(Debug, Clone, Serialize)]
pub struct Department {
    pub name: &'static str,
    pub subjects: &'static [&'static str],
}

/// An exam the platform offers practice for.
#[derive(Debug, Clone, Serialize)]
pub struct ExamOption {
    pub code: &'static str,
    pub name: &'static str,
    pub country: &'static str,
    pub departments: &'static [Department],
}

const WEST_AFRICAN_SCIENCE: &[&str] = &[
    "Mathematics",
    "Physics",
    "Chemistry",
    "Biology",
    "English Language",
];
const WEST_AFRICAN_COMMERCIAL: &[&str] = &[
    "Mathematics",
    "Economics",
    "Accounting",
    "Commerce",
    "English Language",
];
const WEST_AFRICAN_ART: &[&str] = &[
    "Mathematics",
    "Literature in English",
    "Government",
    "History",
    "English Language",
];

const WEST_AFRICAN_DEPARTMENTS: &[Department] = &[
    Department { name: "Science", subjects: WEST_AFRICAN_SCIENCE },
    Department { name: "Commercial", subjects: WEST_AFRICAN_COMMERCIAL },
    Department { name: "Art", subjects: WEST_AFRICAN_ART },
];

const WASSCE_DEPARTMENTS: &[Department] = &[
    Department {
        name: "Science",
        subjects: &["Core Mathematics", "Physics", "Chemistry", "Biology", "English Language"],
    },
    Department {
        name: "Commercial",
        subjects: &[
            "Core Mathematics",
            "Economics",
            "Accounting",
            "Business Management",
            "English Language",
        ],
    },
    Department {
        name: "Art",
        subjects: &["Core Mathematics", "Literature", "Government", "History", "English Language"],
    },
];

const GCSE_DEPARTMENTS: &[Department] = &[
    Department { name: "Science", subjects: WEST_AFRICAN_SCIENCE },
    Department {
        name: "Business",
        subjects: &["Mathematics", "Business Studies", "Economics", "Accounting", "English Language"],
    },
    Department {
        name: "Humanities",
        subjects: &["Mathematics", "English Literature", "History", "Geography", "English Language"],
    },
];

/// Exams with practice content, in display order.
pub const EXAM_CATALOG: &[ExamOption] = &[
    ExamOption {
        code: "JAMB",
        name: "Unified Tertiary Matriculation Examination",
        country: "Nigeria",
        departments: WEST_AFRICAN_DEPARTMENTS,
    },
    ExamOption {
        code: "WAEC",
        name: "West African Senior School Certificate Examination",
        country: "Nigeria",
        departments: WEST_AFRICAN_DEPARTMENTS,
    },
    ExamOption {
        code: "NECO",
        name: "National Examinations Council SSCE",
        country: "Nigeria",
        departments: WEST_AFRICAN_DEPARTMENTS,
    },
    ExamOption {
        code: "WASSCE",
        name: "West African Senior School Certificate Examination",
        country: "Ghana",
        departments: WASSCE_DEPARTMENTS,
    },
    ExamOption {
        code: "GCSE",
        name: "General Certificate of Secondary Education",
        country: "United Kingdom",
        departments: GCSE_DEPARTMENTS,
    },
    ExamOption {
        code: "SAT",
        name: "Scholastic Assessment Test",
        country: "United States",
        departments: &[Department {
            name: "General",
            subjects: &["Evidence-Based Reading and Writing", "Mathematics"],
        }],
    },
    ExamOption {
        code: "ACT",
        name: "American College Testing",
        country: "United States",
        departments: &[Department {
            name: "General",
            subjects: &["English", "Mathematics", "Reading", "Science"],
        }],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_codes_are_unique() {
        let mut codes: Vec<&str> = EXAM_CATALOG.iter().map(|e| e.code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), EXAM_CATALOG.len());
    }

    #[test]
    fn test_every_department_lists_subjects() {
        for exam in EXAM_CATALOG {
            assert!(!exam.departments.is_empty(), "{} has no departments", exam.code);
            assert!(exam.departments.iter().all(|d| !d.subjects.is_empty()));
        }
        let wassce = EXAM_CATALOG.iter().find(|e| e.code == "WASSCE").unwrap();
        assert!(wassce.departments[0].subjects.contains(&"Core Mathematics"));
    }
}
