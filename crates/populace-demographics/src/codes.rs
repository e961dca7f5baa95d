//! Fixed lookup tables from reference-record codes to attribute labels.
//!
//! Codes follow the census public-use microdata conventions. Numeric codes
//! are normalized before lookup, so `"01"` and `"1"` resolve the same way.
//! A blank or `NA` code resolves to the table's missing label when it has
//! one. Any other code without an entry resolves to `None` and the
//! corresponding attribute is left unset.

/// A code table with an optional label for missing codes.
#[derive(Debug, Clone, Copy)]
pub struct CodeTable {
    /// `(code, label)` pairs.
    entries: &'static [(u32, &'static str)],
    /// Label used when the code is blank or `NA`.
    missing: Option<&'static str>,
}

impl CodeTable {
    /// Resolve a raw code to its label.
    pub fn resolve(&self, raw: &str) -> Option<&'static str> {
        match normalize(raw) {
            Code::Missing => self.missing,
            Code::Value(code) => self
                .entries
                .iter()
                .find(|(entry, _)| *entry == code)
                .map(|(_, label)| *label),
            Code::Invalid => None,
        }
    }
}

/// A normalized reference code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code {
    /// Blank, `NA`, or `b` (the microdata "not applicable" marker).
    Missing,
    /// A numeric code.
    Value(u32),
    /// Anything else.
    Invalid,
}

/// Normalize a raw code.
pub fn normalize(raw: &str) -> Code {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("na") || trimmed == "b" {
        return Code::Missing;
    }
    trimmed.parse::<u32>().map_or(Code::Invalid, Code::Value)
}

/// `RAC1P`: race. Hispanic origin is a separate code.
pub const RACE: CodeTable = CodeTable {
    entries: &[
        (1, "white"),
        (2, "black"),
        (3, "native"),
        (4, "native"),
        (5, "native"),
        (6, "asian"),
        (7, "asian"),
        (8, "other"),
        (9, "other"),
    ],
    missing: None,
};

/// `SEX`.
pub const SEX: CodeTable = CodeTable {
    entries: &[(1, "M"), (2, "F")],
    missing: None,
};

/// `NATIVITY`.
pub const NATIVITY: CodeTable = CodeTable {
    entries: &[(1, "native"), (2, "foreign_born")],
    missing: None,
};

/// `SCH`: school enrollment.
pub const SCHOOL_ENROLLMENT: CodeTable = CodeTable {
    entries: &[
        (1, "no"),
        (2, "public_school_or_public_college"),
        (3, "private_school_or_college_or_home_school"),
    ],
    missing: Some("N/A (less than 3 years old)"),
};

/// `SCHG`: grade level attending.
pub const GRADE_LEVEL: CodeTable = CodeTable {
    entries: &[
        (1, "nursery_school_or_preschool"),
        (2, "kindergarten"),
        (3, "grade_1"),
        (4, "grade_2"),
        (5, "grade_3"),
        (6, "grade_4"),
        (7, "grade_5"),
        (8, "grade_6"),
        (9, "grade_7"),
        (10, "grade_8"),
        (11, "grade_9"),
        (12, "grade_10"),
        (13, "grade_11"),
        (14, "grade_12"),
        (15, "college_undergraduate"),
        (16, "graduate_or_professional_school"),
    ],
    missing: Some("not_attending_school"),
};

/// `RELP`: relationship to the household reference person.
pub const RELATIONSHIP: CodeTable = CodeTable {
    entries: &[
        (0, "reference_person"),
        (1, "husband_or_wife"),
        (2, "biological_son_or_daughter"),
        (3, "adopted_son_or_daughter"),
        (4, "stepson_or_stepdaughter"),
        (5, "brother_or_sister"),
        (6, "father_or_mother"),
        (7, "grandchild"),
        (8, "parent_in_law"),
        (9, "son_in_law_or_daughter_in_law"),
        (10, "other_relative"),
        (11, "roomer_or_boarder"),
        (12, "housemate_or_roommate"),
        (13, "unmarried_partner"),
        (14, "foster_child"),
        (15, "other_nonrelative"),
        (16, "institutionalized_group_quarters_population"),
        (17, "noninstitutionalized_group_quarters_population"),
    ],
    missing: None,
};

/// `ESR`: employment status recode.
pub const EMPLOYMENT_STATUS: CodeTable = CodeTable {
    entries: &[
        (1, "civilian_employed_at_work"),
        (2, "civilian_employed_with_job_but_not_at_work"),
        (3, "unemployed"),
        (4, "armed_forces_at_work"),
        (5, "armed_forces_with_job_but_not_at_work"),
        (6, "not_in_labor_force"),
    ],
    missing: Some("na_under_16"),
};

/// `HISP`: detailed Hispanic origin. Code 1 means not Hispanic and has no
/// ethnicity entry.
pub const HISPANIC_ORIGIN: CodeTable = CodeTable {
    entries: &[
        (2, "mexican"),
        (3, "puerto_rican"),
        (4, "cuban"),
        (5, "dominican"),
        (6, "costa_rican"),
        (7, "guatemalan"),
        (8, "honduran"),
        (9, "nicaraguan"),
        (10, "panamanian"),
        (11, "salvadoran"),
        (12, "central_american"),
        (13, "argentinean"),
        (14, "bolivian"),
        (15, "chilean"),
        (16, "colombian"),
        (17, "ecuadorian"),
        (18, "paraguayan"),
        (19, "peruvian"),
        (20, "uruguayan"),
        (21, "venezuelan"),
        (22, "south_american"),
        (23, "spaniard"),
        (24, "other_hispanic"),
    ],
    missing: None,
};

/// The `HISP` code for "not Spanish, Hispanic, or Latino".
pub const NOT_HISPANIC: u32 = 1;

/// `POBP`: place of birth.
pub const BIRTHPLACE: CodeTable = CodeTable {
    entries: &[
        (1, "Alabama"),
        (2, "Alaska"),
        (4, "Arizona"),
        (5, "Arkansas"),
        (6, "California"),
        (8, "Colorado"),
        (9, "Connecticut"),
        (10, "Delaware"),
        (11, "District of Columbia"),
        (12, "Florida"),
        (13, "Georgia"),
        (15, "Hawaii"),
        (16, "Idaho"),
        (17, "Illinois"),
        (18, "Indiana"),
        (19, "Iowa"),
        (20, "Kansas"),
        (21, "Kentucky"),
        (22, "Louisiana"),
        (23, "Maine"),
        (24, "Maryland"),
        (25, "Massachusetts"),
        (26, "Michigan"),
        (27, "Minnesota"),
        (28, "Mississippi"),
        (29, "Missouri"),
        (30, "Montana"),
        (31, "Nebraska"),
        (32, "Nevada"),
        (33, "New Hampshire"),
        (34, "New Jersey"),
        (35, "New Mexico"),
        (36, "New York"),
        (37, "North Carolina"),
        (38, "North Dakota"),
        (39, "Ohio"),
        (40, "Oklahoma"),
        (41, "Oregon"),
        (42, "Pennsylvania"),
        (44, "Rhode Island"),
        (45, "South Carolina"),
        (46, "South Dakota"),
        (47, "Tennessee"),
        (48, "Texas"),
        (49, "Utah"),
        (50, "Vermont"),
        (51, "Virginia"),
        (53, "Washington"),
        (54, "West Virginia"),
        (55, "Wisconsin"),
        (56, "Wyoming"),
        (72, "Puerto Rico"),
        (110, "Germany"),
        (119, "Ireland"),
        (120, "Italy"),
        (128, "Poland"),
        (129, "Portugal"),
        (138, "United Kingdom"),
        (207, "China"),
        (210, "India"),
        (217, "Korea"),
        (233, "Philippines"),
        (247, "Vietnam"),
        (301, "Canada"),
        (303, "Mexico"),
        (312, "El Salvador"),
        (313, "Guatemala"),
        (327, "Cuba"),
        (329, "Dominican Republic"),
        (332, "Haiti"),
        (333, "Jamaica"),
        (362, "Brazil"),
        (364, "Colombia"),
    ],
    missing: None,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_strips_leading_zeros() {
        assert_eq!(normalize("01"), Code::Value(1));
        assert_eq!(normalize(" 7 "), Code::Value(7));
        assert_eq!(normalize("NA"), Code::Missing);
        assert_eq!(normalize(""), Code::Missing);
        assert_eq!(normalize("x1"), Code::Invalid);
    }

    #[test]
    fn race_codes_collapse_to_categories() {
        assert_eq!(RACE.resolve("1"), Some("white"));
        assert_eq!(RACE.resolve("4"), Some("native"));
        assert_eq!(RACE.resolve("7"), Some("asian"));
        assert_eq!(RACE.resolve("9"), Some("other"));
    }

    #[test]
    fn unknown_codes_leave_attribute_unset() {
        assert_eq!(RACE.resolve("42"), None);
        assert_eq!(SEX.resolve("NA"), None);
        assert_eq!(BIRTHPLACE.resolve("999"), None);
    }

    #[test]
    fn missing_codes_use_table_label() {
        assert_eq!(SCHOOL_ENROLLMENT.resolve("NA"), Some("N/A (less than 3 years old)"));
        assert_eq!(GRADE_LEVEL.resolve(""), Some("not_attending_school"));
        assert_eq!(EMPLOYMENT_STATUS.resolve("b"), Some("na_under_16"));
    }

    #[test]
    fn grade_sixteen_is_graduate_school() {
        assert_eq!(GRADE_LEVEL.resolve("1"), Some("nursery_school_or_preschool"));
        assert_eq!(GRADE_LEVEL.resolve("16"), Some("graduate_or_professional_school"));
    }

    #[test]
    fn hispanic_origin_skips_not_hispanic() {
        assert_eq!(HISPANIC_ORIGIN.resolve("01"), None);
        assert_eq!(HISPANIC_ORIGIN.resolve("02"), Some("mexican"));
    }
}
