//! crates/newcomer_core/src/validation.rs
//!
//! Required-field checks and normalisation for the profile.

use crate::domain::{
    EducationAndEmployment, FamilyInfo, HousingSituation, ImmigrationInfo, LanguageProficiency,
    PersonalInfo, SocialIntegration, User,
};

/// A single failing field, addressed by its dotted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

/// Every failing field of one validation pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("validation failed: {}", join_errors(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn paths(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.path.as_str()).collect()
    }
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} {}", e.path, e.message))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Collects failures while walking the profile.
#[derive(Default)]
struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    fn required(&mut self, path: &str, value: &str) {
        if value.is_empty() {
            self.errors.push(FieldError {
                path: path.to_string(),
                message: "is required".to_string(),
            });
        }
    }

    fn required_opt(&mut self, path: &str, value: Option<&str>) {
        self.required(path, value.unwrap_or_default());
    }

    fn present<T>(&mut self, path: &str, value: &Option<T>) {
        if value.is_none() {
            self.required(path, "");
        }
    }

    fn finish(self) -> Result<(), ValidationError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationError {
                errors: self.errors,
            })
        }
    }
}

impl User {
    /// Lowercases the fields that are stored case-insensitively.
    pub fn normalize(&mut self) {
        let personal = &mut self.personal_info;
        personal.first_name = personal.first_name.to_lowercase();
        personal.last_name = personal.last_name.to_lowercase();
        personal.email = personal.email.to_lowercase();
    }

    /// Checks every required field and reports all failures at once.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut checker = Checker::default();

        check_personal(&mut checker, &self.personal_info);
        if let Some(info) = &self.immigration_info {
            check_immigration(&mut checker, info);
        }
        if let Some(proficiency) = &self.language_proficiency {
            check_language(&mut checker, proficiency);
        }
        if let Some(education) = &self.education_and_employment {
            check_education(&mut checker, education);
        }
        if let Some(housing) = &self.housing_situation {
            check_housing(&mut checker, housing);
        }
        if let Some(family) = &self.family_info {
            check_family(&mut checker, family);
        }
        if let Some(social) = &self.social_integration {
            check_social(&mut checker, social);
        }

        checker.finish()
    }
}

fn check_personal(checker: &mut Checker, info: &PersonalInfo) {
    checker.required("personal_info.first_name", &info.first_name);
    checker.required("personal_info.last_name", &info.last_name);
    checker.present("personal_info.date_of_birth", &info.date_of_birth);
    checker.required("personal_info.email", &info.email);
    checker.required("personal_info.phone", &info.phone);
    if info.password.is_empty() {
        checker.required("personal_info.password", "");
    }
}

fn check_immigration(checker: &mut Checker, info: &ImmigrationInfo) {
    checker.required("immigration_info.country_of_origin", &info.country_of_origin);
    checker.required(
        "immigration_info.current_immigration_status",
        &info.current_immigration_status,
    );
    checker.present("immigration_info.date_of_immigration", &info.date_of_immigration);
    checker.required("immigration_info.visa_type", &info.visa_type);
    checker.required("immigration_info.type_of_status", &info.type_of_status);
}

fn check_language(checker: &mut Checker, proficiency: &LanguageProficiency) {
    for (i, assessment) in proficiency.assessment.iter().enumerate() {
        let prefix = format!("language_proficiency.assessment.{i}");
        checker.required(&format!("{prefix}.listening"), &assessment.listening);
        checker.required(&format!("{prefix}.reading"), &assessment.reading);
        checker.required(&format!("{prefix}.speaking"), &assessment.speaking);
        checker.required(&format!("{prefix}.writing"), &assessment.writing);
    }
}

fn check_education(checker: &mut Checker, education: &EducationAndEmployment) {
    checker.required(
        "education_and_employment.highest_level_of_education",
        &education.highest_level_of_education,
    );
    checker.required(
        "education_and_employment.previous_work_experience",
        &education.previous_work_experience,
    );
    checker.required("education_and_employment.aspirations", &education.aspirations);
}

fn check_housing(checker: &mut Checker, housing: &HousingSituation) {
    checker.required(
        "housing_situation.current_housing_situation",
        &housing.current_housing_situation,
    );
}

fn check_family(checker: &mut Checker, family: &FamilyInfo) {
    checker.required_opt("family_info.relationship", family.relationship.as_deref());
}

fn check_social(checker: &mut Checker, social: &SocialIntegration) {
    checker.required_opt(
        "social_integration.interests_and_hobbies",
        social.interests_and_hobbies.as_deref(),
    );
    checker.required_opt(
        "social_integration.preferred_social_activities",
        social.preferred_social_activities.as_deref(),
    );
}

#[cfg(test)]
mod tests {
    use crate::domain::fixtures;
    use crate::domain::{
        EducationAndEmployment, FamilyInfo, ImmigrationInfo, LanguageAssessment,
        LanguageProficiency, Password,
    };

    #[test]
    fn complete_personal_section_is_valid() {
        assert!(fixtures::user().validate().is_ok());
    }

    #[test]
    fn normalize_lowercases_names_and_email() {
        let mut user = fixtures::user();
        user.normalize();
        assert_eq!(user.personal_info.first_name, "amina");
        assert_eq!(user.personal_info.last_name, "diallo");
        assert_eq!(user.personal_info.email, "amina.diallo@example.com");
        assert_eq!(user.personal_info.phone, "+1 514 555 0199");
    }

    #[test]
    fn reports_every_missing_field() {
        let mut user = fixtures::user();
        user.personal_info.email.clear();
        user.personal_info.password = Password::plain("");
        user.family_info = Some(FamilyInfo::default());

        let err = user.validate().unwrap_err();
        assert_eq!(
            err.paths(),
            vec![
                "personal_info.email",
                "personal_info.password",
                "family_info.relationship",
            ]
        );
    }

    #[test]
    fn language_assessments_are_addressed_by_index() {
        let mut user = fixtures::user();
        let complete = LanguageAssessment {
            listening: "B2".to_string(),
            reading: "B2".to_string(),
            speaking: "B1".to_string(),
            writing: "B1".to_string(),
        };
        let mut partial = complete.clone();
        partial.writing.clear();
        user.language_proficiency = Some(LanguageProficiency {
            assessment: vec![complete, partial],
        });

        let err = user.validate().unwrap_err();
        assert_eq!(err.paths(), vec!["language_proficiency.assessment.1.writing"]);
        assert!(err.to_string().contains("is required"));
    }

    #[test]
    fn missing_birth_date_is_reported_with_other_failures() {
        let mut user = fixtures::user();
        user.personal_info.date_of_birth = None;
        user.personal_info.email.clear();

        let err = user.validate().unwrap_err();
        assert_eq!(
            err.paths(),
            vec!["personal_info.date_of_birth", "personal_info.email"]
        );
    }

    #[test]
    fn sections_parsed_with_missing_fields_fail_validation() {
        let mut user = fixtures::user();
        user.immigration_info = Some(
            serde_json::from_str::<ImmigrationInfo>(
                r#"{"country_of_origin":"Peru","current_immigration_status":"student",
                    "type_of_status":"temporary"}"#,
            )
            .unwrap(),
        );
        user.education_and_employment = Some(
            serde_json::from_str::<EducationAndEmployment>(r#"{"aspirations":"nurse"}"#).unwrap(),
        );

        let err = user.validate().unwrap_err();
        assert_eq!(
            err.paths(),
            vec![
                "immigration_info.date_of_immigration",
                "immigration_info.visa_type",
                "education_and_employment.highest_level_of_education",
                "education_and_employment.previous_work_experience",
            ]
        );
    }

    #[test]
    fn display_joins_every_failure() {
        let mut user = fixtures::user();
        user.personal_info.first_name.clear();
        user.personal_info.phone.clear();

        assert_eq!(
            user.validate().unwrap_err().to_string(),
            "validation failed: personal_info.first_name is required, \
             personal_info.phone is required"
        );
    }
}
