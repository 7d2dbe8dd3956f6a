//! crates/newcomer_core/src/domain.rs
//!
//! Defines the newcomer profile and all of its sections.
//! Sections are plain data; the rules that act on them live in `validation`
//! and `lifecycle`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of a chat-history record kept outside of the profile.
pub type ChatHistoryId = Uuid;

//=========================================================================================
// Password
//=========================================================================================

/// A password as it moves through the save pipeline.
///
/// `Plain` is what a caller sets; `Hashed` is what gets persisted. Only a
/// `Plain` password is hashed on save, so re-saving a stored user never
/// hashes the hash again.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Password {
    Plain(String),
    Hashed(String),
}

impl Password {
    pub fn plain(value: impl Into<String>) -> Self {
        Password::Plain(value.into())
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Password::Plain(value) | Password::Hashed(value) => value.is_empty(),
        }
    }

    pub fn is_hashed(&self) -> bool {
        matches!(self, Password::Hashed(_))
    }

    /// The stored hash, if the password has been through the save pipeline.
    pub fn hash(&self) -> Option<&str> {
        match self {
            Password::Hashed(hash) => Some(hash),
            Password::Plain(_) => None,
        }
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Password::Plain(_) => f.write_str("Password::Plain(<redacted>)"),
            Password::Hashed(_) => f.write_str("Password::Hashed(<redacted>)"),
        }
    }
}

//=========================================================================================
// Profile Sections
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    pub first_name: String,
    pub last_name: String,
    /// Required; absent only on input that has not passed validation.
    pub date_of_birth: Option<NaiveDate>,
    pub email: String,
    pub password: Password,
    pub phone: String,
    #[serde(default)]
    pub address: Option<String>,
}

/// Required strings deserialize to empty when absent so that validation,
/// not the JSON parser, reports them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImmigrationInfo {
    #[serde(default)]
    pub country_of_origin: String,
    #[serde(default)]
    pub current_immigration_status: String,
    #[serde(default)]
    pub date_of_immigration: Option<NaiveDate>,
    #[serde(default)]
    pub visa_type: String,
    #[serde(default)]
    pub type_of_status: String,
}

/// One self-assessed proficiency level per language skill.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageAssessment {
    #[serde(default)]
    pub listening: String,
    #[serde(default)]
    pub reading: String,
    #[serde(default)]
    pub speaking: String,
    #[serde(default)]
    pub writing: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageProficiency {
    #[serde(default)]
    pub assessment: Vec<LanguageAssessment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationAndEmployment {
    #[serde(default)]
    pub highest_level_of_education: String,
    #[serde(default)]
    pub previous_work_experience: String,
    #[serde(default)]
    pub aspirations: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HousingSituation {
    #[serde(default)]
    pub current_housing_situation: String,
    #[serde(default)]
    pub housing_preference: Option<String>,
}

/// `relationship` defaults to absent but is still required, so a family
/// section without it fails validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FamilyInfo {
    #[serde(default)]
    pub num_of_family_members: u32,
    #[serde(default)]
    pub relationship: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialIntegration {
    #[serde(default)]
    pub interests_and_hobbies: Option<String>,
    /// Activities the user prefers for meeting new people.
    #[serde(default)]
    pub preferred_social_activities: Option<String>,
    /// Cultural or social inclinations.
    #[serde(default)]
    pub ethos: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SupportNeeds {
    /// Challenges related to immigration and settlement.
    #[serde(default)]
    pub challenges: Option<String>,
    #[serde(default)]
    pub support_services: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub name: Option<String>,
    /// Free-form until a preference model exists.
    #[serde(default)]
    pub preferences: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHistoryEntry {
    #[serde(default)]
    pub search_query: Option<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl SearchHistoryEntry {
    pub fn new(search_query: Option<String>) -> Self {
        Self {
            search_query,
            timestamp: Utc::now(),
        }
    }
}

//=========================================================================================
// User
//=========================================================================================

/// The complete newcomer profile - the single aggregate of the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub user_id: Option<Uuid>,
    pub personal_info: PersonalInfo,
    #[serde(default)]
    pub immigration_info: Option<ImmigrationInfo>,
    #[serde(default)]
    pub language_proficiency: Option<LanguageProficiency>,
    #[serde(default)]
    pub education_and_employment: Option<EducationAndEmployment>,
    #[serde(default)]
    pub housing_situation: Option<HousingSituation>,
    #[serde(default)]
    pub family_info: Option<FamilyInfo>,
    #[serde(default)]
    pub social_integration: Option<SocialIntegration>,
    #[serde(default)]
    pub support_needs: Option<SupportNeeds>,
    #[serde(default)]
    pub profile: Option<Profile>,
    #[serde(default)]
    pub search_history: Vec<SearchHistoryEntry>,
    #[serde(default)]
    pub chat_history: Vec<ChatHistoryId>,
    #[serde(default)]
    pub profile_picture: Option<String>,
    /// SHA-256 hex digest of the outstanding reset token, never the raw token.
    #[serde(default)]
    pub password_reset_token: Option<String>,
    #[serde(default)]
    pub token_expires: Option<DateTime<Utc>>,
    /// Optimistic-concurrency counter. Bumped by every persisted write; a
    /// whole-profile update only succeeds against the version it read.
    #[serde(default)]
    pub version: i64,
}

impl User {
    /// A user with only the personal section filled in.
    pub fn new(personal_info: PersonalInfo) -> Self {
        Self {
            user_id: None,
            personal_info,
            immigration_info: None,
            language_proficiency: None,
            education_and_employment: None,
            housing_situation: None,
            family_info: None,
            social_integration: None,
            support_needs: None,
            profile: None,
            search_history: Vec::new(),
            chat_history: Vec::new(),
            profile_picture: None,
            password_reset_token: None,
            token_expires: None,
            version: 0,
        }
    }

    pub fn email(&self) -> &str {
        &self.personal_info.email
    }
}

/// A partial update of a stored profile. Present sections replace the stored
/// ones wholesale; absent sections are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub immigration_info: Option<ImmigrationInfo>,
    #[serde(default)]
    pub language_proficiency: Option<LanguageProficiency>,
    #[serde(default)]
    pub education_and_employment: Option<EducationAndEmployment>,
    #[serde(default)]
    pub housing_situation: Option<HousingSituation>,
    #[serde(default)]
    pub family_info: Option<FamilyInfo>,
    #[serde(default)]
    pub social_integration: Option<SocialIntegration>,
    #[serde(default)]
    pub support_needs: Option<SupportNeeds>,
    #[serde(default)]
    pub profile: Option<Profile>,
    #[serde(default)]
    pub profile_picture: Option<String>,
}

impl ProfileUpdate {
    /// Applies the update in place. Never touches the password, the id, the
    /// history lists or the reset token.
    pub fn apply_to(self, user: &mut User) {
        let personal = &mut user.personal_info;
        if let Some(first_name) = self.first_name {
            personal.first_name = first_name;
        }
        if let Some(last_name) = self.last_name {
            personal.last_name = last_name;
        }
        if self.date_of_birth.is_some() {
            personal.date_of_birth = self.date_of_birth;
        }
        if let Some(email) = self.email {
            personal.email = email;
        }
        if let Some(phone) = self.phone {
            personal.phone = phone;
        }
        if self.address.is_some() {
            personal.address = self.address;
        }
        if self.immigration_info.is_some() {
            user.immigration_info = self.immigration_info;
        }
        if self.language_proficiency.is_some() {
            user.language_proficiency = self.language_proficiency;
        }
        if self.education_and_employment.is_some() {
            user.education_and_employment = self.education_and_employment;
        }
        if self.housing_situation.is_some() {
            user.housing_situation = self.housing_situation;
        }
        if self.family_info.is_some() {
            user.family_info = self.family_info;
        }
        if self.social_integration.is_some() {
            user.social_integration = self.social_integration;
        }
        if self.support_needs.is_some() {
            user.support_needs = self.support_needs;
        }
        if self.profile.is_some() {
            user.profile = self.profile;
        }
        if self.profile_picture.is_some() {
            user.profile_picture = self.profile_picture;
        }
    }
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}
