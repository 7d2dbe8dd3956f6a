pub mod domain;
pub mod lifecycle;
pub mod memory;
pub mod ports;
pub mod reset_token;
pub mod service;
pub mod validation;

pub use domain::{
    AuthSession, ChatHistoryId, EducationAndEmployment, FamilyInfo, HousingSituation,
    ImmigrationInfo, LanguageAssessment, LanguageProficiency, Password, PersonalInfo, Profile,
    ProfileUpdate, SearchHistoryEntry, SocialIntegration, SupportNeeds, User,
};
pub use memory::InMemoryDatabase;
pub use ports::{DatabaseService, PasswordHasher, PortError, PortResult};
pub use service::{IssuedResetToken, ProfileService};
pub use validation::{FieldError, ValidationError};
