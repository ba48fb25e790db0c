//! VCSP endpoint paths, relative to `vcsp/v1`. Placeholders are filled with
//! `crate::endpoints::render`.

pub const ALIVE: &str = crate::endpoints::ALIVE;
pub const ENROLLMENTS: &str = "enrollments";
pub const ENROLLMENTS_BATCH: &str = "enrollments/batch";
pub const ACCOUNTS: &str = "accounts/<subject_id>";
pub const CREDENTIALS: &str = "accounts/<subject_id>/credentials";
pub const CREDENTIAL_ID: &str = "accounts/<subject_id>/credentials/<credential_id>";
pub const GROUPS: &str = "groups";
pub const GROUP_NAME: &str = "groups/<group_name>";
pub const MATCHINGS: &str = "matchings";
pub const CREDENTIAL_CONFIGURATIONS: &str = "credential_configurations";
pub const CREDENTIAL_CONFIGURATION_URN: &str = "credential_configurations/<urn>";
pub const ASSURANCE_METHODS: &str = "assurance_methods";
pub const ASSURANCE_METHOD_URN: &str = "assurance_methods/<urn>";
pub const TAGS: &str = "tags";
pub const TAGS_NAME: &str = "tags/<tag_name>";
pub const TASKS: &str = "tasks";
pub const TASK_ID: &str = "tasks/<task_id>";
pub const TASK_RESULT: &str = "tasks/<task_id>/result";
