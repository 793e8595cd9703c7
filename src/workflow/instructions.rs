//! Natural-language instructions issued by the workflow
//!
//! Instruction text is part of the cache key, so changing any of these
//! orphans the matching cache entries.

use pilot_core_types::{Instruction, Location};

pub const USERNAME_FIELD: &str = "the username field";
pub const PASSWORD_FIELD: &str = "the password field";
pub const LOGIN_BUTTON: &str = "the login button";
pub const CLICK_LOGIN: &str = "Click the login button";

pub const START_BUTTON: &str = "the Start button for an available online assessment";
pub const CLICK_START: &str = "Click the Start button for the next available online assessment";
pub const KEY_FIELD: &str = "the assessment key input field";
pub const VERIFY_BUTTON: &str =
    "the Verify button in the Student Online Assessment Key Verification prompt";
pub const CLICK_VERIFY: &str =
    "Click the Verify button in the Student Online Assessment Key Verification prompt";
pub const START_ASSESSMENT_BUTTON: &str = "the Start Assessment button";
pub const CLICK_START_ASSESSMENT: &str = "Click the Start Assessment button";

pub const SAVE_NEXT_BUTTON: &str = "the Save & Next button";
pub const CLICK_SAVE_NEXT: &str = "Click the Save & Next button";
pub const END_TEST_BUTTON: &str = "the End Test button";
pub const CLICK_END_TEST: &str = "Click the End Test button";
pub const CONFIRM_END_PROMPT: &str = "the Confirm End Online Assessment prompt";
pub const CONFIRM_YES_BUTTON: &str = "the Yes button in the Confirm End Online Assessment prompt";
pub const CLICK_CONFIRM_YES: &str = "Click the Yes button in the Confirm End Online Assessment prompt";

pub fn navigate_to(location: &Location) -> Instruction {
    Instruction::new(format!("Navigate to {location}"))
}

pub fn type_username(username: &str) -> Instruction {
    Instruction::new(format!("Type '{username}' in the username field"))
}

pub fn type_password(password: &str) -> Instruction {
    Instruction::new(format!("Type '{password}' in the password field"))
}

pub fn type_assessment_key(key: &str) -> Instruction {
    Instruction::new(format!("Type '{key}' in the assessment key field"))
}

pub fn select_option(option: &str) -> Instruction {
    Instruction::new(format!("Click the answer option \"{option}\""))
}
