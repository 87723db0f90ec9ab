//! Canonical settings key constants for the `app_settings` table.
//!
//! Use these instead of raw string literals to prevent typo-based key mismatches.

/// Clinic display name.
pub const CLINIC_NAME: &str = "clinicName";

/// Clinic postal address.
pub const CLINIC_ADDRESS: &str = "clinicAddress";

/// Clinic contact phone number.
pub const CLINIC_PHONE: &str = "clinicPhone";

/// Clinic contact email.
pub const CLINIC_EMAIL: &str = "clinicEmail";
