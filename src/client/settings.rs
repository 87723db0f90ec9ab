//! Client-side adapter between the flat settings namespace and the
//! structured [`ClinicSettings`] record.
//!
//! The adapter owns its in-memory record. Loads fall back to the injected
//! defaults per missing key; writes update local state optimistically once
//! the endpoint acknowledges them. Public operations never return errors:
//! they report a success flag and record a human-readable message in
//! [`SettingsClient::error`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use super::transport::SettingsTransport;
use crate::db::settings_keys;
use crate::error::AppError;

const FETCH_FAILED: &str = "Failed to fetch settings";
const UPDATE_MANY_FAILED: &str = "Failed to update settings";
const UPDATE_ONE_FAILED: &str = "Failed to update setting";

// ============================================================================
// Structured record
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ClinicSettings {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
}

impl Default for ClinicSettings {
    fn default() -> Self {
        Self {
            name: "Clinique".into(),
            address: "Ouargla".into(),
            phone: "0660865034".into(),
            email: "info@smiledentalclinic.com".into(),
        }
    }
}

impl ClinicSettings {
    /// Project the flat store onto the record. Missing or empty keys take the
    /// value from `defaults`.
    pub fn from_flat(flat: &BTreeMap<String, String>, defaults: &ClinicSettings) -> Self {
        let mut settings = defaults.clone();
        for field in SettingField::ALL {
            if let Some(value) = flat.get(field.key()).filter(|v| !v.is_empty()) {
                settings.set(field, value.clone());
            }
        }
        settings
    }

    /// Flat key -> value pairs for every field.
    pub fn to_flat(&self) -> BTreeMap<String, String> {
        SettingField::ALL
            .iter()
            .map(|field| (field.key().to_string(), self.get(*field).to_string()))
            .collect()
    }

    pub fn get(&self, field: SettingField) -> &str {
        match field {
            SettingField::Name => &self.name,
            SettingField::Address => &self.address,
            SettingField::Phone => &self.phone,
            SettingField::Email => &self.email,
        }
    }

    pub fn set(&mut self, field: SettingField, value: String) {
        match field {
            SettingField::Name => self.name = value,
            SettingField::Address => self.address = value,
            SettingField::Phone => self.phone = value,
            SettingField::Email => self.email = value,
        }
    }
}

/// One field of [`ClinicSettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SettingField {
    Name,
    Address,
    Phone,
    Email,
}

impl SettingField {
    pub const ALL: [SettingField; 4] = [
        SettingField::Name,
        SettingField::Address,
        SettingField::Phone,
        SettingField::Email,
    ];

    /// The flat store key backing this field.
    pub fn key(self) -> &'static str {
        match self {
            SettingField::Name => settings_keys::CLINIC_NAME,
            SettingField::Address => settings_keys::CLINIC_ADDRESS,
            SettingField::Phone => settings_keys::CLINIC_PHONE,
            SettingField::Email => settings_keys::CLINIC_EMAIL,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SettingField::Name => "name",
            SettingField::Address => "address",
            SettingField::Phone => "phone",
            SettingField::Email => "email",
        }
    }
}

impl fmt::Display for SettingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SettingField {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SettingField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("Unknown setting field: {s}")))
    }
}

/// Outcome of the most recent write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    Idle,
    Success,
    Error,
}

// ============================================================================
// Adapter
// ============================================================================

pub struct SettingsClient<T> {
    transport: T,
    defaults: ClinicSettings,
    settings: ClinicSettings,
    loading: bool,
    error: Option<String>,
    last_save: SaveStatus,
}

impl<T: SettingsTransport> SettingsClient<T> {
    /// Build an adapter in the loading state without issuing a request.
    pub fn new(transport: T, defaults: ClinicSettings) -> Self {
        Self {
            transport,
            settings: defaults.clone(),
            defaults,
            loading: true,
            error: None,
            last_save: SaveStatus::Idle,
        }
    }

    /// Build an adapter and run the initial load.
    pub async fn open(transport: T, defaults: ClinicSettings) -> Self {
        let mut client = Self::new(transport, defaults);
        client.refetch().await;
        client
    }

    pub fn settings(&self) -> &ClinicSettings {
        &self.settings
    }

    pub fn defaults(&self) -> &ClinicSettings {
        &self.defaults
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn last_save(&self) -> SaveStatus {
        self.last_save
    }

    /// Reload from the endpoint. On failure the current record is kept.
    pub async fn refetch(&mut self) -> bool {
        self.loading = true;
        self.error = None;

        let ok = match self.transport.fetch_all().await {
            Ok(flat) => {
                self.settings = ClinicSettings::from_flat(&flat, &self.defaults);
                true
            }
            Err(e) => {
                tracing::warn!("{}: {}", FETCH_FAILED, e);
                self.error = Some(describe(&e, FETCH_FAILED));
                false
            }
        };

        self.loading = false;
        ok
    }

    /// Persist every field. Local state takes `new` only after the endpoint acknowledges.
    pub async fn update_settings(&mut self, new: ClinicSettings) -> bool {
        self.error = None;

        match self.transport.save_many(&new.to_flat()).await {
            Ok(()) => {
                self.settings = new;
                self.last_save = SaveStatus::Success;
                true
            }
            Err(e) => {
                tracing::warn!("{}: {}", UPDATE_MANY_FAILED, e);
                self.error = Some(describe(&e, UPDATE_MANY_FAILED));
                self.last_save = SaveStatus::Error;
                false
            }
        }
    }

    /// Persist one field and merge it into the local record.
    pub async fn update_single_setting(
        &mut self,
        field: SettingField,
        value: impl Into<String>,
    ) -> bool {
        self.error = None;
        let value = value.into();

        match self.transport.save_one(field.key(), &value).await {
            Ok(_) => {
                self.settings.set(field, value);
                self.last_save = SaveStatus::Success;
                true
            }
            Err(e) => {
                tracing::warn!(field = %field, "{}: {}", UPDATE_ONE_FAILED, e);
                self.error = Some(describe(&e, UPDATE_ONE_FAILED));
                self.last_save = SaveStatus::Error;
                false
            }
        }
    }
}

/// User-facing message for a failed operation.
fn describe(err: &AppError, fallback: &str) -> String {
    match err {
        AppError::Status(_) => fallback.to_string(),
        other => {
            let message = other.to_string();
            if message.trim().is_empty() {
                fallback.to_string()
            } else {
                message
            }
        }
    }
}
