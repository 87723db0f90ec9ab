pub mod settings;
pub mod transport;

pub use settings::{ClinicSettings, SaveStatus, SettingField, SettingsClient};
pub use transport::{HttpTransport, SettingsTransport};
