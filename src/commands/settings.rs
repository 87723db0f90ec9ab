//! `clinic-desk settings ...` subcommands, driven through [`SettingsClient`].

use crate::client::{ClinicSettings, SettingField, SettingsClient, SettingsTransport};
use crate::error::AppError;

/// Fields to change in a bulk update. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.address.is_none() && self.phone.is_none() && self.email.is_none()
    }

    fn apply_to(self, base: &ClinicSettings) -> ClinicSettings {
        let mut next = base.clone();
        let fields = [
            (SettingField::Name, self.name),
            (SettingField::Address, self.address),
            (SettingField::Phone, self.phone),
            (SettingField::Email, self.email),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                next.set(field, value);
            }
        }
        next
    }
}

fn adapter_err<T: SettingsTransport>(client: &SettingsClient<T>, fallback: &str) -> AppError {
    AppError::Internal(client.error().unwrap_or(fallback).to_string())
}

/// Load and return the current clinic settings.
pub async fn show<T: SettingsTransport>(
    transport: T,
    defaults: ClinicSettings,
) -> Result<ClinicSettings, AppError> {
    let client = SettingsClient::open(transport, defaults).await;
    if client.error().is_some() {
        return Err(adapter_err(&client, "Failed to fetch settings"));
    }
    Ok(client.settings().clone())
}

/// Write one field and return the resulting record.
pub async fn set_field<T: SettingsTransport>(
    transport: T,
    defaults: ClinicSettings,
    field: SettingField,
    value: String,
) -> Result<ClinicSettings, AppError> {
    let mut client = SettingsClient::open(transport, defaults).await;
    if !client.update_single_setting(field, value).await {
        return Err(adapter_err(&client, "Failed to update setting"));
    }
    tracing::info!(field = %field, "Clinic setting updated");
    Ok(client.settings().clone())
}

/// Merge `patch` into the stored record and write every field back.
pub async fn update<T: SettingsTransport>(
    transport: T,
    defaults: ClinicSettings,
    patch: SettingsPatch,
) -> Result<ClinicSettings, AppError> {
    if patch.is_empty() {
        return Err(AppError::Validation("nothing to update".into()));
    }

    let mut client = SettingsClient::open(transport, defaults).await;
    if client.error().is_some() {
        // Only write back a record that was actually loaded from the store.
        return Err(adapter_err(&client, "Failed to fetch settings"));
    }

    let next = patch.apply_to(client.settings());
    if !client.update_settings(next).await {
        return Err(adapter_err(&client, "Failed to update settings"));
    }
    tracing::info!("Clinic settings updated");
    Ok(client.settings().clone())
}

/// Human-readable block for terminal output.
pub fn render(settings: &ClinicSettings) -> String {
    format!(
        "Name:    {}\nAddress: {}\nPhone:   {}\nEmail:   {}",
        settings.name, settings.address, settings.phone, settings.email
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::HttpTransport;
    use crate::db::init_test_db;
    use crate::db::repos::settings as repo;
    use crate::server;
    use tokio::net::TcpListener;
    use tokio::sync::watch;

    /// Serve a fresh store on an ephemeral port. Dropping the sender stops it.
    async fn spawn_server() -> (String, crate::db::DbPool, watch::Sender<bool>) {
        let pool = init_test_db().unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let (tx, rx) = watch::channel(false);
        tokio::spawn(server::serve(listener, pool.clone(), rx));
        (url, pool, tx)
    }

    #[tokio::test]
    async fn test_show_uses_defaults_for_empty_store() {
        let (url, _pool, _tx) = spawn_server().await;
        let settings = show(HttpTransport::new(url).unwrap(), ClinicSettings::default())
            .await
            .unwrap();
        assert_eq!(settings, ClinicSettings::default());
    }

    #[tokio::test]
    async fn test_set_field_and_update() {
        let (url, pool, _tx) = spawn_server().await;

        let after = set_field(
            HttpTransport::new(url.clone()).unwrap(),
            ClinicSettings::default(),
            SettingField::Phone,
            "0555000000".into(),
        )
        .await
        .unwrap();
        assert_eq!(after.phone, "0555000000");
        assert_eq!(repo::get(&pool, "clinicPhone").unwrap().as_deref(), Some("0555000000"));

        let after = update(
            HttpTransport::new(url).unwrap(),
            ClinicSettings::default(),
            SettingsPatch {
                name: Some("Smile Clinic".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(after.name, "Smile Clinic");
        assert_eq!(after.phone, "0555000000");
        assert_eq!(repo::get(&pool, "clinicName").unwrap().as_deref(), Some("Smile Clinic"));
        assert_eq!(repo::get(&pool, "clinicAddress").unwrap().as_deref(), Some("Ouargla"));
    }

    #[tokio::test]
    async fn test_update_refuses_when_load_fails() {
        let transport = HttpTransport::new("http://127.0.0.1:9").unwrap();
        let err = update(
            transport,
            ClinicSettings::default(),
            SettingsPatch {
                email: Some("desk@clinic.dz".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[tokio::test]
    async fn test_empty_patch_is_rejected() {
        let transport = HttpTransport::new("http://127.0.0.1:9").unwrap();
        let err = update(transport, ClinicSettings::default(), SettingsPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_render() {
        let text = render(&ClinicSettings::default());
        assert!(text.contains("Name:    Clinique"));
        assert!(text.contains("Email:   info@smiledentalclinic.com"));
    }
}
