use std::sync::Arc;

use anyhow::Result;

use offdays_core::ledger::VacationLedger;
use offdays_core::remote::{CalendarMirror, GoogleAuth, GoogleCalendar};
use offdays_core::store::{JsonFileStore, RecordStore};
use offdays_core::LedgerError;

use crate::config::ServerConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<VacationLedger>,
    /// Present only when Google OAuth is configured.
    auth: Option<Arc<GoogleAuth>>,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let store = Arc::new(JsonFileStore::new(config.data_file.clone()));
        // Verify the ledger document can be read at startup.
        let _ = store.load()?;

        let auth = config
            .google
            .clone()
            .map(|settings| Arc::new(GoogleAuth::new(settings)));

        let mut mirror = CalendarMirror::new(Arc::new(GoogleCalendar::new()));
        if let Some(auth) = &auth {
            mirror = mirror.with_auth(auth.clone());
        }

        let ledger = Arc::new(VacationLedger::new(store, mirror));
        Ok(AppState { ledger, auth })
    }

    pub fn google_auth(&self) -> Result<&Arc<GoogleAuth>, LedgerError> {
        self.auth.as_ref().ok_or_else(|| {
            LedgerError::Credential("Google Calendar credentials are not configured".into())
        })
    }
}
