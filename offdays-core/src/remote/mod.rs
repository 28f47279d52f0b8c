//! Best-effort mirroring of vacation bookings into an external calendar.

pub mod adapter;
pub mod auth;
pub mod google;

pub use adapter::{CalendarMirror, CalendarSync, MirrorEvent, SYNC_TIMEOUT};
pub use auth::{Credential, GoogleAuth, OauthSettings};
pub use google::GoogleCalendar;
