use actix_web::HttpRequest;
use std::borrow::Cow;

use crate::models::RequestStatus;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Locale {
    En,
    Fr,
}

pub fn detect_locale(req: &HttpRequest) -> Locale {
    if let Some(lang) = req.query_string().split('&').find_map(|kv| {
        let mut it = kv.splitn(2, '=');
        let k = it.next()?;
        let v = it.next()?;
        if k == "lang" { Some(v) } else { None }
    }) {
        return match lang.to_ascii_lowercase().as_str() { "fr" | "fr-fr" | "fr-tn" => Locale::Fr, _ => Locale::En };
    }

    if let Some(h) = req.headers().get("Accept-Language").and_then(|v| v.to_str().ok()) {
        let hl = h.to_ascii_lowercase();
        if hl.starts_with("fr") { return Locale::Fr; }
    }

    Locale::En
}

pub fn status_label(locale: Locale, status: RequestStatus) -> Cow<'static, str> {
    match (locale, status) {
        (Locale::Fr, RequestStatus::Pending) => Cow::Borrowed("En attente"),
        (Locale::Fr, RequestStatus::Matched) => Cow::Borrowed("Confirmé"),
        (Locale::Fr, RequestStatus::Paid) => Cow::Borrowed("Payé"),
        (_, RequestStatus::Pending) => Cow::Borrowed("Pending"),
        (_, RequestStatus::Matched) => Cow::Borrowed("Confirmed"),
        (_, RequestStatus::Paid) => Cow::Borrowed("Paid"),
    }
}
