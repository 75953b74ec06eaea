// src/i18n.rs

use serde::{Deserialize, Serialize};

/// Cookie holding the user's language preference.
pub const LANG_COOKIE: &str = "hms_lang";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    En,
    Hi,
}

impl Lang {
    pub const SUPPORTED: [Lang; 2] = [Lang::En, Lang::Hi];

    /// Accepts `en`, `hi`, and region-tagged forms such as `en-IN`.
    pub fn from_code(code: &str) -> Option<Lang> {
        let primary = code
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match primary.as_str() {
            "en" => Some(Lang::En),
            "hi" => Some(Lang::Hi),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Hi => "hi",
        }
    }
}

/// Fallback texts shown when the backend gives no detail of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Msg {
    SessionExpired,
    InvalidCredentials,
    Forbidden,
    NotFound,
    Conflict,
    Validation,
    BackendUnavailable,
    Unexpected,
    ActionNotAvailable,
    DraftPrescriptionOpen,
}

pub fn text(lang: Lang, msg: Msg) -> &'static str {
    match (lang, msg) {
        (Lang::En, Msg::SessionExpired) => "Your session has expired. Please sign in again.",
        (Lang::En, Msg::InvalidCredentials) => "Incorrect username or password.",
        (Lang::En, Msg::Forbidden) => "You do not have permission to do this.",
        (Lang::En, Msg::NotFound) => "The requested record was not found.",
        (Lang::En, Msg::Conflict) => "The record was changed by someone else. Please refresh.",
        (Lang::En, Msg::Validation) => "Some of the submitted values are invalid.",
        (Lang::En, Msg::BackendUnavailable) => "The hospital server is not reachable right now.",
        (Lang::En, Msg::Unexpected) => "Something went wrong. Please try again.",
        (Lang::En, Msg::ActionNotAvailable) => "This action is not available for the appointment.",
        (Lang::En, Msg::DraftPrescriptionOpen) => {
            "Finish or cancel the draft prescription before closing the visit."
        }

        (Lang::Hi, Msg::SessionExpired) => "आपका सत्र समाप्त हो गया है। कृपया फिर से साइन इन करें।",
        (Lang::Hi, Msg::InvalidCredentials) => "उपयोगकर्ता नाम या पासवर्ड गलत है।",
        (Lang::Hi, Msg::Forbidden) => "आपको यह करने की अनुमति नहीं है।",
        (Lang::Hi, Msg::NotFound) => "अनुरोधित रिकॉर्ड नहीं मिला।",
        (Lang::Hi, Msg::Conflict) => "रिकॉर्ड किसी और ने बदल दिया है। कृपया रीफ़्रेश करें।",
        (Lang::Hi, Msg::Validation) => "भेजे गए कुछ मान अमान्य हैं।",
        (Lang::Hi, Msg::BackendUnavailable) => "अस्पताल सर्वर अभी उपलब्ध नहीं है।",
        (Lang::Hi, Msg::Unexpected) => "कुछ गलत हो गया। कृपया पुनः प्रयास करें।",
        (Lang::Hi, Msg::ActionNotAvailable) => "यह कार्रवाई इस अपॉइंटमेंट के लिए उपलब्ध नहीं है।",
        (Lang::Hi, Msg::DraftPrescriptionOpen) => {
            "विज़िट बंद करने से पहले ड्राफ़्ट पर्चा पूरा या रद्द करें।"
        }
    }
}
