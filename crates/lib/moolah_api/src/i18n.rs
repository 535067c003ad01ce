//! Translated user-facing messages.

use std::fmt;
use std::str::FromStr;

use moolah_core::error::MessageKey;
use serde::{Deserialize, Serialize};

/// Supported locales.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
}

impl Locale {
    pub const ALL: [Locale; 2] = [Locale::En, Locale::Es];

    pub fn as_str(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Es => "es",
        }
    }

    /// Best match from an `Accept-Language` value, or the default locale.
    pub fn from_accept_language(header: &str) -> Self {
        header
            .split(',')
            .filter_map(|part| part.split(';').next())
            .filter_map(|tag| tag.trim().split('-').next())
            .find_map(|lang| lang.parse().ok())
            .unwrap_or_default()
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "es" => Ok(Locale::Es),
            other => Err(format!("unsupported locale: {other}")),
        }
    }
}

/// Message lookup used at the RPC boundary.
pub trait Translator: Send + Sync {
    fn message(&self, key: MessageKey, locale: Locale) -> String;
}

/// Built-in English and Spanish tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct Messages;

impl Translator for Messages {
    fn message(&self, key: MessageKey, locale: Locale) -> String {
        match locale {
            Locale::En => en(key),
            Locale::Es => es(key),
        }
        .to_string()
    }
}

/// Returns the key itself. Enough for tests that only assert on codes.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyEcho;

impl Translator for KeyEcho {
    fn message(&self, key: MessageKey, _locale: Locale) -> String {
        key.as_str().to_string()
    }
}

fn en(key: MessageKey) -> &'static str {
    match key {
        MessageKey::Fallback => "Operation successful.",
        MessageKey::ExceptionFallback => "An unexpected error occurred. Please try again later.",
        MessageKey::BadRequest => "Something's missing or incorrect. Please check and try again.",
        MessageKey::Unauthorized => "You need to sign in to access this.",
        MessageKey::Forbidden => "You don't have permission to do this.",
        MessageKey::NotFound => "We couldn't find what you were looking for.",
        MessageKey::Conflict => "There's a conflict with something. Please try again.",
        MessageKey::TooManyRequests => "Too many requests. Please try again later.",
        MessageKey::InternalServerError => {
            "Something went wrong on our end. We're looking into it."
        }
        MessageKey::ServiceUnavailable => {
            "Service is currently unavailable. Please try again later."
        }
        MessageKey::AdminAccessRequired => "Access denied: Admin access required.",
    }
}

fn es(key: MessageKey) -> &'static str {
    match key {
        MessageKey::Fallback => "Operación exitosa.",
        MessageKey::ExceptionFallback => {
            "Ocurrió un error inesperado. Inténtalo de nuevo más tarde."
        }
        MessageKey::BadRequest => {
            "Algo falta o es incorrecto. Por favor revisa e intenta de nuevo."
        }
        MessageKey::Unauthorized => "Necesitas iniciar sesión para acceder a esto.",
        MessageKey::Forbidden => "No tienes permiso para hacer esto.",
        MessageKey::NotFound => "No pudimos encontrar lo que buscabas.",
        MessageKey::Conflict => "Hay un conflicto. Por favor intenta de nuevo.",
        MessageKey::TooManyRequests => "Demasiadas solicitudes. Intenta de nuevo más tarde.",
        MessageKey::InternalServerError => {
            "Algo salió mal de nuestro lado. Lo estamos investigando."
        }
        MessageKey::ServiceUnavailable => {
            "El servicio no está disponible. Intenta de nuevo más tarde."
        }
        MessageKey::AdminAccessRequired => {
            "Acceso denegado: se requiere acceso de administrador."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_is_translated_in_every_locale() {
        for locale in Locale::ALL {
            for key in MessageKey::ALL {
                assert!(!Messages.message(key, locale).is_empty(), "{key} / {locale}");
            }
        }
        assert_ne!(
            Messages.message(MessageKey::Forbidden, Locale::En),
            Messages.message(MessageKey::Forbidden, Locale::Es)
        );
    }

    #[test]
    fn admin_refusal_has_its_own_message() {
        for locale in Locale::ALL {
            assert_ne!(
                Messages.message(MessageKey::AdminAccessRequired, locale),
                Messages.message(MessageKey::Forbidden, locale)
            );
        }
        assert_eq!(
            Messages.message(MessageKey::AdminAccessRequired, Locale::Es),
            "Acceso denegado: se requiere acceso de administrador."
        );
    }

    #[test]
    fn accept_language_picks_first_supported() {
        assert_eq!(Locale::from_accept_language("es-MX,es;q=0.9,en;q=0.8"), Locale::Es);
        assert_eq!(Locale::from_accept_language("fr-FR, es;q=0.5"), Locale::Es);
        assert_eq!(Locale::from_accept_language("de"), Locale::En);
        assert_eq!(Locale::from_accept_language(""), Locale::En);
    }
}
