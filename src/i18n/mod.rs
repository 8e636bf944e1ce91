//! Response language negotiation and status-message translation
//!
//! The language is resolved once per request: `?lang=` first, then the
//! leading tag of `Accept-Language`, then the configured default. Unknown
//! codes fall back silently. Translation never fails; a key missing from
//! the table is returned verbatim.

use serde::Serialize;
use std::fmt;

/// Languages with a status-message table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    #[default]
    Fr,
    Es,
    En,
    It,
    Maya,
}

const ALL: [Lang; 5] = [Lang::Fr, Lang::Es, Lang::En, Lang::It, Lang::Maya];

impl Lang {
    /// Parse a supported language code (case-insensitive)
    pub fn from_code(code: &str) -> Option<Lang> {
        let code = code.trim().to_ascii_lowercase();
        ALL.iter().copied().find(|lang| lang.code() == code)
    }

    pub fn code(&self) -> &'static str {
        match self {
            Lang::Fr => "fr",
            Lang::Es => "es",
            Lang::En => "en",
            Lang::It => "it",
            Lang::Maya => "maya",
        }
    }

    pub fn supported_codes() -> Vec<&'static str> {
        ALL.iter().map(|lang| lang.code()).collect()
    }

    /// Resolve the working language for a request
    pub fn resolve(query: Option<&str>, accept_language: Option<&str>, default: Lang) -> Lang {
        if let Some(code) = query.filter(|q| !q.trim().is_empty()) {
            return Lang::from_code(code).unwrap_or(default);
        }

        accept_language
            .and_then(first_language_tag)
            .and_then(Lang::from_code)
            .unwrap_or(default)
    }

    /// Translate a status-message key; unknown keys come back unchanged
    pub fn translate<'a>(&self, key: &'a str) -> &'a str {
        lookup(*self, key).unwrap_or(key)
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// First tag of an Accept-Language header, without quality parameters
fn first_language_tag(header: &str) -> Option<&str> {
    let first = header.split(',').next()?;
    let tag = first.split(';').next()?.trim();
    if tag.is_empty() {
        None
    } else {
        Some(tag)
    }
}

fn lookup(lang: Lang, key: &str) -> Option<&'static str> {
    let message = match (lang, key) {
        (Lang::Fr, "not_found") => "Non trouvé",
        (Lang::Fr, "bad_request") => "Requête invalide",
        (Lang::Fr, "unauthorized") => "Non autorisé",
        (Lang::Fr, "forbidden") => "Accès refusé",
        (Lang::Fr, "created") => "Créé avec succès",
        (Lang::Fr, "updated") => "Mis à jour avec succès",
        (Lang::Fr, "deleted") => "Supprimé avec succès",
        (Lang::Fr, "sequence_not_found") => "Séquence non trouvée",
        (Lang::Fr, "resource_not_found") => "Ressource non trouvée",
        (Lang::Fr, "document_not_found") => "Document non trouvé",
        (Lang::Fr, "session_not_found") => "Session inconnue",
        (Lang::Fr, "maintenance") => "API en maintenance",
        (Lang::Fr, "method_not_allowed") => "Méthode non autorisée",
        (Lang::Fr, "internal_error") => "Erreur interne",

        (Lang::Es, "not_found") => "No encontrado",
        (Lang::Es, "bad_request") => "Solicitud inválida",
        (Lang::Es, "unauthorized") => "No autorizado",
        (Lang::Es, "forbidden") => "Acceso denegado",
        (Lang::Es, "created") => "Creado exitosamente",
        (Lang::Es, "updated") => "Actualizado exitosamente",
        (Lang::Es, "deleted") => "Eliminado exitosamente",
        (Lang::Es, "sequence_not_found") => "Secuencia no encontrada",
        (Lang::Es, "resource_not_found") => "Recurso no encontrado",
        (Lang::Es, "document_not_found") => "Documento no encontrado",
        (Lang::Es, "session_not_found") => "Sesión desconocida",
        (Lang::Es, "maintenance") => "API en mantenimiento",
        (Lang::Es, "method_not_allowed") => "Método no permitido",
        (Lang::Es, "internal_error") => "Error interno",

        (Lang::En, "not_found") => "Not found",
        (Lang::En, "bad_request") => "Bad request",
        (Lang::En, "unauthorized") => "Unauthorized",
        (Lang::En, "forbidden") => "Access denied",
        (Lang::En, "created") => "Created successfully",
        (Lang::En, "updated") => "Updated successfully",
        (Lang::En, "deleted") => "Deleted successfully",
        (Lang::En, "sequence_not_found") => "Sequence not found",
        (Lang::En, "resource_not_found") => "Resource not found",
        (Lang::En, "document_not_found") => "Document not found",
        (Lang::En, "session_not_found") => "Unknown session",
        (Lang::En, "maintenance") => "API under maintenance",
        (Lang::En, "method_not_allowed") => "Method not allowed",
        (Lang::En, "internal_error") => "Internal error",

        (Lang::It, "not_found") => "Non trovato",
        (Lang::It, "bad_request") => "Richiesta non valida",
        (Lang::It, "unauthorized") => "Non autorizzato",
        (Lang::It, "forbidden") => "Accesso negato",
        (Lang::It, "created") => "Creato con successo",
        (Lang::It, "updated") => "Aggiornato con successo",
        (Lang::It, "deleted") => "Eliminato con successo",
        (Lang::It, "sequence_not_found") => "Sequenza non trovata",
        (Lang::It, "resource_not_found") => "Risorsa non trovata",
        (Lang::It, "document_not_found") => "Documento non trovato",
        (Lang::It, "session_not_found") => "Sessione sconosciuta",
        (Lang::It, "maintenance") => "API in manutenzione",
        (Lang::It, "method_not_allowed") => "Metodo non consentito",
        (Lang::It, "internal_error") => "Errore interno",

        (Lang::Maya, "not_found") => "Ma' uts",
        (Lang::Maya, "bad_request") => "Ma' uts k'áat",
        (Lang::Maya, "unauthorized") => "Ma' utsilil",
        (Lang::Maya, "forbidden") => "Ma' utsilil k'áat",
        (Lang::Maya, "created") => "Tuméen u ts'áaj",
        (Lang::Maya, "updated") => "Tuméen u k'áat",
        (Lang::Maya, "deleted") => "Tuméen u páaj",
        (Lang::Maya, "sequence_not_found") => "Ma' utsilil séquence",
        (Lang::Maya, "resource_not_found") => "Ma' utsilil recurso",
        (Lang::Maya, "document_not_found") => "Ma' utsilil documento",

        _ => return None,
    };
    Some(message)
}
