//! Configuración cargada desde variables de entorno (.env incluido).
//! Hoy sólo decide qué se hace con el diccionario de keywords del llamador.
use std::env;

use dotenvy::dotenv;
use log::warn;
use mapply_engine::KwargsPolicy;
use once_cell::sync::Lazy;
use thiserror::Error;

pub const KWARGS_POLICY_VAR: &str = "REG_MAPPLY_KWARGS_POLICY";

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

/// Configuración global, evaluada una sola vez.
pub static CONFIG: Lazy<MapplyConfig> = Lazy::new(MapplyConfig::from_env);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: {reason}")]
    InvalidValue { var: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapplyConfig {
    pub kwargs_policy: KwargsPolicy,
}

impl MapplyConfig {
    /// Lee la configuración; un valor desconocido es un error.
    pub fn try_from_env() -> Result<Self, ConfigError> {
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Como `try_from_env`, pero vuelve a los valores por defecto si algo no
    /// se puede interpretar.
    pub fn from_env() -> Self {
        Self::try_from_env().unwrap_or_else(|e| {
                                warn!("invalid configuration, using defaults: {e}");
                                Self::default()
                            })
    }

    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
        where F: Fn(&str) -> Option<String>
    {
        let kwargs_policy = match get(KWARGS_POLICY_VAR) {
            Some(raw) => raw.parse()
                            .map_err(|reason| ConfigError::InvalidValue { var: KWARGS_POLICY_VAR, reason })?,
            None => KwargsPolicy::default(),
        };
        Ok(Self { kwargs_policy })
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
