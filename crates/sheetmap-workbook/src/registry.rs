use std::fmt;

use rustc_hash::FxHashMap;

use crate::backends::MemoryBackend;
use crate::config::WorkbookConfig;
use crate::error::{Result, WorkbookError};
use crate::reader_writer::{ExcelReaderWriter, TableReaderWriter};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Cell-by-cell access (umya).
    Grid,
    /// Whole used range at once (calamine).
    Range,
    /// In-memory grid.
    Memory,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Grid => "grid",
            Self::Range => "range",
            Self::Memory => "memory",
        })
    }
}

type Constructor = Box<dyn Fn(&WorkbookConfig) -> Box<dyn TableReaderWriter> + Send + Sync>;

/// Creates reader/writers by backend kind.
pub struct BackendRegistry {
    constructors: FxHashMap<BackendKind, Constructor>,
    default_kind: BackendKind,
    config: WorkbookConfig,
}

impl BackendRegistry {
    /// An empty registry; `Grid` is the default kind.
    pub fn new(config: WorkbookConfig) -> Self {
        Self {
            constructors: FxHashMap::default(),
            default_kind: BackendKind::Grid,
            config,
        }
    }

    /// Every compiled-in backend. The memory backend's books are shared by
    /// all reader/writers this registry creates.
    pub fn with_defaults() -> Self {
        Self::with_defaults_and_config(WorkbookConfig::default())
    }

    pub fn with_defaults_and_config(config: WorkbookConfig) -> Self {
        let mut registry = Self::new(config);
        #[cfg(feature = "umya")]
        registry.register(BackendKind::Grid, |cfg| {
            Box::new(ExcelReaderWriter::with_config(
                crate::backends::UmyaBackend::new(),
                cfg.clone(),
            ))
        });
        #[cfg(feature = "calamine")]
        registry.register(BackendKind::Range, |cfg| {
            Box::new(ExcelReaderWriter::with_config(
                crate::backends::CalamineBackend::new(),
                cfg.clone(),
            ))
        });
        let memory = MemoryBackend::new();
        registry.register(BackendKind::Memory, move |cfg| {
            Box::new(ExcelReaderWriter::with_config(memory.clone(), cfg.clone()))
        });
        registry
    }

    pub fn register<F>(&mut self, kind: BackendKind, constructor: F)
    where
        F: Fn(&WorkbookConfig) -> Box<dyn TableReaderWriter> + Send + Sync + 'static,
    {
        self.constructors.insert(kind, Box::new(constructor));
    }

    pub fn set_default(&mut self, kind: BackendKind) {
        self.default_kind = kind;
    }

    pub fn default_kind(&self) -> BackendKind {
        self.default_kind
    }

    pub fn is_registered(&self, kind: BackendKind) -> bool {
        self.constructors.contains_key(&kind)
    }

    pub fn create(&self, kind: BackendKind) -> Result<Box<dyn TableReaderWriter>> {
        let constructor = self.constructors.get(&kind).ok_or_else(|| {
            #[cfg(feature = "tracing")]
            tracing::warn!(%kind, "backend requested but not registered");
            WorkbookError::EngineUnavailable {
                engine: kind.to_string(),
                reason: "no backend registered for this kind".to_string(),
            }
        })?;
        Ok(constructor(&self.config))
    }

    pub fn create_default(&self) -> Result<Box<dyn TableReaderWriter>> {
        self.create(self.default_kind)
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unregistered_kind_is_unavailable() {
        let registry = BackendRegistry::new(WorkbookConfig::default());
        let err = registry.create(BackendKind::Range).err().unwrap();
        assert!(matches!(err, WorkbookError::EngineUnavailable { ref engine, .. } if engine == "range"));
    }

    #[test]
    fn defaults_prefer_the_grid_backend() {
        let registry = BackendRegistry::with_defaults();
        assert_eq!(registry.default_kind(), BackendKind::Grid);
        assert!(registry.is_registered(BackendKind::Memory));
        let memory = registry.create(BackendKind::Memory).unwrap();
        assert_eq!(memory.backend_name(), "memory");
    }

    #[cfg(feature = "umya")]
    #[test]
    fn default_backend_is_umya() {
        let rw = BackendRegistry::with_defaults().create_default().unwrap();
        assert_eq!(rw.backend_name(), "umya");
    }
}
