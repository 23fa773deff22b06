//! Platform selection and the services each platform provides.

mod command;
mod detect;
mod folders;

pub use command::CommandService;
pub use detect::{host_name, Architecture, Distribution, OsType};
pub use folders::{EnvVarMap, PlatformFolders, XdgFolders};

use crate::errors::CoreError;
use crate::lazy::LazyInitialized;
use crate::thumbnails::ThumbnailService;
use crate::trash::TrashService;
use once_cell::sync::OnceCell;
use std::env;
use std::sync::Arc;

/// Services for the platform the process runs on.
#[derive(Debug)]
pub enum Platform {
    Linux(LinuxPlatform),
}

impl Platform {
    /// Detects the running platform and wires its services from the process
    /// environment.
    pub fn current() -> crate::Result<Self> {
        match OsType::current() {
            Some(OsType::Linux) => Ok(Self::Linux(LinuxPlatform::new(Arc::new(
                XdgFolders::from_process_env(),
            )))),
            _ => Err(CoreError::unsupported(format!(
                "platform {}",
                env::consts::OS
            ))),
        }
    }

    /// Process-wide instance, detected on first use.
    pub fn shared() -> crate::Result<&'static Self> {
        static PLATFORM: OnceCell<Platform> = OnceCell::new();
        PLATFORM.get_or_try_init(Self::current)
    }

    pub fn folders(&self) -> &dyn PlatformFolders {
        match self {
            Self::Linux(linux) => linux.folders(),
        }
    }

    pub fn trash(&self) -> &TrashService {
        match self {
            Self::Linux(linux) => linux.trash(),
        }
    }

    pub fn thumbnails(&self) -> &ThumbnailService {
        match self {
            Self::Linux(linux) => linux.thumbnails(),
        }
    }

    pub fn commands(&self) -> &CommandService {
        match self {
            Self::Linux(linux) => linux.commands(),
        }
    }
}

/// Linux services built on the XDG base-directory layout.
pub struct LinuxPlatform {
    folders: Arc<XdgFolders>,
    trash: TrashService,
    thumbnails: ThumbnailService,
    commands: CommandService,
    distribution: LazyInitialized<Distribution>,
    host_name: LazyInitialized<Option<String>>,
}

impl LinuxPlatform {
    pub fn new(folders: Arc<XdgFolders>) -> Self {
        Self {
            trash: TrashService::new(folders.clone()),
            thumbnails: ThumbnailService::new(folders.clone()),
            folders,
            commands: CommandService,
            distribution: LazyInitialized::new(|| Distribution::detect(&CommandService)),
            host_name: LazyInitialized::new(|| host_name(&CommandService)),
        }
    }

    pub fn folders(&self) -> &dyn PlatformFolders {
        self.folders.as_ref()
    }

    pub fn trash(&self) -> &TrashService {
        &self.trash
    }

    pub fn thumbnails(&self) -> &ThumbnailService {
        &self.thumbnails
    }

    pub fn commands(&self) -> &CommandService {
        &self.commands
    }

    /// Distribution, probed on first access.
    pub fn distribution(&self) -> Distribution {
        *self.distribution.get()
    }

    pub fn host_name(&self) -> Option<&str> {
        self.host_name.get().as_deref()
    }
}

impl std::fmt::Debug for LinuxPlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinuxPlatform")
            .field("trash_folder", &self.folders.trash_folder())
            .field("thumbnail_folder", &self.folders.thumbnail_folder())
            .field("distribution", &self.distribution.peek())
            .finish_non_exhaustive()
    }
}
