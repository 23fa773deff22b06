//! XDG base-directory and user-directory resolution.

use crate::lazy::LazyInitialized;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type EnvVarMap = HashMap<String, String>;

/// Directory roots the services depend on.
pub trait PlatformFolders: Send + Sync {
    /// Root of the home trash (`$XDG_DATA_HOME/Trash`).
    fn trash_folder(&self) -> PathBuf;

    /// Root of the shared thumbnail cache.
    fn thumbnail_folder(&self) -> PathBuf;

    /// Per-user cache root (`$XDG_CACHE_HOME`).
    fn cache_folder(&self) -> PathBuf;

    fn user_home(&self) -> PathBuf;

    fn downloads_folder(&self) -> Option<PathBuf>;
    fn desktop_folder(&self) -> Option<PathBuf>;
    fn documents_folder(&self) -> Option<PathBuf>;
    fn pictures_folder(&self) -> Option<PathBuf>;
    fn videos_folder(&self) -> Option<PathBuf>;
    fn music_folder(&self) -> Option<PathBuf>;
    fn public_share_folder(&self) -> Option<PathBuf>;

    fn tmp_folder(&self) -> PathBuf {
        env::temp_dir()
    }
}

const SYSTEM_CONFIG_DIR: &str = "/etc/xdg";

/// Raw environment plus the lookups derived from it.
#[derive(Debug)]
struct XdgEnv {
    vars: EnvVarMap,
    system_config_dir: PathBuf,
}

impl XdgEnv {
    fn var(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    fn home(&self) -> PathBuf {
        self.var("HOME")
            .map(PathBuf::from)
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("/"))
    }

    fn expand_home(&self, value: &str) -> PathBuf {
        let home = self.home();
        PathBuf::from(value.replace("$HOME", &home.to_string_lossy()))
    }

    fn env_or_default(&self, key: &str, default: &[&str]) -> PathBuf {
        match self.var(key) {
            Some(value) => self.expand_home(value),
            None => default.iter().fold(self.home(), |path, part| path.join(part)),
        }
    }

    fn data_home(&self) -> PathBuf {
        self.env_or_default("XDG_DATA_HOME", &[".local", "share"])
    }

    fn config_home(&self) -> PathBuf {
        self.env_or_default("XDG_CONFIG_HOME", &[".config"])
    }

    fn cache_home(&self) -> PathBuf {
        self.env_or_default("XDG_CACHE_HOME", &[".cache"])
    }

    fn trash_dir(&self) -> PathBuf {
        self.data_home().join("Trash")
    }

    fn thumbnail_dir(&self) -> PathBuf {
        if let Some(cache_root) = self.var("XDG_CACHE_HOME") {
            return self.expand_home(cache_root).join("thumbnails");
        }
        let legacy = self.home().join(".thumbnails");
        if legacy.join("normal").is_dir() || legacy.join("large").is_dir() {
            return legacy;
        }
        self.home().join(".cache").join("thumbnails")
    }

    /// Looks up `XDG_<ID>_DIR` in `user-dirs.dirs`, then the system defaults.
    fn user_dir(&self, folder_id: &str) -> Option<PathBuf> {
        let user_dirs = self.config_home().join("user-dirs.dirs");
        if let Some(path) = fs::read_to_string(&user_dirs)
            .ok()
            .and_then(|content| parse_user_dirs(&content, folder_id))
        {
            return Some(self.expand_home(&path));
        }

        let defaults = self.system_config_dir.join("user-dirs.defaults");
        let short_id = folder_id
            .trim_start_matches("XDG_")
            .trim_end_matches("_DIR");
        fs::read_to_string(defaults)
            .ok()
            .and_then(|content| parse_user_dirs(&content, short_id))
            .map(|relative| self.home().join(relative))
    }
}

/// Finds `<key>=<value>` in a user-dirs style file, stripping quotes.
fn parse_user_dirs(content: &str, key: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.starts_with('#'))
        .find_map(|line| {
            let (name, value) = line.split_once('=')?;
            (name.trim() == key).then(|| value.trim().replace('"', ""))
        })
}

type Resolved<T> = LazyInitialized<T, Box<dyn Fn() -> T + Send + Sync>>;

fn resolve<T: 'static>(env: &Arc<XdgEnv>, lookup: fn(&XdgEnv) -> T) -> Resolved<T> {
    let env = Arc::clone(env);
    let init: Box<dyn Fn() -> T + Send + Sync> = Box::new(move || lookup(&env));
    LazyInitialized::new(init)
}

/// [`PlatformFolders`] backed by XDG environment variables, memoized per lookup.
pub struct XdgFolders {
    home: Resolved<PathBuf>,
    trash: Resolved<PathBuf>,
    thumbnails: Resolved<PathBuf>,
    cache: Resolved<PathBuf>,
    downloads: Resolved<Option<PathBuf>>,
    desktop: Resolved<Option<PathBuf>>,
    documents: Resolved<Option<PathBuf>>,
    pictures: Resolved<Option<PathBuf>>,
    videos: Resolved<Option<PathBuf>>,
    music: Resolved<Option<PathBuf>>,
    public_share: Resolved<Option<PathBuf>>,
}

impl XdgFolders {
    /// Resolves folders from the current process environment.
    pub fn from_process_env() -> Self {
        Self::from_environ(env::vars().collect())
    }

    pub fn from_environ(vars: EnvVarMap) -> Self {
        Self::with_system_config_dir(vars, SYSTEM_CONFIG_DIR)
    }

    /// Like [`XdgFolders::from_environ`] with a custom location for `user-dirs.defaults`.
    pub fn with_system_config_dir(vars: EnvVarMap, system_config_dir: impl AsRef<Path>) -> Self {
        let env = Arc::new(XdgEnv {
            vars,
            system_config_dir: system_config_dir.as_ref().to_path_buf(),
        });
        Self {
            home: resolve(&env, XdgEnv::home),
            trash: resolve(&env, XdgEnv::trash_dir),
            thumbnails: resolve(&env, XdgEnv::thumbnail_dir),
            cache: resolve(&env, XdgEnv::cache_home),
            downloads: resolve(&env, |e| e.user_dir("XDG_DOWNLOAD_DIR")),
            desktop: resolve(&env, |e| e.user_dir("XDG_DESKTOP_DIR")),
            documents: resolve(&env, |e| e.user_dir("XDG_DOCUMENTS_DIR")),
            pictures: resolve(&env, |e| e.user_dir("XDG_PICTURES_DIR")),
            videos: resolve(&env, |e| e.user_dir("XDG_VIDEOS_DIR")),
            music: resolve(&env, |e| e.user_dir("XDG_MUSIC_DIR")),
            public_share: resolve(&env, |e| e.user_dir("XDG_PUBLICSHARE_DIR")),
        }
    }
}

impl PlatformFolders for XdgFolders {
    fn trash_folder(&self) -> PathBuf {
        self.trash.get().clone()
    }

    fn thumbnail_folder(&self) -> PathBuf {
        self.thumbnails.get().clone()
    }

    fn cache_folder(&self) -> PathBuf {
        self.cache.get().clone()
    }

    fn user_home(&self) -> PathBuf {
        self.home.get().clone()
    }

    fn downloads_folder(&self) -> Option<PathBuf> {
        self.downloads.get().clone()
    }

    fn desktop_folder(&self) -> Option<PathBuf> {
        self.desktop.get().clone()
    }

    fn documents_folder(&self) -> Option<PathBuf> {
        self.documents.get().clone()
    }

    fn pictures_folder(&self) -> Option<PathBuf> {
        self.pictures.get().clone()
    }

    fn videos_folder(&self) -> Option<PathBuf> {
        self.videos.get().clone()
    }

    fn music_folder(&self) -> Option<PathBuf> {
        self.music.get().clone()
    }

    fn public_share_folder(&self) -> Option<PathBuf> {
        self.public_share.get().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn environ(pairs: &[(&str, &Path)]) -> EnvVarMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string_lossy().into_owned()))
            .collect()
    }

    #[test]
    fn defaults_derive_from_home() {
        let tmp = TempDir::new().unwrap();
        let home = tmp.path();
        let folders = XdgFolders::with_system_config_dir(environ(&[("HOME", home)]), tmp.path().join("etc"));

        assert_eq!(folders.user_home(), home);
        assert_eq!(folders.trash_folder(), home.join(".local/share/Trash"));
        assert_eq!(folders.cache_folder(), home.join(".cache"));
        assert_eq!(folders.thumbnail_folder(), home.join(".cache/thumbnails"));
        assert_eq!(folders.downloads_folder(), None);
    }

    #[test]
    fn xdg_variables_override_defaults() {
        let tmp = TempDir::new().unwrap();
        let data = tmp.path().join("data");
        let cache = tmp.path().join("cache");
        let folders = XdgFolders::from_environ(environ(&[
            ("HOME", tmp.path()),
            ("XDG_DATA_HOME", data.as_path()),
            ("XDG_CACHE_HOME", cache.as_path()),
        ]));

        assert_eq!(folders.trash_folder(), data.join("Trash"));
        assert_eq!(folders.thumbnail_folder(), cache.join("thumbnails"));
    }

    #[test]
    fn legacy_thumbnail_dir_is_used_when_populated() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join(".thumbnails/normal")).unwrap();
        let folders = XdgFolders::from_environ(environ(&[("HOME", tmp.path())]));

        assert_eq!(folders.thumbnail_folder(), tmp.path().join(".thumbnails"));
    }

    #[test]
    fn user_dirs_file_wins_over_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = tmp.path().join("config");
        let etc = tmp.path().join("etc");
        fs::create_dir_all(&config).unwrap();
        fs::create_dir_all(&etc).unwrap();
        fs::write(
            config.join("user-dirs.dirs"),
            "# written by xdg-user-dirs-update\nXDG_DOWNLOAD_DIR=\"$HOME/Downloads\"\n",
        )
        .unwrap();
        fs::write(etc.join("user-dirs.defaults"), "DOWNLOAD=Dl\nMUSIC=Tunes\n").unwrap();

        let folders = XdgFolders::with_system_config_dir(
            environ(&[("HOME", tmp.path()), ("XDG_CONFIG_HOME", config.as_path())]),
            &etc,
        );

        assert_eq!(folders.downloads_folder(), Some(tmp.path().join("Downloads")));
        assert_eq!(folders.music_folder(), Some(tmp.path().join("Tunes")));
        assert_eq!(folders.videos_folder(), None);
    }

    #[test]
    fn parse_user_dirs_requires_exact_key() {
        let content = "XDG_DOWNLOAD_DIR_OLD=\"/x\"\nXDG_DOWNLOAD_DIR=\"/y\"\n";
        assert_eq!(parse_user_dirs(content, "XDG_DOWNLOAD_DIR"), Some("/y".to_string()));
    }
}
