//! Process and host probes backing the reference domains.

use std::path::PathBuf;

use directories::{BaseDirs, UserDirs};

/// Trait for the operating-system probes the resolver depends on. Tests
/// substitute a mock so resolution never reaches the real environment.
pub trait Environment {
    /// Value of an environment variable, if set.
    fn env_var(&self, name: &str) -> Option<String>;

    /// Absolute path of a well-known system folder identified by name, such
    /// as `Documents` or `LocalAppData`.
    fn known_folder(&self, name: &str) -> Option<String>;

    /// Complete path and filename of the currently-running executable.
    fn executable_path(&self) -> Option<String>;

    /// Hostname of the machine this process is running on.
    fn hostname(&self) -> Option<String>;
}

/// Environment implementation backed by the real process and host.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn env_var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }

    fn known_folder(&self, name: &str) -> Option<String> {
        let user_dirs = UserDirs::new();
        let base_dirs = BaseDirs::new();
        let user = |select: fn(&UserDirs) -> Option<&std::path::Path>| {
            user_dirs.as_ref().and_then(select).map(std::path::Path::to_path_buf)
        };
        let base = |select: fn(&BaseDirs) -> &std::path::Path| {
            base_dirs.as_ref().map(select).map(std::path::Path::to_path_buf)
        };

        let folder: Option<PathBuf> = match name.to_ascii_lowercase().as_str() {
            "profile" => user_dirs.as_ref().map(|dirs| dirs.home_dir().to_path_buf()),
            "desktop" => user(UserDirs::desktop_dir),
            "documents" => user(UserDirs::document_dir),
            "downloads" => user(UserDirs::download_dir),
            "music" => user(UserDirs::audio_dir),
            "pictures" => user(UserDirs::picture_dir),
            "videos" => user(UserDirs::video_dir),
            "public" => user(UserDirs::public_dir),
            "templates" => user(UserDirs::template_dir),
            "fonts" => user(UserDirs::font_dir),
            "roamingappdata" => base(BaseDirs::data_dir),
            "localappdata" => base(BaseDirs::data_local_dir),
            _ => None,
        };
        folder.map(|path| path.to_string_lossy().into_owned())
    }

    fn executable_path(&self) -> Option<String> {
        std::env::current_exe()
            .ok()
            .map(|path| path.to_string_lossy().into_owned())
    }

    fn hostname(&self) -> Option<String> {
        self.env_var("COMPUTERNAME").or_else(|| self.env_var("HOSTNAME"))
    }
}
