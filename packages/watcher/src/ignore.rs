use std::path::{Component, Path, PathBuf};

use crate::config::WatchConfig;

/// Paths whose changes never reach the rebuild callback.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    root: PathBuf,
    prefixes: Vec<PathBuf>,
    follow_symlinks: bool,
}

impl IgnoreRules {
    pub fn new(root: &Path, config: &WatchConfig) -> Self {
        let prefixes = [PathBuf::from("node_modules"), PathBuf::from(".git"), config.outdir.clone()]
            .into_iter()
            .chain(config.ignore_watch.iter().cloned())
            .map(|relative| root.join(relative))
            .collect();

        Self {
            root: root.to_path_buf(),
            prefixes,
            follow_symlinks: config.follow_symlinks,
        }
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        if self.prefixes.iter().any(|prefix| path.starts_with(prefix)) {
            return true;
        }

        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let hidden = relative.components().any(|component| match component {
            Component::Normal(name) => name.to_string_lossy().starts_with('.'),
            _ => false,
        });
        if hidden {
            return true;
        }

        if path.extension().is_some_and(|ext| ext == "log") {
            return true;
        }

        !self.follow_symlinks && is_symlink(path)
    }
}

fn is_symlink(path: &Path) -> bool {
    std::fs::symlink_metadata(path)
        .map(|metadata| metadata.file_type().is_symlink())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(config: WatchConfig) -> IgnoreRules {
        IgnoreRules::new(Path::new("/project"), &config)
    }

    #[test]
    fn test_default_exclusions() {
        let rules = rules(WatchConfig::default());

        assert!(rules.is_ignored(Path::new("/project/.env")));
        assert!(rules.is_ignored(Path::new("/project/src/.cache/x.pug")));
        assert!(rules.is_ignored(Path::new("/project/node_modules/pkg/index.js")));
        assert!(rules.is_ignored(Path::new("/project/.git/HEAD")));
        assert!(rules.is_ignored(Path::new("/project/build/bundle.js")));
        assert!(rules.is_ignored(Path::new("/project/debug.log")));

        assert!(!rules.is_ignored(Path::new("/project/src/index.pug")));
        assert!(!rules.is_ignored(Path::new("/project/builder/index.pug")));
    }

    #[test]
    fn test_hidden_root_does_not_hide_everything() {
        let rules = IgnoreRules::new(Path::new("/home/me/.projects/app"), &WatchConfig::default());
        assert!(!rules.is_ignored(Path::new("/home/me/.projects/app/src/a.styl")));
    }

    #[test]
    fn test_configured_exclusions() {
        let rules = rules(WatchConfig {
            outdir: PathBuf::from("dist"),
            ignore_watch: vec![PathBuf::from("fixtures")],
            ..WatchConfig::default()
        });

        assert!(rules.is_ignored(Path::new("/project/dist/bundle.js")));
        assert!(rules.is_ignored(Path::new("/project/fixtures/a.pug")));
        assert!(!rules.is_ignored(Path::new("/project/build/bundle.js")));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_ignored_unless_followed() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("real.pug");
        let link = dir.path().join("link.pug");
        std::fs::write(&target, "p").unwrap();
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let strict = IgnoreRules::new(dir.path(), &WatchConfig::default());
        assert!(strict.is_ignored(&link));
        assert!(!strict.is_ignored(&target));

        let following = IgnoreRules::new(
            dir.path(),
            &WatchConfig {
                follow_symlinks: true,
                ..WatchConfig::default()
            },
        );
        assert!(!following.is_ignored(&link));
    }
}
