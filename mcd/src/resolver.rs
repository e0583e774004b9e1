use std::path::{Path, PathBuf};

use scanner::ScanConfig;

use crate::config::Config;
use crate::error::ResolveError;
use crate::pattern::{Anchor, Matcher, Pattern, Segment, Strategy};

#[derive(Debug, Clone)]
pub struct Request {
    pub pattern: String,
    /// Which candidate to take at each point with more than one match
    pub index: usize,
    /// Absolute; relative patterns resolve against it
    pub working_dir: PathBuf,
}

pub struct Resolver {
    scan: ScanConfig,
    ignore_case: bool,
}

impl Resolver {
    pub fn new(config: &Config) -> Self {
        Self {
            scan: config.scan_config(),
            ignore_case: config.ignore_case,
        }
    }

    pub fn resolve(&self, request: &Request) -> Result<PathBuf, ResolveError> {
        let pattern = Pattern::parse(&request.pattern)?;

        let start = match pattern.anchor {
            Anchor::CurrentDirectory => request.working_dir.clone(),
            Anchor::FilesystemRoot => filesystem_root(&request.working_dir),
        };

        match pattern.strategy() {
            Strategy::Sequential(segments) => self.walk_segments(start, segments, request.index),
            Strategy::ExpandAncestors(token) => self.expand(&start, token, request.index),
            Strategy::ScanRoot(token) => {
                let matcher = Matcher::new(token, self.ignore_case);
                let candidates = self.scan(&start, &matcher, None)?;
                if candidates.is_empty() {
                    return Err(ResolveError::NoMatchFound {
                        token: token.to_string(),
                        base: start,
                    });
                }
                select(candidates, request.index, token)
            },
        }
    }

    /// Candidates reachable from `dir` through one segment, sorted.
    pub fn step(&self, dir: &Path, segment: &Segment) -> Result<Vec<PathBuf>, ResolveError> {
        match segment {
            Segment::ParentStep => dir
                .parent()
                .map(|parent| vec![parent.to_path_buf()])
                .ok_or(ResolveError::Navigation),

            Segment::SelfStep => Ok(vec![dir.to_path_buf()]),

            Segment::FuzzyToken(token) => {
                let matcher = Matcher::new(token, self.ignore_case);

                Ok(scanner::list_dirs(dir, &self.scan)?
                    .into_iter()
                    .filter(|entry| matcher.matches(&entry.name))
                    .map(|entry| entry.path)
                    .collect())
            },
        }
    }

    fn walk_segments(
        &self,
        start: PathBuf,
        segments: &[Segment],
        index: usize,
    ) -> Result<PathBuf, ResolveError> {
        let mut current = start;

        for segment in segments {
            let mut candidates = self.step(&current, segment)?;

            current = if candidates.len() > 1 {
                debug!(
                    "{} candidates for '{}' in '{}', taking #{}",
                    candidates.len(),
                    segment,
                    current.display(),
                    index
                );
                select(candidates, index, &segment.to_string())?
            } else {
                candidates
                    .pop()
                    .ok_or_else(|| ResolveError::NoMatchFound {
                        token: segment.to_string(),
                        base: current,
                    })?
            };
        }

        Ok(current)
    }

    /// Searches the subtree of the working directory, then of its parent and
    /// so on up to the root, stopping at the first level with any match.
    fn expand(
        &self,
        working_dir: &Path,
        token: &str,
        index: usize,
    ) -> Result<PathBuf, ResolveError> {
        let matcher = Matcher::new(token, self.ignore_case);
        let mut covered: Option<&Path> = None;

        for (level, base) in working_dir
            .ancestors()
            .enumerate()
        {
            let candidates = self.scan(base, &matcher, covered)?;
            debug!(
                "Level {}: {} match(es) for '{}' under '{}'",
                level,
                candidates.len(),
                token,
                base.display()
            );

            if !candidates.is_empty() {
                return select(candidates, index, token);
            }

            covered = Some(base);
        }

        Err(ResolveError::NoMatchFound {
            token: token.to_string(),
            base: filesystem_root(working_dir),
        })
    }

    /// Every directory below `base` whose name matches, sorted by full path.
    fn scan(
        &self,
        base: &Path,
        matcher: &Matcher,
        prune: Option<&Path>,
    ) -> Result<Vec<PathBuf>, ResolveError> {
        let mut found = Vec::new();

        scanner::walk(base, &self.scan, prune, |entry| {
            if matcher.matches(&entry.name) {
                found.push(entry.path.clone());
            }
        })?;

        found.sort_by(|a, b| {
            a.as_os_str()
                .cmp(b.as_os_str())
        });
        Ok(found)
    }
}

/// Takes the `index`-th of the sorted `candidates`.
pub fn select(
    mut candidates: Vec<PathBuf>,
    index: usize,
    token: &str,
) -> Result<PathBuf, ResolveError> {
    let count = candidates.len();

    if count == 0 {
        return Err(ResolveError::NoMatchFound {
            token: token.to_string(),
            base: PathBuf::new(),
        });
    }

    if index >= count {
        return Err(ResolveError::IndexOutOfRange {
            token: token.to_string(),
            index,
            count,
        });
    }

    Ok(candidates.swap_remove(index))
}

fn filesystem_root(path: &Path) -> PathBuf {
    path.ancestors()
        .last()
        .unwrap_or(path)
        .to_path_buf()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    struct Fixture {
        _tmp: tempfile::TempDir,
        root: PathBuf,
    }

    impl Fixture {
        fn new(dirs: &[&str]) -> Self {
            let tmp = tempfile::tempdir().unwrap();
            let root = fs::canonicalize(tmp.path()).unwrap();
            for dir in dirs {
                fs::create_dir_all(root.join(dir)).unwrap();
            }
            Self { _tmp: tmp, root }
        }

        /// The directory layout the command-line scenarios run against
        fn scenario() -> Self {
            Self::new(&[
                "parent/child1",
                "parent/child2",
                "parent/subdir/deep1",
                "parent/subdir/deep2",
                "sibling/sub1",
                "sibling/sub2",
                "foo/bar",
                "foo/baz",
                "unique_test_dir",
            ])
        }

        fn resolve_with(
            &self,
            config: &Config,
            cwd: &str,
            pattern: &str,
            index: usize,
        ) -> Result<PathBuf, ResolveError> {
            Resolver::new(config).resolve(&Request {
                pattern: pattern.to_string(),
                index,
                working_dir: self.root.join(cwd),
            })
        }

        fn resolve(&self, cwd: &str, pattern: &str, index: usize) -> Result<PathBuf, ResolveError> {
            self.resolve_with(&Config::default(), cwd, pattern, index)
        }
    }

    const CWD: &str = "parent/child1";

    #[test]
    fn scenario_relative_navigation() {
        let fx = Fixture::scenario();

        let cases = [
            ("..", "parent"),
            ("../..", ""),
            ("../child2", "parent/child2"),
            ("../../foo", "foo"),
            ("../ch", "parent/child1"),
            ("unique_test", "unique_test_dir"),
        ];

        for (pattern, expected) in cases {
            let expected = if expected.is_empty() {
                fx.root.clone()
            } else {
                fx.root.join(expected)
            };
            assert_eq!(fx.resolve(CWD, pattern, 0).unwrap(), expected, "{pattern}");
        }
    }

    #[test]
    fn index_picks_among_matches() {
        let fx = Fixture::scenario();

        assert_eq!(fx.resolve(CWD, "../ch", 1).unwrap(), fx.root.join("parent/child2"));
        assert!(matches!(
            fx.resolve(CWD, "../ch", 2),
            Err(ResolveError::IndexOutOfRange { index: 2, count: 2, .. })
        ));
    }

    #[test]
    fn index_is_ignored_without_ambiguity() {
        let fx = Fixture::scenario();

        assert_eq!(fx.resolve(CWD, "..", 5).unwrap(), fx.root.join("parent"));
        assert_eq!(fx.resolve(CWD, "../child2", 3).unwrap(), fx.root.join("parent/child2"));
    }

    #[test]
    fn index_applies_at_each_disambiguation_point() {
        let fx = Fixture::new(&["w", "a1/x1", "a1/x2", "a2/x1", "a2/x2"]);

        assert_eq!(fx.resolve("w", "../a/x", 0).unwrap(), fx.root.join("a1/x1"));
        assert_eq!(fx.resolve("w", "../a/x", 1).unwrap(), fx.root.join("a2/x2"));
    }

    #[test]
    fn later_segments_only_see_the_selected_directory() {
        let fx = Fixture::new(&["w", "a1/only_here", "a2/other"]);

        assert!(matches!(
            fx.resolve("w", "../a/only", 1),
            Err(ResolveError::NoMatchFound { .. })
        ));
    }

    #[test]
    fn missing_segment_is_no_match() {
        let fx = Fixture::scenario();

        match fx.resolve(CWD, "../nothing_here", 0) {
            Err(ResolveError::NoMatchFound { token, base }) => {
                assert_eq!(token, "nothing_here");
                assert_eq!(base, fx.root.join("parent"));
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn self_step_is_a_no_op() {
        let fx = Fixture::scenario();

        assert_eq!(fx.resolve(CWD, "./..", 0).unwrap(), fx.root.join("parent"));
        assert_eq!(fx.resolve(CWD, ".", 0).unwrap(), fx.root.join(CWD));
    }

    #[test]
    fn files_never_match() {
        let fx = Fixture::scenario();
        fs::write(fx.root.join("parent/child_notes.txt"), "x").unwrap();

        assert!(matches!(
            fx.resolve(CWD, "../ch", 2),
            Err(ResolveError::IndexOutOfRange { count: 2, .. })
        ));
    }

    #[test]
    fn expanding_search_collects_whole_subtree_of_a_level() {
        let fx = Fixture::scenario();

        assert_eq!(fx.resolve(CWD, "deep", 0).unwrap(), fx.root.join("parent/subdir/deep1"));
        assert_eq!(fx.resolve(CWD, "deep", 1).unwrap(), fx.root.join("parent/subdir/deep2"));
        assert!(matches!(
            fx.resolve(CWD, "deep", 2),
            Err(ResolveError::IndexOutOfRange { count: 2, .. })
        ));
    }

    #[test]
    fn expanding_search_prefers_nearest_scope() {
        let fx = Fixture::new(&["a/w", "a/x/y/target_deep", "target_far"]);

        assert_eq!(fx.resolve("a/w", "target", 0).unwrap(), fx.root.join("a/x/y/target_deep"));
    }

    #[test]
    fn expanding_search_starts_below_working_directory() {
        let fx = Fixture::new(&["w/inner/sub_here", "sub_outside"]);

        assert_eq!(fx.resolve("w", "sub", 0).unwrap(), fx.root.join("w/inner/sub_here"));
    }

    #[test]
    fn expanding_search_finds_the_working_directory_from_its_parent() {
        let fx = Fixture::scenario();

        assert_eq!(fx.resolve(CWD, "child1", 0).unwrap(), fx.root.join(CWD));
    }

    #[test]
    fn expanding_search_honors_max_depth() {
        let fx = Fixture::new(&["a/w", "a/x/y/target_deep", "target_far"]);
        let config = Config {
            max_depth: Some(2),
            ..Config::default()
        };

        assert_eq!(
            fx.resolve_with(&config, "a/w", "target", 0)
                .unwrap(),
            fx.root.join("target_far")
        );
    }

    #[test]
    fn ignore_case_widens_matches() {
        let fx = Fixture::new(&["w", "Docs", "docs_old"]);
        let config = Config {
            ignore_case: true,
            ..Config::default()
        };

        assert_eq!(fx.resolve("w", "docs", 0).unwrap(), fx.root.join("docs_old"));
        assert_eq!(fx.resolve_with(&config, "w", "docs", 0).unwrap(), fx.root.join("Docs"));
    }

    #[test]
    fn resolution_is_deterministic() {
        let fx = Fixture::scenario();

        for pattern in ["../ch", "sub", "../../foo/ba"] {
            assert_eq!(
                fx.resolve(CWD, pattern, 0).unwrap(),
                fx.resolve(CWD, pattern, 0).unwrap()
            );
        }
    }

    #[cfg(unix)]
    #[test]
    fn expanding_search_survives_symlink_cycles() {
        let fx = Fixture::new(&["a/w", "a/b", "loop_target_dir"]);
        std::os::unix::fs::symlink(fx.root.join("a"), fx.root.join("a/b/back")).unwrap();

        assert_eq!(fx.resolve("a/w", "loop_target", 0).unwrap(), fx.root.join("loop_target_dir"));
    }

    #[cfg(unix)]
    #[test]
    fn aliased_directory_is_reported_under_its_first_name() {
        let fx = Fixture::new(&["w", "b_real/target_dir"]);
        std::os::unix::fs::symlink(fx.root.join("b_real"), fx.root.join("a_link")).unwrap();

        assert_eq!(
            fx.resolve("w", "target", 0).unwrap(),
            fx.root.join("a_link/target_dir")
        );
        assert!(matches!(
            fx.resolve("w", "target", 1),
            Err(ResolveError::IndexOutOfRange { count: 1, .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_sibling_does_not_stop_expanding_search() {
        use std::os::unix::fs::PermissionsExt;

        let fx = Fixture::new(&["w", "a_locked/inner", "z_open/wanted_dir"]);
        let locked = fx.root.join("a_locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let result = fx.resolve("w", "wanted", 0);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(result.unwrap(), fx.root.join("z_open/wanted_dir"));
    }

    #[test]
    fn parent_of_root_is_a_navigation_error() {
        let resolver = Resolver::new(&Config::default());
        let root = filesystem_root(&std::env::temp_dir());

        assert!(matches!(
            resolver.resolve(&Request {
                pattern: "..".to_string(),
                index: 0,
                working_dir: root.clone(),
            }),
            Err(ResolveError::Navigation)
        ));
        assert!(matches!(
            resolver.step(&root, &Segment::ParentStep),
            Err(ResolveError::Navigation)
        ));
    }

    #[test]
    fn absolute_patterns_start_at_root() {
        let fx = Fixture::scenario();
        let root = filesystem_root(&fx.root);

        assert_eq!(fx.resolve(CWD, "/.", 0).unwrap(), root);
        assert!(matches!(fx.resolve(CWD, "/..", 0), Err(ResolveError::Navigation)));
    }

    #[test]
    fn empty_pattern_is_invalid() {
        let fx = Fixture::scenario();
        assert!(matches!(fx.resolve(CWD, "", 0), Err(ResolveError::InvalidPattern(_))));
    }

    #[test]
    fn select_bounds() {
        let candidates = vec![PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/c")];

        assert_eq!(select(candidates.clone(), 2, "x").unwrap(), PathBuf::from("/c"));
        assert!(matches!(
            select(candidates, 3, "x"),
            Err(ResolveError::IndexOutOfRange { index: 3, count: 3, .. })
        ));
        assert!(matches!(
            select(Vec::new(), 0, "x"),
            Err(ResolveError::NoMatchFound { .. })
        ));
    }
}
