//! Output file naming.
//!
//! Proxies land in one flat directory, so two sources sharing a base name in
//! different subdirectories would otherwise overwrite each other. Names are
//! planned for the whole batch before rendering starts: the first file with
//! a given stem keeps the plain name, later ones are disambiguated by their
//! parent directory, then their extension, then a counter.

use std::collections::HashSet;
use std::path::{Component, Path};

use proxygen_media_model::video::{file_stem, VideoFile};

/// Suffix appended to every proxy stem.
pub const PROXY_SUFFIX: &str = "_proxy";

/// Container every proxy is encoded to.
pub const PROXY_CONTAINER_EXT: &str = "mp4";

/// Output name for a single source, ignoring collisions.
///
/// `derive_output_name("clip.mov") == "clip_proxy.mp4"`.
pub fn derive_output_name(source: impl AsRef<Path>) -> String {
    proxy_name(&file_stem(source.as_ref()))
}

fn proxy_name(stem: &str) -> String {
    format!("{stem}{PROXY_SUFFIX}.{PROXY_CONTAINER_EXT}")
}

/// Assign a unique output name to every file, in discovery order.
///
/// Uniqueness is case-insensitive so the plan also holds on case-folding
/// filesystems.
pub fn plan_output_names(files: &[VideoFile]) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::with_capacity(files.len());
    let mut names = Vec::with_capacity(files.len());

    for file in files {
        let stem = file.stem();
        let parent = parent_tag(&file.relative_path);
        let ext = file.extension.to_ascii_lowercase();

        let mut candidates = vec![stem.clone()];
        let with_ext = match &parent {
            Some(parent) => {
                candidates.push(format!("{stem}_{parent}"));
                format!("{stem}_{parent}_{ext}")
            }
            None => format!("{stem}_{ext}"),
        };
        candidates.push(with_ext.clone());

        let chosen = candidates
            .into_iter()
            .map(|candidate| proxy_name(&candidate))
            .find(|name| !taken.contains(&name.to_lowercase()))
            .unwrap_or_else(|| {
                (2usize..)
                    .map(|n| proxy_name(&format!("{with_ext}_{n}")))
                    .find(|name| !taken.contains(&name.to_lowercase()))
                    .unwrap_or_default()
            });

        if chosen != derive_output_name(&file.path) {
            tracing::debug!(
                source = %file.path.display(),
                output = %chosen,
                "Disambiguated colliding output name"
            );
        }

        taken.insert(chosen.to_lowercase());
        names.push(chosen);
    }

    names
}

/// Relative parent directory flattened into a single name segment.
fn parent_tag(relative_path: &Path) -> Option<String> {
    let parent = relative_path.parent()?;
    let parts: Vec<String> = parent
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(sanitize(&part.to_string_lossy())),
            _ => None,
        })
        .filter(|part| !part.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("-"))
    }
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn video(relative: &str) -> VideoFile {
        VideoFile::new(
            PathBuf::from("/media").join(relative),
            PathBuf::from(relative),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_derive_output_name() {
        assert_eq!(derive_output_name("clip.mov"), "clip_proxy.mp4");
        assert_eq!(derive_output_name("/a/b/clip.mov"), "clip_proxy.mp4");
        assert_eq!(derive_output_name("holiday.2019.MKV"), "holiday.2019_proxy.mp4");
    }

    #[test]
    fn test_unique_stems_keep_plain_names() {
        let files = vec![video("a.mp4"), video("sub/b.mov")];
        assert_eq!(plan_output_names(&files), vec!["a_proxy.mp4", "b_proxy.mp4"]);
    }

    #[test]
    fn test_colliding_stems_use_parent_directory() {
        let files = vec![
            video("2020/paris/clip.mov"),
            video("2021/paris/clip.mov"),
            video("clip.mp4"),
        ];
        assert_eq!(
            plan_output_names(&files),
            vec!["clip_proxy.mp4", "clip_2021-paris_proxy.mp4", "clip_mp4_proxy.mp4"]
        );
    }

    #[test]
    fn test_same_directory_collision_uses_extension() {
        let files = vec![video("clip.mov"), video("clip.MKV")];
        assert_eq!(
            plan_output_names(&files),
            vec!["clip_proxy.mp4", "clip_mkv_proxy.mp4"]
        );
    }

    #[test]
    fn test_collision_is_case_insensitive() {
        let files = vec![video("Clip.mov"), video("x/clip.mov")];
        assert_eq!(
            plan_output_names(&files),
            vec!["Clip_proxy.mp4", "clip_x_proxy.mp4"]
        );
    }

    #[test]
    fn test_counter_when_everything_is_taken() {
        let files = vec![
            video("clip.mov"),
            video("clip_mov.mp4"),
            video("clip.MOV"),
        ];
        let names = plan_output_names(&files);
        assert_eq!(names[0], "clip_proxy.mp4");
        assert_eq!(names[1], "clip_mov_proxy.mp4");
        assert_eq!(names[2], "clip_mov_2_proxy.mp4");
    }

    #[test]
    fn test_plan_is_deterministic() {
        let files = vec![video("a/x.mp4"), video("b/x.mp4"), video("c/x.mp4")];
        assert_eq!(plan_output_names(&files), plan_output_names(&files));
    }
}
