//! Material loader
//!
//! Builds a [`MaterialTree`] from synced repo checkouts. Each level of the
//! hierarchy is a directory with an `index.md` whose front matter lists the
//! children in display order:
//!
//! ```text
//! <material_dir>/<repo>/index.md                  themes: [...]
//! <material_dir>/<repo>/<theme>/index.md          name, summary, courses: [...]
//! <material_dir>/<repo>/<theme>/<course>/index.md name, summary, dependsOn, files: [...]
//! <material_dir>/<repo>/<theme>/<course>/<file>   name, tags, dependsOn, attribution
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::error::MaterialError;
use super::frontmatter;
use super::model::{Attribution, Course, MaterialTree, Section, Theme};
use crate::config::{Config, Excludes};

/// Challenge directives declaring a problem, e.g. `::::challenge{id=ex1 title="Loops"}`.
/// `id` and `title` may come in either order.
static CHALLENGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#":{3,}challenge\s*\{\s*(?:id\s*=\s*"?([^"\s]+)"?\s*title\s*=\s*"[^"]+"|title\s*=\s*"[^"]+"\s*id\s*=\s*"?([^"\s]+)"?)\s*\}"#,
    )
    .unwrap()
});

const INDEX_FILE: &str = "index.md";

/// Options controlling what the loader keeps
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Drop markdown bodies (navigation-only trees)
    pub no_markdown: bool,
}

#[derive(Debug, Default, Deserialize)]
struct RepoIndex {
    #[serde(default)]
    themes: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ThemeIndex {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    courses: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CourseIndex {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    depends_on: Vec<String>,
    #[serde(default)]
    files: Vec<String>,
    #[serde(default)]
    attribution: Vec<Attribution>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SectionMeta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    depends_on: Vec<String>,
    #[serde(default)]
    attribution: Vec<Attribution>,
}

/// Load every configured repo into a single tree, in config order
pub fn load_tree(config: &Config, options: LoadOptions) -> Result<MaterialTree> {
    let mut themes = Vec::new();

    for repo in &config.repos {
        let repo_themes = load_repo(&config.material_dir, &repo.path, &repo.exclude, options)
            .with_context(|| format!("Failed to load repo {:?}", repo.key))?;
        tracing::info!("Loaded {} themes from {}", repo_themes.len(), repo.path);
        themes.extend(repo_themes);
    }

    Ok(MaterialTree::new(themes))
}

/// Load a single repo's themes
pub fn load_repo(
    material_dir: &Path,
    repo: &str,
    excludes: &Excludes,
    options: LoadOptions,
) -> Result<Vec<Theme>> {
    let dir = material_dir.join(repo);
    let (index, _) = read_index::<RepoIndex>(&dir.join(INDEX_FILE))?;

    let mut themes = Vec::with_capacity(index.themes.len());
    for theme_id in &index.themes {
        if excludes.themes.contains(theme_id) {
            tracing::debug!("Excluding theme {}.{}", repo, theme_id);
            continue;
        }
        themes.push(load_theme(&dir, repo, theme_id, excludes, options)?);
    }
    Ok(themes)
}

fn load_theme(
    repo_dir: &Path,
    repo: &str,
    theme_id: &str,
    excludes: &Excludes,
    options: LoadOptions,
) -> Result<Theme> {
    let dir = repo_dir.join(theme_id);
    let (index, body) = read_index::<ThemeIndex>(&dir.join(INDEX_FILE))?;

    let mut theme = Theme::new(repo, theme_id, index.name.unwrap_or_else(|| humanize(theme_id)));
    theme.summary = index.summary;
    if !options.no_markdown {
        theme.markdown = body;
    }

    for course_id in &index.courses {
        if excludes.courses.contains(course_id) {
            tracing::debug!("Excluding course {}.{}.{}", repo, theme_id, course_id);
            continue;
        }
        theme.courses.push(load_course(&dir, theme_id, course_id, excludes, options)?);
    }
    Ok(theme)
}

fn load_course(
    theme_dir: &Path,
    theme_id: &str,
    course_id: &str,
    excludes: &Excludes,
    options: LoadOptions,
) -> Result<Course> {
    let dir = theme_dir.join(course_id);
    let (index, body) = read_index::<CourseIndex>(&dir.join(INDEX_FILE))?;

    let mut course =
        Course::new(theme_id, course_id, index.name.unwrap_or_else(|| humanize(course_id)));
    course.summary = index.summary.unwrap_or_default();
    course.dependencies = index.depends_on;
    course.attribution = index.attribution;
    if !options.no_markdown {
        course.markdown = body;
    }

    for (position, file) in index.files.iter().enumerate() {
        let section = load_section(&dir, theme_id, course_id, position, file, options)?;
        if excludes.sections.contains(&section.id) {
            tracing::debug!("Excluding section {}.{}.{}", theme_id, course_id, section.id);
            continue;
        }
        course.sections.push(section);
    }
    Ok(course)
}

fn load_section(
    course_dir: &Path,
    theme_id: &str,
    course_id: &str,
    position: usize,
    file: &str,
    options: LoadOptions,
) -> Result<Section> {
    let path = course_dir.join(file);
    tracing::debug!("Reading section {}", path.display());

    let text = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read section file: {}", path.display()))?;
    let (meta, body) = parse_front_matter::<SectionMeta>(&path, &text)?;
    let meta = meta.unwrap_or_default();

    let id = file_stem(file);
    let mut section = Section::new(
        theme_id,
        course_id,
        id,
        meta.name.unwrap_or_else(|| humanize(file)),
    );
    section.file = file.to_string();
    section.index = position;
    section.tags = meta.tags;
    section.dependencies = meta.depends_on;
    section.attribution = meta.attribution;
    section.problems = extract_problems(body);
    if !options.no_markdown {
        section.markdown = body.to_string();
    }
    Ok(section)
}

/// Read an `index.md`, which must carry front matter
fn read_index<T: DeserializeOwned>(path: &Path) -> Result<(T, String)> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read index file: {}", path.display()))?;
    let (meta, body) = parse_front_matter::<T>(path, &text)?;
    let meta = meta.ok_or_else(|| MaterialError::MissingFrontMatter { path: path.to_path_buf() })?;
    Ok((meta, body.to_string()))
}

fn parse_front_matter<'a, T: DeserializeOwned>(
    path: &Path,
    text: &'a str,
) -> Result<(Option<T>, &'a str), MaterialError> {
    frontmatter::split::<T>(text)
        .map_err(|source| MaterialError::InvalidFrontMatter { path: path.to_path_buf(), source })
}

/// Problem tags declared in a section body, first occurrence wins
pub fn extract_problems(markdown: &str) -> Vec<String> {
    let mut problems: Vec<String> = Vec::new();
    for caps in CHALLENGE_RE.captures_iter(markdown) {
        let Some(id) = caps.get(1).or_else(|| caps.get(2)) else {
            continue;
        };
        let id = id.as_str();
        if !problems.iter().any(|p| p == id) {
            problems.push(id.to_string());
        }
    }
    problems
}

/// File name without its final, non-empty extension
fn file_stem(file: &str) -> String {
    match file.rfind('.') {
        Some(idx) if idx > 0 && is_extension(&file[idx + 1..]) => file[..idx].to_string(),
        _ => file.to_string(),
    }
}

fn is_extension(ext: &str) -> bool {
    !ext.is_empty() && !ext.contains('/')
}

/// Turn `some_file_name.md` into `Some File Name`
pub fn humanize(name: &str) -> String {
    file_stem(name)
        .split('_')
        .map(|frag| {
            let mut chars = frag.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepoConfig;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn material_fixture() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        write(root, "hpc/index.md", "---\nname: HPC\nthemes: [cpp, draft]\n---\n");
        write(root, "hpc/cpp/index.md", "---\nname: C++\nsummary: Systems\ncourses: [basics]\n---\nTheme body\n");
        write(
            root,
            "hpc/cpp/basics/index.md",
            "---\nname: Basics\ndependsOn: [python.intro]\nfiles: [intro.md, loops_and_more.md, wip.md]\n---\nCourse body\n",
        );
        write(
            root,
            "hpc/cpp/basics/intro.md",
            concat!(
                "---\nname: Introduction\ntags: [cpp]\n---\n",
                "# Intro\n\n",
                ":::challenge{id=ex1 title=\"First\"}\nDo it\n:::\n\n",
                "::::challenge{title=\"Second\" id=\"ex2\"}\nAgain\n::::\n\n",
                ":::challenge{id=ex1 title=\"Duplicate\"}\n:::\n",
            ),
        );
        write(root, "hpc/cpp/basics/loops_and_more.md", "No front matter here\n");
        write(root, "hpc/cpp/basics/wip.md", "---\nname: WIP\n---\n");
        write(root, "hpc/draft/index.md", "---\nname: Draft\ncourses: []\n---\n");

        temp
    }

    fn config_for(temp: &TempDir) -> Config {
        Config {
            material_dir: temp.path().to_path_buf(),
            base_path: String::new(),
            repos: vec![RepoConfig {
                key: "hpc".into(),
                path: "hpc".into(),
                url: String::new(),
                exclude: Excludes {
                    themes: vec!["draft".into()],
                    courses: vec![],
                    sections: vec!["wip".into()],
                },
            }],
        }
    }

    #[test]
    fn loads_hierarchy_with_excludes() {
        let temp = material_fixture();
        let tree = load_tree(&config_for(&temp), LoadOptions::default()).unwrap();

        assert_eq!(tree.themes.len(), 1);
        let theme = &tree.themes[0];
        assert_eq!(theme.repo, "hpc");
        assert_eq!(theme.name, "C++");
        assert_eq!(theme.summary.as_deref(), Some("Systems"));
        assert_eq!(theme.markdown, "Theme body\n");

        let course = &theme.courses[0];
        assert_eq!(course.dependencies, vec!["python.intro".to_string()]);
        let ids: Vec<_> = course.sections.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["intro", "loops_and_more"]);
    }

    #[test]
    fn sections_get_problems_tags_and_names() {
        let temp = material_fixture();
        let tree = load_tree(&config_for(&temp), LoadOptions::default()).unwrap();
        let sections = &tree.themes[0].courses[0].sections;

        assert_eq!(sections[0].name, "Introduction");
        assert_eq!(sections[0].tags, vec!["cpp".to_string()]);
        assert_eq!(sections[0].problems, vec!["ex1".to_string(), "ex2".to_string()]);
        assert_eq!(sections[0].index, 0);

        assert_eq!(sections[1].name, "Loops And More");
        assert_eq!(sections[1].index, 1);
        assert!(sections[1].problems.is_empty());
    }

    #[test]
    fn no_markdown_still_extracts_problems() {
        let temp = material_fixture();
        let options = LoadOptions { no_markdown: true };
        let tree = load_tree(&config_for(&temp), options).unwrap();

        let (_, _, intro) = tree.iter_sections().next().unwrap();
        assert!(intro.markdown.is_empty());
        assert_eq!(intro.problems.len(), 2);
        assert!(tree.themes[0].markdown.is_empty());
    }

    #[test]
    fn missing_index_is_an_error() {
        let temp = TempDir::new().unwrap();
        let err = load_tree(&config_for(&temp), LoadOptions::default()).unwrap_err();
        assert!(format!("{err:#}").contains("index.md"));
    }

    #[test]
    fn index_without_front_matter_is_an_error() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "hpc/index.md", "# no front matter\n");
        let err = load_tree(&config_for(&temp), LoadOptions::default()).unwrap_err();
        assert!(format!("{err:#}").contains("Missing front matter"));
    }

    #[test]
    fn humanize_file_names() {
        assert_eq!(humanize("intro_to_cpp.md"), "Intro To Cpp");
        assert_eq!(humanize("loops"), "Loops");
        assert_eq!(humanize("a__b.md"), "A  B");
    }

    #[test]
    fn file_stem_needs_a_real_extension() {
        assert_eq!(file_stem("intro.md"), "intro");
        assert_eq!(file_stem("archive.tar.gz"), "archive.tar");
        assert_eq!(file_stem("foo."), "foo.");
        assert_eq!(file_stem("notes"), "notes");
        assert_eq!(file_stem("v1.0/readme"), "v1.0/readme");
    }

    #[test]
    fn extract_problems_ignores_other_directives() {
        let md = ":::solution\nx\n:::\n::challenge{id=short title=\"t\"}\n";
        assert!(extract_problems(md).is_empty());
    }
}
