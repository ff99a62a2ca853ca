//! Content model for course material
//!
//! Material is organised as repo → theme → course → section. Ids are only unique
//! within their parent, so a node's global identity is its full dotted path
//! (`repo.theme.course.section`).

use serde::{Deserialize, Serialize};

/// Credit for third-party material used in a course or section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    #[serde(default)]
    pub citation: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub license: String,
}

/// The complete material hierarchy across all configured repos
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MaterialTree {
    /// Themes in declared repo order, then declared theme order
    pub themes: Vec<Theme>,
}

impl MaterialTree {
    /// Create a tree from themes in display order
    pub fn new(themes: Vec<Theme>) -> Self {
        Self { themes }
    }

    /// Find a theme by id across all repos (first match wins)
    pub fn find_theme(&self, id: &str) -> Option<&Theme> {
        self.themes.iter().find(|t| t.id == id)
    }

    /// Find a theme by id within a single repo
    pub fn find_theme_in_repo(&self, repo: &str, id: &str) -> Option<&Theme> {
        self.themes.iter().find(|t| t.repo == repo && t.id == id)
    }

    /// Does any theme come from this repo?
    pub fn has_repo(&self, repo: &str) -> bool {
        self.themes.iter().any(|t| t.repo == repo)
    }

    /// Walk every section together with its parents
    pub fn iter_sections(&self) -> impl Iterator<Item = (&Theme, &Course, &Section)> {
        self.themes.iter().flat_map(|theme| {
            theme.courses.iter().flat_map(move |course| {
                course.sections.iter().map(move |section| (theme, course, section))
            })
        })
    }

    /// Total section count across all themes
    pub fn section_count(&self) -> usize {
        self.iter_sections().count()
    }

    /// Total number of declared problems across all sections
    pub fn problem_count(&self) -> usize {
        self.iter_sections().map(|(_, _, s)| s.problems.len()).sum()
    }

    /// Clear markdown bodies on every node except `keep`.
    ///
    /// Pages only render one node's body; everything else is navigation.
    pub fn strip_markdown(&mut self, keep: Option<&NodeKey>) {
        let keeps = |key: NodeKey| keep.is_some_and(|k| *k == key);

        for theme in &mut self.themes {
            if !keeps(NodeKey::theme(&theme.repo, &theme.id)) {
                theme.markdown.clear();
            }
            for course in &mut theme.courses {
                if !keeps(NodeKey::course(&theme.repo, &theme.id, &course.id)) {
                    course.markdown.clear();
                }
                for section in &mut course.sections {
                    let key = NodeKey::section(&theme.repo, &theme.id, &course.id, &section.id);
                    if !keeps(key) {
                        section.markdown.clear();
                    }
                }
            }
        }
    }
}

/// A top-level theme, sourced from one repo
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    /// Repo (content collection) this theme came from
    pub repo: String,
    /// Unique within the repo
    pub id: String,
    pub name: String,
    pub summary: Option<String>,
    pub markdown: String,
    pub courses: Vec<Course>,
}

impl Theme {
    pub fn new(repo: impl Into<String>, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            repo: repo.into(),
            id: id.into(),
            name: name.into(),
            summary: None,
            markdown: String::new(),
            courses: Vec::new(),
        }
    }

    pub fn find_course(&self, id: &str) -> Option<&Course> {
        self.courses.iter().find(|c| c.id == id)
    }
}

/// A course within a theme
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    /// Unique within the theme
    pub id: String,
    /// Parent theme id
    pub theme: String,
    pub name: String,
    pub summary: String,
    /// Legacy `theme.course[.section]` refs this course builds on
    pub dependencies: Vec<String>,
    pub markdown: String,
    pub attribution: Vec<Attribution>,
    pub sections: Vec<Section>,
}

impl Course {
    pub fn new(theme: impl Into<String>, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            theme: theme.into(),
            name: name.into(),
            summary: String::new(),
            dependencies: Vec::new(),
            markdown: String::new(),
            attribution: Vec::new(),
            sections: Vec::new(),
        }
    }

    pub fn find_section(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }
}

/// A single page of material within a course
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// File stem, unique within the course
    pub id: String,
    /// Source file name
    pub file: String,
    pub theme: String,
    pub course: String,
    pub name: String,
    /// Position in the course's file list
    pub index: usize,
    pub markdown: String,
    /// Free-form labels (e.g. language tags)
    pub tags: Vec<String>,
    pub dependencies: Vec<String>,
    pub attribution: Vec<Attribution>,
    /// Problem tags declared by challenge blocks, unique within the section
    pub problems: Vec<String>,
}

impl Section {
    pub fn new(
        theme: impl Into<String>,
        course: impl Into<String>,
        id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            file: format!("{id}.md"),
            id,
            theme: theme.into(),
            course: course.into(),
            name: name.into(),
            index: 0,
            markdown: String::new(),
            tags: Vec::new(),
            dependencies: Vec::new(),
            attribution: Vec::new(),
            problems: Vec::new(),
        }
    }

    /// Builder helper for declaring problems
    pub fn with_problems<I, S>(mut self, problems: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.problems = problems.into_iter().map(Into::into).collect();
        self
    }

    /// Builder helper for tags
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Fully-qualified identity of a node in the tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKey {
    Theme { repo: String, theme: String },
    Course { repo: String, theme: String, course: String },
    Section { repo: String, theme: String, course: String, section: String },
}

impl NodeKey {
    pub fn theme(repo: &str, theme: &str) -> Self {
        Self::Theme { repo: repo.into(), theme: theme.into() }
    }

    pub fn course(repo: &str, theme: &str, course: &str) -> Self {
        Self::Course { repo: repo.into(), theme: theme.into(), course: course.into() }
    }

    pub fn section(repo: &str, theme: &str, course: &str, section: &str) -> Self {
        Self::Section {
            repo: repo.into(),
            theme: theme.into(),
            course: course.into(),
            section: section.into(),
        }
    }

    /// Path segments in order, starting with the repo
    pub fn segments(&self) -> Vec<&str> {
        match self {
            NodeKey::Theme { repo, theme } => vec![repo.as_str(), theme.as_str()],
            NodeKey::Course { repo, theme, course } => {
                vec![repo.as_str(), theme.as_str(), course.as_str()]
            }
            NodeKey::Section { repo, theme, course, section } => {
                vec![repo.as_str(), theme.as_str(), course.as_str(), section.as_str()]
            }
        }
    }

    /// Dotted repo-qualified ref, e.g. `hpc.cpp.basics.intro`
    pub fn dotted(&self) -> String {
        self.segments().join(".")
    }

    /// Dotted ref without the repo, the form used in `dependsOn` lists
    pub fn dotted_without_repo(&self) -> String {
        self.segments()[1..].join(".")
    }

    /// Page URL under `base_path`
    pub fn url(&self, base_path: &str) -> String {
        format!("{}/material/{}", base_path.trim_end_matches('/'), self.segments().join("/"))
    }
}

impl std::fmt::Display for NodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.dotted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> MaterialTree {
        let mut cpp = Theme::new("hpc", "cpp", "C++");
        cpp.markdown = "theme body".into();
        let mut basics = Course::new("cpp", "basics", "Basics");
        basics.markdown = "course body".into();
        let mut intro = Section::new("cpp", "basics", "intro", "Introduction")
            .with_problems(["ex1", "ex2"]);
        intro.markdown = "section body".into();
        basics.sections.push(intro);
        basics.sections.push(Section::new("cpp", "basics", "types", "Types").with_problems(["t1"]));
        cpp.courses.push(basics);

        let python = Theme::new("scripting", "python", "Python");
        MaterialTree::new(vec![cpp, python])
    }

    #[test]
    fn section_and_problem_counts() {
        let tree = sample_tree();
        assert_eq!(tree.section_count(), 2);
        assert_eq!(tree.problem_count(), 3);
    }

    #[test]
    fn lookups_are_scoped_to_parent() {
        let tree = sample_tree();
        assert!(tree.find_theme("cpp").is_some());
        assert!(tree.find_theme_in_repo("hpc", "cpp").is_some());
        assert!(tree.find_theme_in_repo("scripting", "cpp").is_none());
        assert!(tree.has_repo("scripting"));
        assert!(!tree.has_repo("cpp"));

        let course = tree.find_theme("cpp").and_then(|t| t.find_course("basics"));
        assert_eq!(course.and_then(|c| c.find_section("types")).map(|s| s.name.as_str()), Some("Types"));
    }

    #[test]
    fn strip_markdown_keeps_only_requested_node() {
        let mut tree = sample_tree();
        let keep = NodeKey::section("hpc", "cpp", "basics", "intro");
        tree.strip_markdown(Some(&keep));

        let theme = &tree.themes[0];
        assert!(theme.markdown.is_empty());
        assert!(theme.courses[0].markdown.is_empty());
        assert_eq!(theme.courses[0].sections[0].markdown, "section body");
    }

    #[test]
    fn strip_markdown_without_keep_clears_everything() {
        let mut tree = sample_tree();
        tree.strip_markdown(None);
        assert!(tree.iter_sections().all(|(_, _, s)| s.markdown.is_empty()));
    }

    #[test]
    fn node_key_urls() {
        let key = NodeKey::section("hpc", "cpp", "basics", "intro");
        assert_eq!(key.dotted(), "hpc.cpp.basics.intro");
        assert_eq!(key.dotted_without_repo(), "cpp.basics.intro");
        assert_eq!(key.url("/portal/"), "/portal/material/hpc/cpp/basics/intro");
        assert_eq!(NodeKey::theme("hpc", "cpp").url(""), "/material/hpc/cpp");
    }
}
