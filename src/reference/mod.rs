//! Section references
//!
//! Events, courses and progress records point at material with dotted refs.
//! Two conventions are in circulation:
//!
//! - repo-qualified (canonical): `repo.theme`, `repo.theme.course`,
//!   `repo.theme.course.section`
//! - legacy: `theme`, `theme.course`, `theme.course.section`
//!
//! A ref is read as repo-qualified when its first segment names a repo present
//! in the tree, or when it has four segments. Everything else is legacy. Repos
//! and themes often share an id (repo `python` holding theme `python`), so when
//! a two or three segment qualified reading finds nothing the same segments are
//! read as a legacy ref. If both readings find a node the qualified one wins.
//!
//! Resolution always produces repo-qualified keys and URLs, and [`canonical`]
//! is the identity to compare refs by: the two conventions name the same node
//! with different strings.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::material::{Course, MaterialTree, NodeKey, Section, Theme};

const MAX_SEGMENTS: usize = 4;

/// Which addressing convention a ref was written in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Convention {
    /// `repo.theme[.course[.section]]`
    Qualified,
    /// `theme[.course[.section]]`
    Legacy,
}

/// Level of the hierarchy a ref points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Depth {
    Theme,
    Course,
    Section,
}

impl Depth {
    /// Left indent used when listing refs, shallowest first
    pub fn indent(self) -> usize {
        match self {
            Depth::Theme => 2,
            Depth::Course => 4,
            Depth::Section => 6,
        }
    }
}

/// A parsed ref, borrowing its segments from the raw string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionRef<'a> {
    pub raw: &'a str,
    pub convention: Convention,
    pub repo: Option<&'a str>,
    pub theme: &'a str,
    pub course: Option<&'a str>,
    pub section: Option<&'a str>,
}

impl<'a> SectionRef<'a> {
    /// Parse `raw` against `tree`, which decides the convention of two and three
    /// segment refs. Returns `None` for empty refs, empty segments, or more than
    /// four segments.
    pub fn parse(raw: &'a str, tree: &MaterialTree) -> Option<Self> {
        let segments: Vec<&str> = raw.split('.').collect();
        if segments.len() > MAX_SEGMENTS || segments.iter().any(|s| s.is_empty()) {
            return None;
        }

        let qualified = match segments.len() {
            1 => false,
            MAX_SEGMENTS => true,
            _ => tree.has_repo(segments[0]),
        };

        let (convention, repo, rest) = if qualified {
            (Convention::Qualified, Some(segments[0]), &segments[1..])
        } else {
            (Convention::Legacy, None, &segments[..])
        };

        let (theme, rest) = rest.split_first()?;
        Some(Self {
            raw,
            convention,
            repo,
            theme: *theme,
            course: rest.first().copied(),
            section: rest.get(1).copied(),
        })
    }

    /// Level of the hierarchy this ref addresses
    pub fn depth(&self) -> Depth {
        match (self.course, self.section) {
            (None, _) => Depth::Theme,
            (Some(_), None) => Depth::Course,
            (Some(_), Some(_)) => Depth::Section,
        }
    }

    /// Walk repo → theme → course → section, stopping at the first missing link
    pub fn lookup<'t>(&self, tree: &'t MaterialTree) -> Lookup<'t> {
        let theme = match self.repo {
            Some(repo) => tree.find_theme_in_repo(repo, self.theme),
            None => tree.find_theme(self.theme),
        };
        let course = theme.zip(self.course).and_then(|(t, id)| t.find_course(id));
        let section = course.zip(self.section).and_then(|(c, id)| c.find_section(id));
        Lookup { theme, course, section }
    }

    /// The same segments read as a legacy ref, for two and three segment
    /// qualified readings
    fn as_legacy(&self) -> Option<Self> {
        if self.convention != Convention::Qualified || self.section.is_some() {
            return None;
        }
        Some(Self {
            raw: self.raw,
            convention: Convention::Legacy,
            repo: None,
            theme: self.repo?,
            course: Some(self.theme),
            section: self.course,
        })
    }

    /// Parse `raw` and look it up, falling back to the legacy reading when a
    /// qualified reading misses. A miss returns the first reading.
    pub fn find<'t>(raw: &'a str, tree: &'t MaterialTree) -> Option<(Self, Lookup<'t>)> {
        let sref = Self::parse(raw, tree)?;
        let found = sref.lookup(tree);
        if found.reaches(sref.depth()) {
            return Some((sref, found));
        }

        if let Some(legacy) = sref.as_legacy() {
            let alt = legacy.lookup(tree);
            if alt.reaches(legacy.depth()) {
                return Some((legacy, alt));
            }
        }
        Some((sref, found))
    }
}

/// Nodes found along a ref's path
#[derive(Debug, Clone, Copy, Default)]
pub struct Lookup<'t> {
    pub theme: Option<&'t Theme>,
    pub course: Option<&'t Course>,
    pub section: Option<&'t Section>,
}

impl Lookup<'_> {
    /// Whether the walk got as deep as `depth`
    pub fn reaches(&self, depth: Depth) -> bool {
        match depth {
            Depth::Theme => self.theme.is_some(),
            Depth::Course => self.course.is_some(),
            Depth::Section => self.section.is_some(),
        }
    }

    /// Repo-qualified key of the node at `depth`, if the walk reached it
    pub fn key(&self, depth: Depth) -> Option<NodeKey> {
        let theme = self.theme?;
        match depth {
            Depth::Theme => Some(NodeKey::theme(&theme.repo, &theme.id)),
            Depth::Course => self.course.map(|c| NodeKey::course(&theme.repo, &theme.id, &c.id)),
            Depth::Section => self.course.zip(self.section).map(|(c, s)| {
                NodeKey::section(&theme.repo, &theme.id, &c.id, &s.id)
            }),
        }
    }
}

/// Look up the nodes a raw ref names. Malformed refs find nothing.
pub fn lookup<'t>(raw: &str, tree: &'t MaterialTree) -> Lookup<'t> {
    SectionRef::find(raw, tree).map(|(_, found)| found).unwrap_or_default()
}

/// Canonical repo-qualified key of the node `raw` names, in either convention
pub fn canonical(raw: &str, tree: &MaterialTree) -> Option<NodeKey> {
    let (sref, found) = SectionRef::find(raw, tree)?;
    found.key(sref.depth())
}

/// A ref that resolved to a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolved {
    pub display_name: String,
    pub url: String,
    pub depth: Depth,
    /// Canonical repo-qualified identity
    pub key: NodeKey,
    /// Declared problem tags, only populated at section depth
    pub problems: BTreeSet<String>,
    pub tags: Vec<String>,
}

/// Outcome of resolving a ref
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Resolved(Resolved),
    NotFound {
        attempted: String,
        /// Depth implied by the ref's shape, if it parsed
        depth: Option<Depth>,
    },
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    pub fn resolved(&self) -> Option<&Resolved> {
        match self {
            Resolution::Resolved(r) => Some(r),
            Resolution::NotFound { .. } => None,
        }
    }

    /// Declared problem tags (empty unless resolved at section depth)
    pub fn problems(&self) -> BTreeSet<String> {
        self.resolved().map(|r| r.problems.clone()).unwrap_or_default()
    }

    /// Flatten into the label the list views render; misses become `Error: <ref>`
    pub fn display(&self) -> DisplayBundle {
        match self {
            Resolution::Resolved(r) => DisplayBundle {
                display_name: r.display_name.clone(),
                url: r.url.clone(),
                depth: Some(r.depth),
                declared_problem_tags: r.problems.clone(),
                tags: r.tags.clone(),
            },
            Resolution::NotFound { attempted, depth } => DisplayBundle {
                display_name: format!("Error: {attempted}"),
                url: String::new(),
                depth: *depth,
                declared_problem_tags: BTreeSet::new(),
                tags: Vec::new(),
            },
        }
    }
}

/// Render-ready view of a resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayBundle {
    pub display_name: String,
    /// Empty when the ref did not resolve
    pub url: String,
    pub depth: Option<Depth>,
    pub declared_problem_tags: BTreeSet<String>,
    pub tags: Vec<String>,
}

impl DisplayBundle {
    /// Indent for list views; unparseable refs sit flush left
    pub fn indent(&self) -> usize {
        self.depth.map_or(0, Depth::indent)
    }
}

/// Resolve `raw` against `tree`. Never fails: misses come back as `NotFound`.
pub fn resolve(raw: &str, tree: &MaterialTree, base_path: &str) -> Resolution {
    let Some((sref, found)) = SectionRef::find(raw, tree) else {
        return Resolution::NotFound { attempted: raw.to_string(), depth: None };
    };

    let depth = sref.depth();
    let Some(key) = found.key(depth) else {
        return Resolution::NotFound { attempted: raw.to_string(), depth: Some(depth) };
    };

    let (display_name, problems, tags) = match (depth, found.theme, found.course, found.section) {
        (Depth::Section, _, _, Some(s)) => {
            (s.name.clone(), s.problems.iter().cloned().collect(), s.tags.clone())
        }
        (Depth::Course, _, Some(c), _) => (c.name.clone(), BTreeSet::new(), Vec::new()),
        (_, Some(t), _, _) => (t.name.clone(), BTreeSet::new(), Vec::new()),
        _ => return Resolution::NotFound { attempted: raw.to_string(), depth: Some(depth) },
    };

    Resolution::Resolved(Resolved {
        display_name,
        url: key.url(base_path),
        depth,
        key,
        problems,
        tags,
    })
}
