//! Navigation links for a material page
//!
//! A page links backwards to what it depends on and to the previous item of any
//! event it is scheduled in, and forwards to the next event item and to every
//! course or section that depends on it.

use serde::{Deserialize, Serialize};

use crate::material::{MaterialTree, NodeKey};
use crate::reference::{self, Lookup};

/// A scheduled run of material
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    #[serde(default)]
    pub groups: Vec<EventGroup>,
}

/// A block of an event (e.g. one day)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventGroup {
    pub name: String,
    #[serde(default)]
    pub items: Vec<EventItem>,
}

/// A ref scheduled within a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventItem {
    pub section: String,
    pub order: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Prev,
    Next,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    /// Neighbour in an event schedule
    Event,
    /// Dependency within the same course
    Internal,
    /// Dependency in another course
    External,
}

/// A link rendered in a page footer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionLink {
    pub kind: LinkKind,
    pub direction: Direction,
    pub url: Option<String>,
    pub theme: Option<String>,
    pub course: Option<String>,
    pub section: Option<String>,
    pub tags: Vec<String>,
}

impl SectionLink {
    fn new(
        kind: LinkKind,
        direction: Direction,
        raw: &str,
        tree: &MaterialTree,
        base_path: &str,
    ) -> Self {
        let found = reference::lookup(raw, tree);
        let resolution = reference::resolve(raw, tree, base_path);
        Self {
            kind,
            direction,
            url: resolution.resolved().map(|r| r.url.clone()),
            theme: found.theme.map(|t| t.name.clone()),
            course: found.course.map(|c| c.name.clone()),
            section: found.section.map(|s| s.name.clone()),
            tags: found.section.map(|s| s.tags.clone()).unwrap_or_default(),
        }
    }
}

/// Same course as the page → internal, otherwise external
fn dependency_kind(page: &NodeKey, found: &Lookup<'_>) -> LinkKind {
    let page_course = match page {
        NodeKey::Course { theme, course, .. } | NodeKey::Section { theme, course, .. } => {
            Some((theme.as_str(), course.as_str()))
        }
        NodeKey::Theme { .. } => None,
    };
    let linked_course = found.course.map(|c| (c.theme.as_str(), c.id.as_str()));

    if page_course.is_some() && page_course == linked_course {
        LinkKind::Internal
    } else {
        LinkKind::External
    }
}

/// Refs of every course or section whose dependencies name `page`
fn dependents(tree: &MaterialTree, page: &NodeKey) -> Vec<String> {
    let target = page.dotted_without_repo();
    let mut found = Vec::new();

    for theme in &tree.themes {
        for course in &theme.courses {
            if course.dependencies.contains(&target) {
                found.push(NodeKey::course(&theme.repo, &theme.id, &course.id).dotted());
            }
            for section in &course.sections {
                if section.dependencies.contains(&target) {
                    let key = NodeKey::section(&theme.repo, &theme.id, &course.id, &section.id);
                    found.push(key.dotted());
                }
            }
        }
    }
    found
}

/// Build the navigation links for `page`
pub fn find_links(
    tree: &MaterialTree,
    page: &NodeKey,
    active_event: Option<&Event>,
    base_path: &str,
) -> Vec<SectionLink> {
    let page_ref = page.dotted();
    let mut links = Vec::new();

    if let Some(event) = active_event {
        for group in &event.groups {
            let mut items: Vec<&EventItem> = group.items.iter().collect();
            items.sort_by_key(|item| item.order);

            for (i, item) in items.iter().enumerate() {
                if reference::canonical(&item.section, tree).as_ref() != Some(page) {
                    continue;
                }
                if let Some(prev) = i.checked_sub(1).and_then(|p| items.get(p)) {
                    links.push(SectionLink::new(
                        LinkKind::Event,
                        Direction::Prev,
                        &prev.section,
                        tree,
                        base_path,
                    ));
                }
                if let Some(next) = items.get(i + 1) {
                    links.push(SectionLink::new(
                        LinkKind::Event,
                        Direction::Next,
                        &next.section,
                        tree,
                        base_path,
                    ));
                }
            }
        }
    }

    let NodeKey::Section { repo, .. } = page else {
        return links;
    };

    let section = reference::lookup(&page_ref, tree).section;
    for dep in section.map(|s| s.dependencies.as_slice()).unwrap_or_default() {
        let raw = format!("{repo}.{dep}");
        let found = reference::lookup(&raw, tree);
        let kind = dependency_kind(page, &found);
        links.push(SectionLink::new(kind, Direction::Prev, &raw, tree, base_path));
    }

    for raw in dependents(tree, page) {
        let found = reference::lookup(&raw, tree);
        let kind = dependency_kind(page, &found);
        links.push(SectionLink::new(kind, Direction::Next, &raw, tree, base_path));
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::{Course, Section, Theme};
    use pretty_assertions::assert_eq;

    fn tree() -> MaterialTree {
        let mut cpp = Theme::new("hpc", "cpp", "C++");

        let mut basics = Course::new("cpp", "basics", "Basics");
        basics.sections.push(Section::new("cpp", "basics", "intro", "Intro"));
        let mut types = Section::new("cpp", "basics", "types", "Types").with_tags(["cpp"]);
        types.dependencies = vec!["cpp.basics.intro".into()];
        basics.sections.push(types);

        let mut advanced = Course::new("cpp", "advanced", "Advanced");
        advanced.dependencies = vec!["cpp.basics.types".into()];
        let mut templates = Section::new("cpp", "advanced", "templates", "Templates");
        templates.dependencies = vec!["cpp.basics.types".into()];
        advanced.sections.push(templates);

        cpp.courses.push(basics);
        cpp.courses.push(advanced);
        MaterialTree::new(vec![cpp])
    }

    #[test]
    fn dependencies_link_backwards() {
        let tree = tree();
        let page = NodeKey::section("hpc", "cpp", "basics", "types");
        let links = find_links(&tree, &page, None, "");

        let prev: Vec<_> = links.iter().filter(|l| l.direction == Direction::Prev).collect();
        assert_eq!(prev.len(), 1);
        assert_eq!(prev[0].kind, LinkKind::Internal);
        assert_eq!(prev[0].section.as_deref(), Some("Intro"));
        assert_eq!(prev[0].url.as_deref(), Some("/material/hpc/cpp/basics/intro"));
    }

    #[test]
    fn dependents_link_forwards() {
        let tree = tree();
        let page = NodeKey::section("hpc", "cpp", "basics", "types");
        let links = find_links(&tree, &page, None, "");

        let next: Vec<_> = links.iter().filter(|l| l.direction == Direction::Next).collect();
        assert_eq!(next.len(), 2);
        assert!(next.iter().all(|l| l.kind == LinkKind::External));
        assert_eq!(next[0].course.as_deref(), Some("Advanced"));
        assert_eq!(next[0].section, None);
        assert_eq!(next[1].section.as_deref(), Some("Templates"));
    }

    #[test]
    fn event_neighbours_follow_order() {
        let tree = tree();
        let event = Event {
            name: "Spring school".into(),
            groups: vec![EventGroup {
                name: "Day 1".into(),
                items: vec![
                    EventItem { section: "hpc.cpp.advanced.templates".into(), order: 3 },
                    EventItem { section: "hpc.cpp.basics.intro".into(), order: 1 },
                    EventItem { section: "hpc.cpp.basics.types".into(), order: 2 },
                ],
            }],
        };
        let page = NodeKey::section("hpc", "cpp", "basics", "types");
        let links = find_links(&tree, &page, Some(&event), "/c");

        let event_links: Vec<_> = links.iter().filter(|l| l.kind == LinkKind::Event).collect();
        assert_eq!(event_links.len(), 2);
        assert_eq!(event_links[0].direction, Direction::Prev);
        assert_eq!(event_links[0].section.as_deref(), Some("Intro"));
        assert_eq!(event_links[1].direction, Direction::Next);
        assert_eq!(event_links[1].url.as_deref(), Some("/c/material/hpc/cpp/advanced/templates"));
    }

    #[test]
    fn legacy_event_items_match_qualified_page() {
        let tree = tree();
        let event = Event {
            name: "Autumn school".into(),
            groups: vec![EventGroup {
                name: "Day 1".into(),
                items: vec![
                    EventItem { section: "cpp.basics.intro".into(), order: 1 },
                    EventItem { section: "cpp.basics.types".into(), order: 2 },
                ],
            }],
        };
        let page = NodeKey::section("hpc", "cpp", "basics", "types");
        let links = find_links(&tree, &page, Some(&event), "");

        let event_links: Vec<_> = links.iter().filter(|l| l.kind == LinkKind::Event).collect();
        assert_eq!(event_links.len(), 1);
        assert_eq!(event_links[0].direction, Direction::Prev);
        assert_eq!(event_links[0].url.as_deref(), Some("/material/hpc/cpp/basics/intro"));
    }

    #[test]
    fn first_event_item_has_no_prev() {
        let tree = tree();
        let event = Event {
            name: "e".into(),
            groups: vec![EventGroup {
                name: "g".into(),
                items: vec![EventItem { section: "hpc.cpp.basics.intro".into(), order: 1 }],
            }],
        };
        let page = NodeKey::section("hpc", "cpp", "basics", "intro");
        let links = find_links(&tree, &page, Some(&event), "");
        assert!(links.iter().all(|l| l.kind != LinkKind::Event));
    }

    #[test]
    fn course_pages_only_get_event_links() {
        let tree = tree();
        let page = NodeKey::course("hpc", "cpp", "basics");
        assert!(find_links(&tree, &page, None, "").is_empty());
    }

    #[test]
    fn unresolved_dependency_still_listed() {
        let mut tree = tree();
        tree.themes[0].courses[0].sections[0].dependencies = vec!["gone.away".into()];
        let page = NodeKey::section("hpc", "cpp", "basics", "intro");
        let links = find_links(&tree, &page, None, "");

        let prev: Vec<_> = links.iter().filter(|l| l.direction == Direction::Prev).collect();
        assert_eq!(prev.len(), 1);
        assert_eq!(prev[0].url, None);
        assert_eq!(prev[0].kind, LinkKind::External);
    }
}
