//! Problem completion progress
//!
//! Completion facts are owned by the record store; this module only reads a
//! supplied batch and derives summaries from it. Nothing is cached: summaries
//! are recomputed from the current facts on every call.
//!
//! [`summarize`] compares section refs as written. Records may be stored under
//! either ref convention, so callers holding a tree use [`summarize_in`], which
//! matches facts by the node they name.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::material::MaterialTree;
use crate::reference;

/// One user's recorded state for one declared problem of one section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemFact {
    pub user_email: String,
    /// Section ref the problem belongs to, as stored
    pub section: String,
    pub tag: String,
    pub complete: bool,
}

impl ProblemFact {
    pub fn new(
        user_email: impl Into<String>,
        section: impl Into<String>,
        tag: impl Into<String>,
        complete: bool,
    ) -> Self {
        Self { user_email: user_email.into(), section: section.into(), tag: tag.into(), complete }
    }
}

/// Whose facts a summary counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// A single user's own progress
    Own { user: String },
    /// Every user in the supplied facts (instructor view)
    All,
}

/// A viewer's role on an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Student,
    Instructor,
}

impl Role {
    /// Instructors see everyone's progress, students only their own
    pub fn scope(self, user: &str) -> Scope {
        match self {
            Role::Student => Scope::Own { user: user.to_string() },
            Role::Instructor => Scope::All,
        }
    }
}

/// Derived completion counts for one section
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSummary {
    pub completed: usize,
    pub total: usize,
    pub is_fully_complete: bool,
}

impl CompletionSummary {
    fn new(completed: usize, total: usize) -> Self {
        Self { completed, total, is_fully_complete: total > 0 && completed == total }
    }

    /// No gradable problems; distinct from "fully complete"
    pub fn is_vacuous(&self) -> bool {
        self.total == 0
    }

    /// `[completed/total]`, or empty when there is nothing to grade
    pub fn label(&self) -> String {
        if self.is_vacuous() {
            String::new()
        } else {
            format!("[{}/{}]", self.completed, self.total)
        }
    }

    pub fn ratio(&self) -> Option<f64> {
        (self.total > 0).then(|| self.completed as f64 / self.total as f64)
    }
}

/// Number of distinct users appearing anywhere in `facts`
pub fn distinct_users(facts: &[ProblemFact]) -> usize {
    facts.iter().map(|f| f.user_email.as_str()).collect::<HashSet<_>>().len()
}

/// Summarise completion of `section`'s declared problems.
///
/// `facts` is the whole batch for the request (typically an event). Only facts
/// for `section` are counted as completions, but in [`Scope::All`] every user in
/// the batch counts towards the total, floored at one user.
pub fn summarize(
    section: &str,
    declared: &BTreeSet<String>,
    facts: &[ProblemFact],
    scope: &Scope,
) -> CompletionSummary {
    if declared.is_empty() {
        return CompletionSummary::default();
    }

    let counted =
        |f: &&ProblemFact| f.complete && f.section == section && declared.contains(&f.tag);

    match scope {
        Scope::Own { user } => {
            let done: HashSet<&str> = facts
                .iter()
                .filter(|f| f.user_email == *user)
                .filter(counted)
                .map(|f| f.tag.as_str())
                .collect();
            CompletionSummary::new(done.len(), declared.len())
        }
        Scope::All => {
            let users = distinct_users(facts).max(1);
            let done = facts.iter().filter(counted).count();
            CompletionSummary::new(done, declared.len() * users)
        }
    }
}

/// Rewrite each fact's section ref into its canonical repo-qualified form.
///
/// Refs that do not resolve are kept as written.
pub fn canonical_facts(facts: &[ProblemFact], tree: &MaterialTree) -> Vec<ProblemFact> {
    let mut seen: HashMap<&str, String> = HashMap::new();
    facts
        .iter()
        .map(|f| {
            let section = seen
                .entry(f.section.as_str())
                .or_insert_with(|| canonical_ref(&f.section, tree))
                .clone();
            ProblemFact { section, ..f.clone() }
        })
        .collect()
}

fn canonical_ref(raw: &str, tree: &MaterialTree) -> String {
    reference::canonical(raw, tree).map_or_else(|| raw.to_string(), |key| key.dotted())
}

/// Summarise the section `section` names in `tree`, whichever convention the
/// ref and the facts are written in. Unresolved sections are vacuous.
pub fn summarize_in(
    tree: &MaterialTree,
    section: &str,
    facts: &[ProblemFact],
    scope: &Scope,
) -> CompletionSummary {
    let resolution = reference::resolve(section, tree, "");
    let Some(resolved) = resolution.resolved() else {
        return CompletionSummary::default();
    };
    let facts = canonical_facts(facts, tree);
    summarize(&resolved.key.dotted(), &resolved.problems, &facts, scope)
}

/// A user's progress across every section of a course
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseProgress {
    pub total: usize,
    pub completed: usize,
    /// Unique non-empty section refs the course lists, in first-seen order
    pub sections: Vec<String>,
}

/// Sum one user's completions over the sections a course lists.
///
/// Refs naming the same node in different conventions count once. Sections
/// that do not resolve or declare no problems add nothing.
pub fn course_progress<'a, I>(
    section_refs: I,
    tree: &MaterialTree,
    facts: &[ProblemFact],
    user: &str,
) -> CourseProgress
where
    I: IntoIterator<Item = &'a str>,
{
    let mut sections: Vec<String> = Vec::new();
    let mut canonical: Vec<String> = Vec::new();
    for raw in section_refs {
        let key = canonical_ref(raw, tree);
        if !raw.is_empty() && !canonical.contains(&key) {
            sections.push(raw.to_string());
            canonical.push(key);
        }
    }

    let facts = canonical_facts(facts, tree);
    let scope = Scope::Own { user: user.to_string() };
    let (total, completed) = canonical
        .iter()
        .map(|key| {
            let declared = reference::resolve(key, tree, "").problems();
            summarize(key, &declared, &facts, &scope)
        })
        .fold((0, 0), |(total, completed), s| (total + s.total, completed + s.completed));

    CourseProgress { total, completed, sections }
}
