//! Présentation des avertissements : rendu texte et différentiel entre deux balayages.

use crate::validation::{ValidationWarning, WarningSeverity};
use std::collections::BTreeSet;

/// Permet de customiser le rendu d'un avertissement (terminal, mail, etc.).
pub trait WarningRenderer {
    fn render(&self, warning: &ValidationWarning) -> String;
}

/// Rendu texte compact, une ligne de titre puis le détail.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextWarningRenderer {
    /// Ajoute l'action suggérée quand elle existe.
    pub with_action: bool,
}

impl WarningRenderer for TextWarningRenderer {
    fn render(&self, warning: &ValidationWarning) -> String {
        let mut out = format!(
            "[{severity}] {category}: {title}\n  {message}",
            severity = warning.severity,
            category = warning.category,
            title = warning.title,
            message = warning.message,
        );
        if !warning.affected_workers.is_empty() {
            let workers: Vec<&str> = warning.affected_workers.iter().map(|w| w.as_str()).collect();
            out.push_str(&format!("\n  workers: {}", workers.join(", ")));
        }
        if self.with_action {
            if let Some(action) = &warning.suggested_action {
                out.push_str(&format!("\n  -> {action}"));
            }
        }
        out
    }
}

/// Rend une liste, les plus graves d'abord (ordre stable sinon).
pub fn render_all(warnings: &[ValidationWarning], renderer: &dyn WarningRenderer) -> String {
    let mut sorted: Vec<&ValidationWarning> = warnings.iter().collect();
    sorted.sort_by(|a, b| b.severity.cmp(&a.severity));
    sorted
        .into_iter()
        .map(|w| renderer.render(w))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn has_critical(warnings: &[ValidationWarning]) -> bool {
    warnings
        .iter()
        .any(|w| w.severity == WarningSeverity::Critical)
}

/// Différence entre deux balayages, calculée sur les identifiants d'avertissement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WarningDiff {
    pub added: Vec<ValidationWarning>,
    pub resolved: Vec<ValidationWarning>,
    /// Présents des deux côtés (version courante).
    pub unchanged: Vec<ValidationWarning>,
}

impl WarningDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.resolved.is_empty()
    }
}

pub fn diff_warnings(previous: &[ValidationWarning], current: &[ValidationWarning]) -> WarningDiff {
    let before: BTreeSet<&str> = previous.iter().map(|w| w.id.as_str()).collect();
    let after: BTreeSet<&str> = current.iter().map(|w| w.id.as_str()).collect();

    let (unchanged, added): (Vec<_>, Vec<_>) = current
        .iter()
        .cloned()
        .partition(|w| before.contains(w.id.as_str()));
    let resolved = previous
        .iter()
        .filter(|w| !after.contains(w.id.as_str()))
        .cloned()
        .collect();

    WarningDiff {
        added,
        resolved,
        unchanged,
    }
}
