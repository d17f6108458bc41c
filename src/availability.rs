//! Index des disponibilités : normalise dates, compétences et préférences de chaque
//! personne en structures de recherche rapide, partagées par tous les composants.

use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

use crate::model::{ShiftRequirement, WorkerAvailability, WorkerId};

/// Fiche normalisée d'une personne.
#[derive(Debug, Clone)]
pub struct WorkerEntry {
    pub worker: WorkerAvailability,
    available: BTreeSet<NaiveDate>,
    unavailable: BTreeSet<NaiveDate>,
    skills: BTreeSet<String>,
    shift_types: BTreeSet<String>,
    departments: BTreeSet<String>,
}

impl WorkerEntry {
    pub(crate) fn new(worker: WorkerAvailability) -> Self {
        Self {
            available: worker.available_dates.iter().copied().collect(),
            unavailable: worker.unavailable_dates.iter().copied().collect(),
            skills: normalize_all(&worker.skills),
            shift_types: normalize_all(&worker.preferred_shift_types),
            departments: normalize_all(&worker.preferred_departments),
            worker,
        }
    }

    pub fn id(&self) -> &WorkerId {
        &self.worker.id
    }

    /// Disponible si la date n'est pas exclue et, quand une liste explicite existe,
    /// si elle y figure.
    pub fn is_available(&self, date: NaiveDate) -> bool {
        if self.unavailable.contains(&date) {
            return false;
        }
        self.available.is_empty() || self.available.contains(&date)
    }

    pub fn has_role(&self, role: Option<&str>) -> bool {
        role.map_or(true, |r| r.trim().eq_ignore_ascii_case(self.worker.role.trim()))
    }

    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.contains(&normalize(skill))
    }

    /// Compétences requises absentes, dans l'ordre du créneau.
    pub fn missing_skills<'a>(&self, required: &'a [String]) -> Vec<&'a str> {
        required
            .iter()
            .filter(|s| !self.has_skill(s))
            .map(String::as_str)
            .collect()
    }

    /// Pourcentage de compétences requises détenues ; 100 si rien n'est requis.
    pub fn skill_match(&self, required: &[String]) -> f64 {
        let wanted = normalize_all(required);
        if wanted.is_empty() {
            return 100.0;
        }
        let held = wanted.intersection(&self.skills).count();
        held as f64 / wanted.len() as f64 * 100.0
    }

    /// `None` quand la personne n'a exprimé aucune préférence.
    pub fn prefers_shift_type(&self, shift_type: &str) -> Option<bool> {
        if self.shift_types.is_empty() {
            return None;
        }
        Some(self.shift_types.contains(&normalize(shift_type)))
    }

    pub fn prefers_department(&self, department: &str) -> Option<bool> {
        if self.departments.is_empty() {
            return None;
        }
        Some(self.departments.contains(&normalize(department)))
    }
}

/// Index en lecture seule, construit une fois par demande.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityIndex {
    entries: Vec<WorkerEntry>,
    by_id: HashMap<WorkerId, usize>,
}

impl AvailabilityIndex {
    pub fn build(workers: &[WorkerAvailability]) -> Self {
        let mut index = Self::default();
        for worker in workers {
            // premier arrivé conservé ; les doublons sont rejetés plus haut
            if index.by_id.contains_key(&worker.id) {
                continue;
            }
            index.by_id.insert(worker.id.clone(), index.entries.len());
            index.entries.push(WorkerEntry::new(worker.clone()));
        }
        index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &WorkerId) -> Option<&WorkerEntry> {
        self.by_id.get(id).map(|&i| &self.entries[i])
    }

    pub fn entries(&self) -> &[WorkerEntry] {
        &self.entries
    }

    /// Personnes couvrant la date et le rôle du créneau, dans l'ordre d'entrée.
    pub fn candidates_for(
        &self,
        shift: &ShiftRequirement,
    ) -> impl Iterator<Item = &WorkerEntry> + '_ {
        let date = shift.date;
        let role = shift.required_role.clone();
        self.entries
            .iter()
            .filter(move |e| e.is_available(date) && e.has_role(role.as_deref()))
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

fn normalize_all(items: &[String]) -> BTreeSet<String> {
    items
        .iter()
        .map(|s| normalize(s))
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, d).unwrap()
    }

    #[test]
    fn explicit_dates_restrict_availability() {
        let mut w = WorkerAvailability::new("w1", "nurse");
        w.available_dates = vec![day(1), day(2)];
        w.unavailable_dates = vec![day(2)];
        let index = AvailabilityIndex::build(&[w]);
        let entry = index.get(&WorkerId::new("w1")).unwrap();
        assert!(entry.is_available(day(1)));
        assert!(!entry.is_available(day(2)));
        assert!(!entry.is_available(day(3)));
    }

    #[test]
    fn skills_are_case_insensitive() {
        let w = WorkerAvailability::new("w1", "Picker").with_skills([" Forklift ", "hazmat"]);
        let index = AvailabilityIndex::build(&[w]);
        let entry = index.get(&WorkerId::new("w1")).unwrap();
        assert!(entry.has_skill("FORKLIFT"));
        assert!(entry.has_role(Some("picker")));
        let required = vec!["forklift".to_string(), "crane".to_string()];
        assert_eq!(entry.skill_match(&required), 50.0);
        assert_eq!(entry.missing_skills(&required), vec!["crane"]);
    }
}
