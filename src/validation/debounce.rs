use std::time::{Duration, Instant};

/// Anti-rebond à front descendant uniquement, piloté par l'horloge de l'appelant.
///
/// Chaque `trigger` repousse l'échéance ; seule la dernière demande en attente est
/// exécutée, les précédentes sont abandonnées (jamais mises en file).
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
    generation: u64,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
            generation: 0,
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn trigger(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
        self.generation += 1;
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Renvoie le numéro de la demande à exécuter si l'échéance est atteinte.
    pub fn poll(&mut self, now: Instant) -> Option<u64> {
        match self.deadline {
            Some(due) if now >= due => {
                self.deadline = None;
                Some(self.generation)
            }
            _ => None,
        }
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::from_millis(300)
    }
}
