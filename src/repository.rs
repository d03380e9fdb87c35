use chrono::{DateTime, Utc};

use crate::models::{Application, Status};

/// The session's applications in insertion order. Knows nothing about
/// storage; the board persists after every mutation.
#[derive(Debug, Default)]
pub struct Repository {
    applications: Vec<Application>,
}

impl Repository {
    pub fn new(applications: Vec<Application>) -> Self {
        Self { applications }
    }

    pub fn all(&self) -> &[Application] {
        &self.applications
    }

    pub fn get(&self, id: &str) -> Option<&Application> {
        self.applications.iter().find(|a| a.id == id)
    }

    pub fn len(&self) -> usize {
        self.applications.len()
    }

    pub fn add(&mut self, application: Application) {
        self.applications.push(application);
    }

    /// Replaces the application with `id` in place. Returns `false` when
    /// nothing matched.
    pub fn update(&mut self, id: &str, application: Application) -> bool {
        match self.applications.iter_mut().find(|a| a.id == id) {
            Some(slot) => {
                *slot = application;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.applications.len();
        self.applications.retain(|a| a.id != id);
        self.applications.len() != before
    }

    /// Sets the status and bumps `updated_at`, even if the status is unchanged.
    pub fn set_status(&mut self, id: &str, status: Status, now: DateTime<Utc>) -> bool {
        match self.applications.iter_mut().find(|a| a.id == id) {
            Some(app) => {
                app.status = status;
                app.updated_at = now;
                true
            }
            None => false,
        }
    }
}
