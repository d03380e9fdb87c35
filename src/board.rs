//! The board controller: every user intent from the UI or CLI lands here,
//! mutates the repository, then rewrites the full snapshot to storage.

use chrono::{DateTime, Utc};

use crate::errors::BoardError;
use crate::filter::{self, ColumnView};
use crate::models::{Application, ApplicationDraft, Status};
use crate::repository::Repository;
use crate::storage::{KeyValueStore, Storage};

type Clock = Box<dyn Fn() -> DateTime<Utc>>;

pub struct Board<S> {
    repo: Repository,
    storage: Storage<S>,
    clock: Clock,
}

impl<S: KeyValueStore> Board<S> {
    pub fn new(store: S) -> Self {
        Self {
            repo: Repository::default(),
            storage: Storage::new(store),
            clock: Box::new(Utc::now),
        }
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Seeds the repository from storage. Call once at startup.
    pub fn load_initial(&mut self) -> usize {
        self.repo = Repository::new(self.storage.load());
        tracing::info!(count = self.repo.len(), "Loaded applications");
        self.repo.len()
    }

    #[cfg(test)]
    pub fn applications(&self) -> &[Application] {
        self.repo.all()
    }

    pub fn get(&self, id: &str) -> Option<&Application> {
        self.repo.get(id)
    }

    pub fn view(&self, search: &str) -> Vec<ColumnView<'_>> {
        filter::board_view(self.repo.all(), search)
    }

    pub fn storage(&self) -> &Storage<S> {
        &self.storage
    }

    #[cfg(test)]
    pub fn into_store(self) -> S {
        self.storage.into_store()
    }

    /// Blank form for adding to the given column, dated today.
    pub fn new_draft(&self, status: Status) -> ApplicationDraft {
        ApplicationDraft::for_column(status, (self.clock)().date_naive())
    }

    /// Form prefilled from an existing application.
    pub fn edit_draft(&self, id: &str) -> Option<ApplicationDraft> {
        self.repo.get(id).map(ApplicationDraft::from)
    }

    /// Saves a submitted form. With `editing_id` the matching application is
    /// replaced, keeping its id and creation time; otherwise a new one is
    /// appended. Returns the application's id.
    pub fn create_or_update(
        &mut self,
        draft: ApplicationDraft,
        editing_id: Option<&str>,
    ) -> Result<String, BoardError> {
        validate(&draft)?;
        let now = (self.clock)();

        let id = match editing_id {
            Some(id) => {
                match self.repo.get(id) {
                    Some(existing) => {
                        let created_at = existing.created_at;
                        let app = draft.into_application(id.to_string(), created_at, now);
                        self.repo.update(id, app);
                        tracing::debug!(id, "Updated application");
                    }
                    None => tracing::warn!(id, "Edited application no longer exists"),
                }
                id.to_string()
            }
            None => {
                let mut id = self.storage.new_identifier();
                while self.repo.get(&id).is_some() {
                    id = self.storage.new_identifier();
                }
                let app = draft.into_application(id.clone(), now, now);
                tracing::debug!(id = %id, company = %app.company, status = %app.status, "Added application");
                self.repo.add(app);
                id
            }
        };

        self.persist();
        Ok(id)
    }

    /// Removes an application. The caller has already confirmed with the user.
    pub fn delete_record(&mut self, id: &str) -> bool {
        let removed = self.repo.remove(id);
        if removed {
            tracing::debug!(id, "Deleted application");
        } else {
            tracing::warn!(id, "Delete of unknown application");
        }
        self.persist();
        removed
    }

    /// Moves an application to `status`, given as its column id.
    pub fn change_status(&mut self, id: &str, status: &str) -> Result<(), BoardError> {
        let status: Status = status.parse()?;
        let now = (self.clock)();
        if self.repo.set_status(id, status, now) {
            tracing::debug!(id, status = %status, "Changed status");
        } else {
            tracing::warn!(id, "Status change for unknown application");
        }
        self.persist();
        Ok(())
    }

    /// Drop of a card onto a column.
    pub fn handle_drop(&mut self, id: &str, destination_column: &str) -> Result<(), BoardError> {
        self.change_status(id, destination_column)
    }

    fn persist(&mut self) {
        self.storage.save(self.repo.all());
    }
}

fn validate(draft: &ApplicationDraft) -> Result<(), BoardError> {
    if draft.company.trim().is_empty() {
        return Err(BoardError::MissingField("company"));
    }
    if draft.position.trim().is_empty() {
        return Err(BoardError::MissingField("position"));
    }
    Ok(())
}
