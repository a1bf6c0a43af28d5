use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use dayplan_core::preferences::Preferences;
use dayplan_core::tasks::Task;

use super::{Store, StoreError};

#[derive(Default)]
struct Tables {
    users: HashSet<String>,
    tasks: Vec<Task>,
    preferences: HashMap<String, Preferences>,
    plans: HashMap<(String, NaiveDate), serde_json::Value>,
}

/// In-memory `Store` with the same keying rules as the Postgres schema.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_plan_writes: AtomicBool,
}

impl MemoryStore {
    pub fn fail_plan_writes(&self) {
        self.fail_plan_writes.store(true, Ordering::SeqCst);
    }

    pub fn has_user(&self, user_id: &str) -> bool {
        self.tables.lock().unwrap().users.contains(user_id)
    }

    pub fn preference_rows(&self) -> usize {
        self.tables.lock().unwrap().preferences.len()
    }

    pub fn task_count(&self) -> usize {
        self.tables.lock().unwrap().tasks.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ensure_user(&self, user_id: &str) -> Result<(), StoreError> {
        self.tables.lock().unwrap().users.insert(user_id.to_string());
        Ok(())
    }

    async fn insert_task(&self, task: &Task) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().unwrap();
        if !tables.users.contains(&task.owner) {
            return Err(StoreError::Corrupt(format!("unknown user {}", task.owner)));
        }
        tables.tasks.push(task.clone());
        Ok(())
    }

    async fn list_tasks(&self, user_id: &str, date: NaiveDate) -> Result<Vec<Task>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .tasks
            .iter()
            .filter(|t| t.owner == user_id && t.date == date)
            .cloned()
            .collect())
    }

    async fn delete_task(&self, user_id: &str, task_id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.tasks.len();
        tables
            .tasks
            .retain(|t| !(t.id == task_id && t.owner == user_id));
        Ok(tables.tasks.len() < before)
    }

    async fn get_preferences(&self, user_id: &str) -> Result<Option<Preferences>, StoreError> {
        Ok(self.tables.lock().unwrap().preferences.get(user_id).cloned())
    }

    async fn upsert_preferences(
        &self,
        user_id: &str,
        preferences: &Preferences,
    ) -> Result<(), StoreError> {
        self.tables
            .lock()
            .unwrap()
            .preferences
            .insert(user_id.to_string(), preferences.clone());
        Ok(())
    }

    async fn get_plan(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<serde_json::Value>, StoreError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.plans.get(&(user_id.to_string(), date)).cloned())
    }

    async fn upsert_plan(
        &self,
        user_id: &str,
        date: NaiveDate,
        plan: &serde_json::Value,
    ) -> Result<(), StoreError> {
        if self.fail_plan_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Corrupt("plan writes disabled".to_string()));
        }
        self.tables
            .lock()
            .unwrap()
            .plans
            .insert((user_id.to_string(), date), plan.clone());
        Ok(())
    }
}
