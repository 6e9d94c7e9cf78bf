//! Crate-level test doubles, integration and BDD tests.

use std::sync::Mutex;

use mockall::mock;
use uuid::Uuid;

use crate::entity::Entity;
use crate::error::ServiceFault;
use crate::services::{ColumnSet, PersistenceService, QueryExpression, TraceSink};


mock! {
    pub Store {}
    impl PersistenceService for Store {
        fn create(&self, entity: &Entity) -> Result<Uuid, ServiceFault>;
        fn update(&self, entity: &Entity) -> Result<(), ServiceFault>;
        fn retrieve(
            &self,
            logical_name: &str,
            id: Uuid,
            columns: &ColumnSet,
        ) -> Result<Entity, ServiceFault>;
        fn query(&self, query: &QueryExpression) -> Result<Vec<Entity>, ServiceFault>;
    }
}

mock! {
    pub Sink {}
    impl TraceSink for Sink {
        fn write(&self, message: &str, correlation_id: Uuid, initiating_user: Uuid);
    }
}

/// Trace sink that keeps every line it receives.
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    lines: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub(crate) fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("sink lock").clone()
    }

    pub(crate) fn contains(&self, fragment: &str) -> bool {
        self.lines().iter().any(|line| line.contains(fragment))
    }
}

impl TraceSink for RecordingSink {
    fn write(&self, message: &str, _correlation_id: Uuid, _initiating_user: Uuid) {
        self.lines.lock().expect("sink lock").push(message.to_owned());
    }
}
